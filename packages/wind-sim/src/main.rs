//! main.rs — SailWind batch simulation driver
//!
//! Generates a synthetic fleet sailing a windward-leeward course under a
//! known true wind, runs the full estimation pipeline over it, and writes
//! JSON-lines records (per-boat estimates, maneuver events, fleet fusions,
//! optional wind-field grid) to stdout or a file. Because the wind is known,
//! the run ends with a ground-truth error report — the main development tool
//! for tuning the estimators.

mod scenarios;
mod track_gen;

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use wind_engine::angles::angle_difference;
use wind_engine::{
    BoatObservation, BoatProfile, BoatReliabilityScorer, EstimatorConfig, FieldConfig,
    FusionConfig, ManeuverDetector, MultiBoatFusionEngine, ReliabilityConfig,
    SingleBoatWindEstimator, SpatiotemporalFieldEstimator,
};
use wind_types::{EstimateMethod, TrackPoint};

use scenarios::ScenarioConfig;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "wind-sim", about = "SailWind synthetic fleet simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Scenario preset: steady_beat, downwind_run, shifting_breeze,
    /// light_air, mixed_fleet
    #[arg(short, long, default_value = "steady_beat")]
    scenario: String,
    /// RNG seed override (config [run].seed otherwise)
    #[arg(long)]
    seed: Option<u64>,
    /// Output file ("-" or absent = stdout)
    #[arg(short, long)]
    output: Option<String>,
    /// Emit the interpolated wind-field grid at the end of the run
    #[arg(long)]
    field: bool,
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct FullConfig {
    run: RunConfig,
    estimator: EstimatorConfig,
    reliability: ReliabilityConfig,
    fusion: FusionConfig,
    field: FieldConfig,
}

#[derive(Debug, serde::Deserialize)]
#[serde(default)]
struct RunConfig {
    seed: u64,
    /// Seconds between fleet fusion points
    fusion_interval_s: f64,
    /// Track seconds fed to each per-boat estimate at a fusion point
    estimate_window_s: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { seed: 1, fusion_interval_s: 120.0, estimate_window_s: 300.0 }
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wind_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let cfg: FullConfig = toml::from_str(&config_str)
        .with_context(|| format!("invalid config file {}", args.config))?;

    let scenario = scenarios::preset(&args.scenario);
    let seed = args.seed.unwrap_or(cfg.run.seed);

    info!(
        "⛵ wind-sim '{}' — {} boats, wind {:.0}° @ {:.1} kts, {:.0} min",
        scenario.name,
        scenario.n_boats,
        scenario.wind_direction_deg,
        scenario.wind_speed_kts,
        scenario.duration_s / 60.0
    );

    let mut out: Box<dyn Write> = match args.output.as_deref() {
        None | Some("-") => Box::new(BufWriter::new(std::io::stdout())),
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create {path}"))?,
        )),
    };

    run(&cfg, &scenario, seed, args.field, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run(
    cfg: &FullConfig,
    scenario: &ScenarioConfig,
    seed: u64,
    emit_field: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let started = chrono::Utc::now();
    let t0 = started.timestamp() as f64;
    writeln!(
        out,
        "{}",
        serde_json::json!({
            "type": "run",
            "scenario": scenario.name,
            "started": started.to_rfc3339(),
            "seed": seed,
            "n_boats": scenario.n_boats,
        })
    )?;

    // Generate the fleet
    let tracks: Vec<Vec<TrackPoint>> = (0..scenario.n_boats)
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            track_gen::generate_track(&scenario.track_cfg(i), t0, &mut rng)
        })
        .collect();

    // One fusion engine for the whole run; boats registered up front
    let mut fusion = MultiBoatFusionEngine::new(
        cfg.fusion.clone(),
        BoatReliabilityScorer::new(cfg.reliability.clone()),
    );
    for i in 0..scenario.n_boats {
        let spec = scenario.boat_spec(i);
        fusion.set_profile(
            i as u32,
            BoatProfile { boat_type: spec.boat_type, skill_level: spec.skill_level },
        );
    }

    // Maneuver events over each full track, judged against the true wind
    let detector = ManeuverDetector::new(cfg.estimator.clone());
    for (i, track) in tracks.iter().enumerate() {
        let events = detector.detect(track, scenario.wind_direction_deg);
        let total = events.len();
        let (kept, _) = detector.filter_by_duration(events);
        info!("boat {i}: {total} maneuvers ({} plausible)", kept.len());
        for ev in &kept {
            writeln!(
                out,
                "{}",
                serde_json::json!({ "type": "maneuver", "boat": i, "event": ev })
            )?;
        }
    }

    // Streaming estimation: at each fusion point every boat estimates over
    // its recent window, then the fleet fuses
    let mut t = t0 + cfg.run.fusion_interval_s;
    let t_end = t0 + scenario.duration_s;
    let mut last_fusion = None;
    while t <= t_end {
        let mut observations = Vec::with_capacity(scenario.n_boats);
        for (i, track) in tracks.iter().enumerate() {
            let window: Vec<TrackPoint> = track
                .iter()
                .filter(|p| p.t > t - cfg.run.estimate_window_s && p.t <= t)
                .copied()
                .collect();
            if window.is_empty() {
                continue;
            }

            let mut est_cfg = cfg.estimator.clone();
            est_cfg.boat_type = scenario.boat_spec(i).boat_type;
            let estimate = SingleBoatWindEstimator::new(est_cfg).estimate(&window)?;
            writeln!(
                out,
                "{}",
                serde_json::json!({ "type": "estimate", "boat": i, "estimate": estimate })
            )?;
            if estimate.method == EstimateMethod::InsufficientData {
                continue; // logged, but carries no weight worth fusing
            }

            let last = window[window.len() - 1];
            observations.push(BoatObservation {
                boat_id: i as u32,
                estimate,
                lat: Some(last.lat),
                lon: Some(last.lon),
            });
        }

        if let Some(fused) = fusion.fuse(&observations, t) {
            writeln!(out, "{}", serde_json::json!({ "type": "fusion", "result": fused }))?;
            last_fusion = Some(fused);
        }
        t += cfg.run.fusion_interval_s;
    }

    if emit_field {
        let history: Vec<_> = fusion.fleet_history().iter().copied().collect();
        let field = SpatiotemporalFieldEstimator::new(cfg.field.clone());
        if let Some(grid) = field.field_at(&history, fusion.drift_model(), t_end) {
            writeln!(out, "{}", serde_json::json!({ "type": "field", "grid": grid }))?;
        }
    }

    // Ground-truth report
    if let Some(fused) = last_fusion {
        let true_dir_end = (scenario.wind_direction_deg
            + scenario.wind_veer_deg_per_min * scenario.duration_s / 60.0)
            .rem_euclid(360.0);
        let dir_err = angle_difference(fused.wind_direction_deg, true_dir_end).abs();
        let speed_err = (fused.wind_speed_kts - scenario.wind_speed_kts).abs();
        info!(
            "🏁 final fusion: {:.1}° @ {:.1} kts (truth {:.1}° @ {:.1} kts) — err {:.1}° / {:.1} kts, conf {:.2}",
            fused.wind_direction_deg,
            fused.wind_speed_kts,
            true_dir_end,
            scenario.wind_speed_kts,
            dir_err,
            speed_err,
            fused.confidence
        );
    } else {
        info!("🏁 run produced no fleet fusion (light air?)");
    }
    Ok(())
}
