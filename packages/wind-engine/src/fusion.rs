//! fusion.rs — Cross-boat wind fusion and the fleet drift model
//!
//! Combines per-boat wind estimates at a time point into one fleet-level
//! estimate, weighted by estimate confidence × boat reliability. With three
//! or more boats the full path runs: a configurable direction prior blended
//! against the observed weighted mean, and a robust speed average that
//! down-weights boats far from the fleet median so one noisy boat cannot
//! drag the estimate. Below three boats only plain weighted averaging runs.
//!
//! The engine owns the only long-lived mutable state in the core: bounded
//! per-boat and fleet histories, and the drift model refitted after every
//! fusion. Callers observe a single-writer discipline — one `fuse` call
//! completes before the next reads the updated history.

use std::collections::{HashMap, VecDeque};

use tracing::debug;
use wind_types::{FusionResult, WindEstimate};

use crate::angles::{angle_difference, circular_mean, circular_std, normalize_deg};
use crate::config::FusionConfig;
use crate::estimators::median;
use crate::reliability::{BoatProfile, BoatReliabilityScorer};

// ── Drift model ───────────────────────────────────────────────────────────────

/// Rolling time-change model for the wind: how fast direction and speed are
/// moving, with the spread of the fitted rates as an uncertainty term.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftModel {
    pub direction_rate_deg_per_min: f64,
    pub speed_rate_kts_per_min: f64,
    pub direction_rate_std: f64,
    pub speed_rate_std: f64,
}

impl DriftModel {
    /// Median per-interval rates over recent fleet history; median rather
    /// than mean so one bad fusion interval cannot swing the model.
    fn fit(history: &[&FusionResult]) -> Self {
        if history.len() < 2 {
            return Self::default();
        }
        let mut dir_rates = Vec::with_capacity(history.len() - 1);
        let mut speed_rates = Vec::with_capacity(history.len() - 1);
        for pair in history.windows(2) {
            let dt_min = (pair[1].t - pair[0].t) / 60.0;
            if dt_min <= 0.0 {
                continue;
            }
            dir_rates.push(
                angle_difference(pair[1].wind_direction_deg, pair[0].wind_direction_deg) / dt_min,
            );
            speed_rates.push((pair[1].wind_speed_kts - pair[0].wind_speed_kts) / dt_min);
        }
        if dir_rates.is_empty() {
            return Self::default();
        }
        let std = |v: &[f64]| {
            let m = v.iter().sum::<f64>() / v.len() as f64;
            (v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / v.len() as f64).sqrt()
        };
        Self {
            direction_rate_deg_per_min: median(&dir_rates),
            speed_rate_kts_per_min: median(&speed_rates),
            direction_rate_std: std(&dir_rates),
            speed_rate_std: std(&speed_rates),
        }
    }
}

// ── Observations ──────────────────────────────────────────────────────────────

/// One boat's contribution to a fusion call.
#[derive(Debug, Clone, Copy)]
pub struct BoatObservation {
    pub boat_id: u32,
    pub estimate: WindEstimate,
    /// Boat position at estimate time, if known (feeds the wind field)
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

// ── Fusion engine ─────────────────────────────────────────────────────────────

pub struct MultiBoatFusionEngine {
    cfg: FusionConfig,
    scorer: BoatReliabilityScorer,
    profiles: HashMap<u32, BoatProfile>,
    /// Per-boat estimate history, oldest first, bounded
    boat_history: HashMap<u32, VecDeque<WindEstimate>>,
    /// Fleet-level fusion history, oldest first, bounded
    fleet_history: VecDeque<FusionResult>,
    drift: DriftModel,
}

impl MultiBoatFusionEngine {
    pub fn new(cfg: FusionConfig, scorer: BoatReliabilityScorer) -> Self {
        Self {
            cfg,
            scorer,
            profiles: HashMap::new(),
            boat_history: HashMap::new(),
            fleet_history: VecDeque::new(),
            drift: DriftModel::default(),
        }
    }

    /// Register (or replace) a boat's static profile. Unregistered boats get
    /// `BoatProfile::default()`.
    pub fn set_profile(&mut self, boat_id: u32, profile: BoatProfile) {
        self.profiles.insert(boat_id, profile);
    }

    pub fn drift_model(&self) -> &DriftModel {
        &self.drift
    }

    pub fn fleet_history(&self) -> &VecDeque<FusionResult> {
        &self.fleet_history
    }

    pub fn boat_history(&self, boat_id: u32) -> Option<&VecDeque<WindEstimate>> {
        self.boat_history.get(&boat_id)
    }

    /// Fuse per-boat estimates at `t`. Returns `None` when no boat has an
    /// estimate within the time window; otherwise appends the result to the
    /// fleet history and refits the drift model.
    pub fn fuse(&mut self, observations: &[BoatObservation], t: f64) -> Option<FusionResult> {
        // Contributing boats: estimate close enough in time, weighted by
        // confidence × reliability computed against history BEFORE this call
        let mut contributors: Vec<(&BoatObservation, f64)> = Vec::new();
        for obs in observations {
            if (obs.estimate.t - t).abs() > self.cfg.time_window_s {
                continue;
            }
            let profile = self
                .profiles
                .get(&obs.boat_id)
                .copied()
                .unwrap_or_else(|| self.scorer.default_profile());
            let history = self
                .boat_history
                .get(&obs.boat_id)
                .map(|h| h.iter().copied().collect::<Vec<_>>())
                .unwrap_or_default();
            let reliability = self.scorer.reliability(&profile, &history, &self.drift);
            contributors.push((obs, obs.estimate.confidence * reliability));
        }
        if contributors.is_empty() {
            debug!(t, "no boat within fusion time window");
            return None;
        }

        let directions: Vec<f64> =
            contributors.iter().map(|(o, _)| o.estimate.direction_deg).collect();
        let speeds: Vec<f64> = contributors.iter().map(|(o, _)| o.estimate.speed_kts).collect();
        let weights: Vec<f64> = contributors.iter().map(|(_, w)| *w).collect();
        let boat_count = contributors.len();

        let (wind_direction_deg, wind_speed_kts) =
            if boat_count >= self.cfg.min_boats_for_bayesian {
                // Full path: prior blend + robust speed averaging
                let observed = circular_mean(&directions, &weights);
                let prior = directions[0]; // first boat's estimate by default
                let direction = circular_mean(
                    &[observed, prior],
                    &[1.0 - self.cfg.prior_weight, self.cfg.prior_weight],
                );
                (normalize_deg(direction), self.robust_speed(&speeds, &weights))
            } else {
                // Plain weighted averaging below the Bayesian threshold
                let direction = circular_mean(&directions, &weights);
                let total: f64 = weights.iter().sum();
                let speed = if total > 0.0 {
                    speeds.iter().zip(&weights).map(|(s, w)| s * w).sum::<f64>() / total
                } else {
                    speeds.iter().sum::<f64>() / speeds.len() as f64
                };
                (direction, speed)
            };

        let confidence = Self::combined_confidence(&contributors);
        let direction_std_deg = circular_std(&directions, &weights);
        let speed_std_kts = Self::weighted_std(&speeds, &weights, wind_speed_kts);
        let (lat, lon) = Self::weighted_position(&contributors);

        let result = FusionResult {
            t,
            wind_direction_deg,
            wind_speed_kts,
            confidence,
            direction_std_deg,
            speed_std_kts,
            lat,
            lon,
            boat_count,
        };

        // Single-writer update: record contributions, append, refit drift
        for (obs, _) in &contributors {
            let h = self.boat_history.entry(obs.boat_id).or_default();
            h.push_back(obs.estimate);
            while h.len() > self.cfg.history_retention {
                h.pop_front();
            }
        }
        self.fleet_history.push_back(result);
        while self.fleet_history.len() > self.cfg.history_retention {
            self.fleet_history.pop_front();
        }
        let window: Vec<&FusionResult> = self
            .fleet_history
            .iter()
            .rev()
            .take(self.cfg.drift_fit_window)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        self.drift = DriftModel::fit(&window);

        Some(result)
    }

    /// Weighted average that multiplies each weight by
    /// `1 − |deviation from median| / max_deviation`, floored, so outlying
    /// boats lose influence without being discarded.
    fn robust_speed(&self, speeds: &[f64], weights: &[f64]) -> f64 {
        let med = median(speeds);
        let deviations: Vec<f64> = speeds.iter().map(|s| (s - med).abs()).collect();
        let max_dev = deviations.iter().cloned().fold(0.0, f64::max);
        if max_dev <= 0.0 {
            return med;
        }
        let mut num = 0.0;
        let mut den = 0.0;
        for ((s, w), dev) in speeds.iter().zip(weights).zip(&deviations) {
            let rw = w * (1.0 - dev / max_dev).max(self.cfg.robust_weight_floor);
            num += s * rw;
            den += rw;
        }
        if den > 0.0 {
            num / den
        } else {
            med
        }
    }

    /// Agreement-style confidence: best weighted contribution raised by
    /// fleet size, with diminishing returns, never past 0.95.
    fn combined_confidence(contributors: &[(&BoatObservation, f64)]) -> f64 {
        let max_conf = contributors
            .iter()
            .map(|(o, _)| o.estimate.confidence)
            .fold(0.0, f64::max);
        let bonus = (0.1 * contributors.len() as f64).min(0.3);
        ((max_conf + (1.0 - max_conf) * bonus).min(0.95)).clamp(0.0, 0.95)
    }

    fn weighted_std(values: &[f64], weights: &[f64], mean: f64) -> f64 {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || values.len() < 2 {
            return 0.0;
        }
        (values
            .iter()
            .zip(weights)
            .map(|(v, w)| w * (v - mean).powi(2))
            .sum::<f64>()
            / total)
            .sqrt()
    }

    fn weighted_position(
        contributors: &[(&BoatObservation, f64)],
    ) -> (Option<f64>, Option<f64>) {
        let mut lat_sum = 0.0;
        let mut lon_sum = 0.0;
        let mut w_sum = 0.0;
        for (obs, w) in contributors {
            if let (Some(lat), Some(lon)) = (obs.lat, obs.lon) {
                // Floor so a zero-weight boat still anchors the position
                let w = w.max(1e-6);
                lat_sum += lat * w;
                lon_sum += lon * w;
                w_sum += w;
            }
        }
        if w_sum > 0.0 {
            (Some(lat_sum / w_sum), Some(lon_sum / w_sum))
        } else {
            (None, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReliabilityConfig;
    use wind_types::EstimateMethod;

    fn engine() -> MultiBoatFusionEngine {
        MultiBoatFusionEngine::new(
            FusionConfig::default(),
            BoatReliabilityScorer::new(ReliabilityConfig::default()),
        )
    }

    fn obs(id: u32, dir: f64, speed: f64, t: f64) -> BoatObservation {
        BoatObservation {
            boat_id: id,
            estimate: WindEstimate {
                direction_deg: dir,
                speed_kts: speed,
                confidence: 0.6,
                method: EstimateMethod::Bayesian,
                t,
            },
            lat: Some(60.0 + id as f64 * 0.001),
            lon: Some(25.0),
        }
    }

    #[test]
    fn three_boats_fuse_near_midpoint() {
        let mut eng = engine();
        let r = eng
            .fuse(&[obs(1, 40.0, 10.0, 0.0), obs(2, 45.0, 10.0, 0.0), obs(3, 50.0, 10.0, 0.0)], 0.0)
            .expect("fusion result");
        assert_eq!(r.boat_count, 3);
        assert!(
            angle_difference(r.wind_direction_deg, 45.0).abs() <= 2.0,
            "fused {} not within ±2° of 45",
            r.wind_direction_deg
        );
        assert!(r.confidence > 0.6 && r.confidence <= 0.95);
        assert!(r.direction_std_deg > 0.0);
    }

    #[test]
    fn stale_estimates_are_excluded() {
        let mut eng = engine();
        // Boat 2's estimate is 10 minutes old
        let r = eng
            .fuse(&[obs(1, 90.0, 10.0, 600.0), obs(2, 270.0, 10.0, 0.0)], 600.0)
            .expect("fusion result");
        assert_eq!(r.boat_count, 1);
        assert!(angle_difference(r.wind_direction_deg, 90.0).abs() < 1e-6);
    }

    #[test]
    fn no_contributors_yields_none() {
        let mut eng = engine();
        assert!(eng.fuse(&[obs(1, 90.0, 10.0, 0.0)], 10_000.0).is_none());
    }

    #[test]
    fn robust_average_resists_outlier_speed() {
        let mut eng = engine();
        let r = eng
            .fuse(
                &[
                    obs(1, 45.0, 10.0, 0.0),
                    obs(2, 45.0, 10.5, 0.0),
                    obs(3, 45.0, 9.5, 0.0),
                    obs(4, 45.0, 30.0, 0.0), // one wildly noisy boat
                ],
                0.0,
            )
            .expect("fusion result");
        assert!(r.wind_speed_kts < 14.0, "outlier skewed speed to {}", r.wind_speed_kts);
    }

    #[test]
    fn history_is_bounded() {
        let mut eng = engine();
        for i in 0..250 {
            let t = i as f64 * 30.0;
            eng.fuse(&[obs(1, 45.0, 10.0, t), obs(2, 46.0, 10.0, t), obs(3, 44.0, 10.0, t)], t);
        }
        assert_eq!(eng.fleet_history().len(), FusionConfig::default().history_retention);
        assert_eq!(
            eng.boat_history(1).unwrap().len(),
            FusionConfig::default().history_retention
        );
    }

    #[test]
    fn drift_model_tracks_a_steady_veer() {
        let mut eng = engine();
        // Wind veering 2°/min across fusion calls a minute apart
        for i in 0..12 {
            let t = i as f64 * 60.0;
            let dir = normalize_deg(100.0 + 2.0 * i as f64);
            eng.fuse(
                &[obs(1, dir, 10.0, t), obs(2, dir, 10.0, t), obs(3, dir, 10.0, t)],
                t,
            );
        }
        let drift = eng.drift_model();
        assert!(
            (drift.direction_rate_deg_per_min - 2.0).abs() < 0.5,
            "rate {} not ~2°/min",
            drift.direction_rate_deg_per_min
        );
    }

    #[test]
    fn fused_position_is_weighted_mean() {
        let mut eng = engine();
        let r = eng
            .fuse(&[obs(1, 45.0, 10.0, 0.0), obs(3, 45.0, 10.0, 0.0)], 0.0)
            .unwrap();
        let lat = r.lat.expect("position");
        assert!(lat > 60.0009 && lat < 60.0031, "got {lat}");
    }
}
