//! track_gen.rs — Synthetic sailing track physics
//!
//! Generates GPS tracks of boats racing a windward-leeward course under a
//! known true wind, so the estimation pipeline can be scored against ground
//! truth. Each boat:
//! - beats upwind at its optimal pointing angle, tacking on a jittered
//!   interval, then runs downwind jibing between broad-reach angles
//! - turns at a bounded rate, so maneuvers take realistic time
//! - follows a coarse polar curve (speed as a fraction of TWS by wind angle)
//!   with a first-order speed lag, so tacks show the characteristic dip
//! - carries Gaussian course and speed noise on top

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use wind_types::{TrackPoint, MPS_TO_KNOTS};

/// Degrees of latitude per meter (WGS-84 sphere approximation)
const DEG_PER_METER_LAT: f64 = 1.0 / 111_195.0;
/// Boat turn rate through maneuvers, degrees per second
const TURN_RATE_DEG_S: f64 = 12.0;
/// First-order speed lag constant, 1/s
const SPEED_LAG: f64 = 0.4;

// ── Generator config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TrackGenConfig {
    /// True wind direction (blowing FROM), degrees
    pub wind_direction_deg: f64,
    /// True wind speed, knots
    pub wind_speed_kts: f64,
    /// Wind veer rate, degrees per minute (positive = clockwise)
    pub wind_veer_deg_per_min: f64,
    pub duration_s: f64,
    pub sample_interval_s: f64,
    /// Nominal seconds between tacks/jibes (jittered ±20% per maneuver)
    pub maneuver_interval_s: f64,
    /// Std of per-sample Gaussian course noise, degrees
    pub course_noise_deg: f64,
    /// Std of per-sample speed noise as a fraction of polar speed
    pub speed_noise_frac: f64,
    /// Leg length before turning the (virtual) mark, seconds sailed
    pub leg_duration_s: f64,
    pub start_lat: f64,
    pub start_lon: f64,
    /// Optimal true wind angles for the simulated hull, degrees
    pub upwind_twa_deg: f64,
    pub downwind_twa_deg: f64,
}

impl Default for TrackGenConfig {
    fn default() -> Self {
        Self {
            wind_direction_deg: 0.0,
            wind_speed_kts: 12.0,
            wind_veer_deg_per_min: 0.0,
            duration_s: 1200.0,
            sample_interval_s: 1.0,
            maneuver_interval_s: 90.0,
            course_noise_deg: 2.0,
            speed_noise_frac: 0.05,
            leg_duration_s: 300.0,
            start_lat: 60.10,
            start_lon: 24.95,
            upwind_twa_deg: 42.0,
            downwind_twa_deg: 150.0,
        }
    }
}

// ── Polar model ───────────────────────────────────────────────────────────────

/// Boat speed as a fraction of true wind speed by absolute true wind angle.
/// Coarse piecewise-linear polar: dead in irons, ~0.70 on the beat, peak on
/// a beam reach, easing to ~0.65 dead downwind.
pub fn polar_speed_fraction(twa_abs_deg: f64) -> f64 {
    let twa = twa_abs_deg.clamp(0.0, 180.0);
    let knots = [
        (0.0, 0.05),
        (30.0, 0.40),
        (45.0, 0.70),
        (90.0, 0.85),
        (120.0, 0.80),
        (150.0, 0.70),
        (180.0, 0.62),
    ];
    for pair in knots.windows(2) {
        let ((a, fa), (b, fb)) = (pair[0], pair[1]);
        if twa <= b {
            return fa + (fb - fa) * (twa - a) / (b - a);
        }
    }
    0.62
}

// ── Track generation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Leg {
    Beat,
    Run,
}

/// Generate one boat's track. `t0` is the Unix-seconds start time; boats in a
/// fleet share `t0` but get distinct RNGs.
pub fn generate_track(cfg: &TrackGenConfig, t0: f64, rng: &mut StdRng) -> Vec<TrackPoint> {
    let n = (cfg.duration_s / cfg.sample_interval_s) as usize;
    let mut points = Vec::with_capacity(n);

    let course_noise = Normal::new(0.0, cfg.course_noise_deg.max(1e-9)).unwrap();
    let dt = cfg.sample_interval_s;

    let mut leg = Leg::Beat;
    let mut leg_elapsed = 0.0;
    // Start on starboard tack (wind over the port bow)
    let mut board: f64 = 1.0;
    let mut next_maneuver = jittered(cfg.maneuver_interval_s, rng);
    let mut since_maneuver = 0.0;

    let mut lat = cfg.start_lat + rng.gen_range(-0.002..0.002);
    let mut lon = cfg.start_lon + rng.gen_range(-0.002..0.002);
    let mut course = target_course(cfg, leg, board, 0.0);
    let mut speed_mps =
        polar_speed_fraction(cfg.upwind_twa_deg) * cfg.wind_speed_kts / MPS_TO_KNOTS;

    for i in 0..n {
        let t_rel = i as f64 * dt;
        let wind_now =
            cfg.wind_direction_deg + cfg.wind_veer_deg_per_min * t_rel / 60.0;

        // Leg changes (rounding the virtual mark) and scheduled maneuvers
        leg_elapsed += dt;
        since_maneuver += dt;
        if leg_elapsed >= cfg.leg_duration_s {
            leg = match leg {
                Leg::Beat => Leg::Run,
                Leg::Run => Leg::Beat,
            };
            leg_elapsed = 0.0;
            since_maneuver = 0.0;
            next_maneuver = jittered(cfg.maneuver_interval_s, rng);
        } else if since_maneuver >= next_maneuver {
            board = -board;
            since_maneuver = 0.0;
            next_maneuver = jittered(cfg.maneuver_interval_s, rng);
        }

        // Steer toward the current target at a bounded turn rate
        let target = target_course(cfg, leg, board, wind_now);
        let err = shortest_turn(target - course);
        let step = err.clamp(-TURN_RATE_DEG_S * dt, TURN_RATE_DEG_S * dt);
        course = normalize(course + step);

        // Polar speed at the actual wind angle, first-order lag toward it
        let twa = shortest_turn(course - wind_now).abs();
        let polar_mps = polar_speed_fraction(twa) * cfg.wind_speed_kts / MPS_TO_KNOTS;
        speed_mps += (polar_mps - speed_mps) * (SPEED_LAG * dt).min(1.0);

        let noisy_course = normalize(course + course_noise.sample(rng));
        let noisy_speed =
            (speed_mps * (1.0 + cfg.speed_noise_frac * rng.gen_range(-1.0..1.0))).max(0.0);

        points.push(TrackPoint {
            t: t0 + t_rel,
            lat,
            lon,
            speed_mps: noisy_speed,
            course_deg: noisy_course,
        });

        // Integrate position (equirectangular step is fine at this scale)
        let rad = course.to_radians();
        lat += speed_mps * rad.cos() * dt * DEG_PER_METER_LAT;
        lon += speed_mps * rad.sin() * dt * DEG_PER_METER_LAT / lat.to_radians().cos();
    }
    points
}

fn target_course(cfg: &TrackGenConfig, leg: Leg, board: f64, wind_deg: f64) -> f64 {
    let twa = match leg {
        Leg::Beat => cfg.upwind_twa_deg,
        Leg::Run => cfg.downwind_twa_deg,
    };
    normalize(wind_deg + board * twa)
}

fn jittered(nominal: f64, rng: &mut StdRng) -> f64 {
    nominal * rng.gen_range(0.8..1.2)
}

fn normalize(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn shortest_turn(delta_deg: f64) -> f64 {
    let d = (delta_deg + 180.0).rem_euclid(360.0) - 180.0;
    if d == -180.0 {
        180.0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn polar_curve_shape() {
        assert!(polar_speed_fraction(0.0) < 0.1);
        assert!((polar_speed_fraction(45.0) - 0.70).abs() < 1e-9);
        assert!(polar_speed_fraction(90.0) > polar_speed_fraction(45.0));
        assert!(polar_speed_fraction(180.0) < polar_speed_fraction(90.0));
    }

    #[test]
    fn track_is_time_ordered_and_finite() {
        let cfg = TrackGenConfig { duration_s: 600.0, ..TrackGenConfig::default() };
        let mut rng = StdRng::seed_from_u64(7);
        let track = generate_track(&cfg, 1_700_000_000.0, &mut rng);
        assert_eq!(track.len(), 600);
        for pair in track.windows(2) {
            assert!(pair[1].t > pair[0].t);
        }
        for p in &track {
            assert!(p.lat.is_finite() && p.lon.is_finite());
            assert!(p.speed_mps.is_finite() && p.speed_mps >= 0.0);
            assert!((0.0..360.0).contains(&p.course_deg));
        }
    }

    #[test]
    fn beat_legs_straddle_the_wind() {
        // No noise: courses on the beat should sit near wind ± upwind TWA
        let cfg = TrackGenConfig {
            wind_direction_deg: 90.0,
            course_noise_deg: 0.0,
            speed_noise_frac: 0.0,
            duration_s: 300.0,
            leg_duration_s: 1e9, // stay on the beat
            ..TrackGenConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let track = generate_track(&cfg, 0.0, &mut rng);
        let mut port = 0;
        let mut starboard = 0;
        for p in &track {
            let twa = shortest_turn(p.course_deg - 90.0);
            if (twa - 42.0).abs() < 3.0 {
                starboard += 1;
            } else if (twa + 42.0).abs() < 3.0 {
                port += 1;
            }
        }
        assert!(starboard > 30 && port > 30, "st={starboard} port={port}");
    }

    #[test]
    fn deterministic_for_a_fixed_seed() {
        let cfg = TrackGenConfig { duration_s: 120.0, ..TrackGenConfig::default() };
        let a = generate_track(&cfg, 0.0, &mut StdRng::seed_from_u64(42));
        let b = generate_track(&cfg, 0.0, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
