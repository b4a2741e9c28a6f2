//! vmg.rs — Wind from VMG grid search
//!
//! For the true wind direction, velocity made good toward the wind (and away
//! from it) is maximized: upwind legs project strongly onto the wind axis
//! and downwind legs onto its reverse. A coarse 45° scan finds the
//! neighborhood, a fine ±30°/10° pass refines it.

use wind_types::{EstimateMethod, TrackPoint, WindEstimate, MPS_TO_KNOTS};

use crate::angles::{angle_difference, normalize_deg};
use crate::config::EstimatorConfig;
use crate::estimators::{percentile, Estimator};

/// Coarse scan step, degrees (8 candidates).
const COARSE_STEP_DEG: f64 = 45.0;
/// Fine refinement half-span and step, degrees.
const FINE_SPAN_DEG: f64 = 30.0;
const FINE_STEP_DEG: f64 = 10.0;
/// Score below this caps confidence at the low-confidence ceiling.
const LOW_SCORE_THRESHOLD: f64 = 1.0;

pub struct VmgGridSearchEstimator;

impl VmgGridSearchEstimator {
    /// VMG score for one candidate: mean upwind VMG plus mean downwind VMG,
    /// m/s. Either subset may be empty and contributes zero.
    fn score_candidate(wind: f64, track: &[TrackPoint]) -> f64 {
        let mut vmg_up = Vec::new();
        let mut vmg_down = Vec::new();
        for p in track {
            let twa = angle_difference(p.course_deg, wind).abs().to_radians();
            if twa <= std::f64::consts::FRAC_PI_2 {
                vmg_up.push(p.speed_mps * twa.cos());
            } else {
                vmg_down.push(p.speed_mps * (std::f64::consts::PI - twa).cos());
            }
        }
        let mean = |v: &[f64]| {
            if v.is_empty() { 0.0 } else { v.iter().sum::<f64>() / v.len() as f64 }
        };
        mean(&vmg_up) + mean(&vmg_down)
    }
}

impl Estimator for VmgGridSearchEstimator {
    fn method(&self) -> EstimateMethod {
        EstimateMethod::VmgGridSearch
    }

    fn estimate(&self, track: &[TrackPoint], cfg: &EstimatorConfig) -> Option<WindEstimate> {
        let last_t = track.last()?.t;

        // Coarse pass
        let n_coarse = (360.0 / COARSE_STEP_DEG) as usize;
        let (coarse_best, _) = (0..n_coarse)
            .map(|i| {
                let w = i as f64 * COARSE_STEP_DEG;
                (w, Self::score_candidate(w, track))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;

        // Fine pass around the coarse winner
        let steps = (2.0 * FINE_SPAN_DEG / FINE_STEP_DEG) as i64;
        let (best_dir, best_score) = (0..=steps)
            .map(|i| {
                let w = normalize_deg(coarse_best - FINE_SPAN_DEG + i as f64 * FINE_STEP_DEG);
                (w, Self::score_candidate(w, track))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;
        if best_score <= 0.0 {
            return None;
        }

        let confidence = if best_score < LOW_SCORE_THRESHOLD {
            (best_score / 3.0).min(0.4)
        } else {
            (best_score / 3.0).min(0.75)
        };

        // Speed from the fast tail through the polar fraction, as in the
        // balance estimator; VMG alone fixes only the direction
        let speeds: Vec<f64> = track.iter().map(|p| p.speed_mps).collect();
        let speed_kts = percentile(&speeds, 0.95) * MPS_TO_KNOTS * cfg.polar.top_speed_fraction;

        Some(WindEstimate {
            direction_deg: best_dir,
            speed_kts,
            confidence,
            method: EstimateMethod::VmgGridSearch,
            t: last_t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Symmetric beat plus a run, wind from 0°.
    fn beat_and_run() -> Vec<TrackPoint> {
        let mut pts = Vec::new();
        let mut t = 0.0;
        for &(course, speed, len) in &[
            (42.0, 2.2, 50usize),
            (318.0, 2.2, 50),
            (170.0, 3.0, 50),
        ] {
            for _ in 0..len {
                pts.push(TrackPoint { t, lat: 60.0, lon: 25.0, speed_mps: speed, course_deg: course });
                t += 1.0;
            }
        }
        pts
    }

    #[test]
    fn refined_direction_close_to_truth() {
        let cfg = EstimatorConfig::default();
        let e = VmgGridSearchEstimator.estimate(&beat_and_run(), &cfg).expect("estimate");
        let err = angle_difference(e.direction_deg, 0.0).abs();
        assert!(err <= 15.0, "direction {} off true 0°", e.direction_deg);
        assert!(e.confidence > 0.0 && e.confidence <= 0.75);
    }

    #[test]
    fn deterministic_over_repeated_runs() {
        let cfg = EstimatorConfig::default();
        let track = beat_and_run();
        let a = VmgGridSearchEstimator.estimate(&track, &cfg);
        let b = VmgGridSearchEstimator.estimate(&track, &cfg);
        assert_eq!(a, b);
    }
}
