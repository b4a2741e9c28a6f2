//! polar_balance.rs — Wind from course/speed polar behavior
//!
//! Scans candidate wind directions and scores each by how well the track's
//! upwind/downwind structure matches a sailing polar: boats sail measurably
//! faster off the wind than hard on it, and their relative-angle histogram
//! peaks near the optimal pointing angles. The pointing-angle term is the
//! stronger wind-direction signal, so the upwind histogram term is weighted
//! double.

use wind_types::{EstimateMethod, TrackPoint, WindEstimate, MPS_TO_KNOTS};

use crate::angles::angle_difference;
use crate::config::EstimatorConfig;
use crate::estimators::{median, percentile, Estimator};

/// Candidate step, degrees (36 candidates over the full circle).
const CANDIDATE_STEP_DEG: f64 = 10.0;
/// Histogram bin width for relative angles, degrees.
const HIST_BIN_DEG: f64 = 10.0;
/// A histogram peak this far from the optimal angle scores zero, degrees.
const HIST_AGREEMENT_SPAN_DEG: f64 = 45.0;
/// Score below this caps confidence at the low-confidence ceiling.
const LOW_SCORE_THRESHOLD: f64 = 1.0;

pub struct PolarBalanceEstimator;

impl PolarBalanceEstimator {
    /// Score one candidate wind direction against the track.
    fn score_candidate(wind: f64, track: &[TrackPoint], cfg: &EstimatorConfig) -> f64 {
        let mut upwind: Vec<(f64, f64)> = Vec::new(); // (rel angle, speed)
        let mut downwind: Vec<(f64, f64)> = Vec::new();
        for p in track {
            let rel = angle_difference(p.course_deg, wind).abs();
            if rel <= cfg.upwind_threshold {
                upwind.push((rel, p.speed_mps));
            } else if rel >= cfg.downwind_threshold {
                downwind.push((rel, p.speed_mps));
            }
        }
        if upwind.is_empty() || downwind.is_empty() {
            return 0.0;
        }

        let mean = |v: &[(f64, f64)]| v.iter().map(|x| x.1).sum::<f64>() / v.len() as f64;
        let up_speed = mean(&upwind);
        let down_speed = mean(&downwind);
        if up_speed <= 0.0 {
            return 0.0;
        }

        // Term 1: observed downwind/upwind speed ratio vs the polar expectation
        let observed_ratio = down_speed / up_speed;
        let ratio_term = 1.0 / (1.0 + (observed_ratio - cfg.polar.expected_speed_ratio).abs());

        // Terms 2+3: histogram peaks of relative angle vs optimal angles;
        // the upwind (pointing) term counts double
        let up_peak = histogram_peak(&upwind);
        let down_peak = histogram_peak(&downwind);
        let up_term = 2.0
            * (1.0
                - (up_peak - cfg.boat_type.optimal_upwind_angle()).abs()
                    / HIST_AGREEMENT_SPAN_DEG)
                .max(0.0);
        let down_term = (1.0
            - (down_peak - cfg.boat_type.optimal_downwind_angle()).abs()
                / HIST_AGREEMENT_SPAN_DEG)
            .max(0.0);

        ratio_term + up_term + down_term
    }

    /// Wind speed from the fast tail of the speed distribution, widened or
    /// narrowed by how gusty the track looks (p95/median spread).
    fn estimate_speed(track: &[TrackPoint], cfg: &EstimatorConfig) -> f64 {
        let speeds: Vec<f64> = track.iter().map(|p| p.speed_mps).collect();
        let p95 = percentile(&speeds, 0.95);
        let med = median(&speeds);
        let base_kts = p95 * MPS_TO_KNOTS * cfg.polar.top_speed_fraction;
        if med <= 0.0 {
            return base_kts;
        }
        // Spread around 1.25 is typical; ±10% adjustment across the band
        let spread = p95 / med;
        let adjust = 1.0 + 0.1 * ((spread - 1.25) / 0.25).clamp(-1.0, 1.0);
        base_kts * adjust
    }
}

/// Center of the most populated relative-angle bin.
fn histogram_peak(samples: &[(f64, f64)]) -> f64 {
    let n_bins = (180.0 / HIST_BIN_DEG) as usize;
    let mut counts = vec![0usize; n_bins];
    for &(rel, _) in samples {
        let bin = ((rel / HIST_BIN_DEG) as usize).min(n_bins - 1);
        counts[bin] += 1;
    }
    let peak = counts
        .iter()
        .enumerate()
        .max_by_key(|(_, &c)| c)
        .map(|(i, _)| i)
        .unwrap_or(0);
    (peak as f64 + 0.5) * HIST_BIN_DEG
}

impl Estimator for PolarBalanceEstimator {
    fn method(&self) -> EstimateMethod {
        EstimateMethod::CourseSpeedBalance
    }

    fn estimate(&self, track: &[TrackPoint], cfg: &EstimatorConfig) -> Option<WindEstimate> {
        let last_t = track.last()?.t;

        let n_candidates = (360.0 / CANDIDATE_STEP_DEG) as usize;
        let (best_dir, best_score) = (0..n_candidates)
            .map(|i| {
                let w = i as f64 * CANDIDATE_STEP_DEG;
                (w, Self::score_candidate(w, track, cfg))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;
        if best_score <= 0.0 {
            return None; // no candidate produced both subsets
        }

        let confidence = if best_score < LOW_SCORE_THRESHOLD {
            (best_score / 4.0).min(0.3)
        } else {
            (best_score / 4.0).min(0.7)
        };

        Some(WindEstimate {
            direction_deg: best_dir,
            speed_kts: Self::estimate_speed(track, cfg),
            confidence,
            method: EstimateMethod::CourseSpeedBalance,
            t: last_t,
        })
    }
}
