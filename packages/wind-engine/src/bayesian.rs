//! bayesian.rs — Fusion of independent wind estimates
//!
//! Direction is a confidence-weighted circular mean, speed a weighted
//! average. Agreement among more independent estimators raises the combined
//! confidence above the best single input, with diminishing returns and a
//! hard ceiling so stacked estimators can never claim certainty.

use wind_types::{EstimateMethod, WindEstimate};

use crate::angles::circular_mean;

/// Per-extra-estimator confidence bonus and its cap.
const AGREEMENT_BONUS_PER_INPUT: f64 = 0.1;
const AGREEMENT_BONUS_CAP: f64 = 0.3;
/// Combined confidence never exceeds this.
const CONFIDENCE_CEILING: f64 = 0.95;

pub struct BayesianCombiner;

impl BayesianCombiner {
    /// Combine N independent estimates into one. `None` for empty input.
    pub fn combine(estimates: &[WindEstimate]) -> Option<WindEstimate> {
        if estimates.is_empty() {
            return None;
        }
        if estimates.len() == 1 {
            return Some(estimates[0]);
        }

        let directions: Vec<f64> = estimates.iter().map(|e| e.direction_deg).collect();
        let weights: Vec<f64> = estimates.iter().map(|e| e.confidence).collect();
        let total_weight: f64 = weights.iter().sum();

        let direction_deg = circular_mean(&directions, &weights);
        let speed_kts = if total_weight > 0.0 {
            estimates
                .iter()
                .map(|e| e.speed_kts * e.confidence)
                .sum::<f64>()
                / total_weight
        } else {
            estimates.iter().map(|e| e.speed_kts).sum::<f64>() / estimates.len() as f64
        };

        let max_confidence = weights.iter().cloned().fold(0.0, f64::max);
        let bonus = (AGREEMENT_BONUS_PER_INPUT * estimates.len() as f64).min(AGREEMENT_BONUS_CAP);
        let confidence = (max_confidence + (1.0 - max_confidence) * bonus)
            .min(CONFIDENCE_CEILING)
            .max(max_confidence.min(CONFIDENCE_CEILING));

        let t = estimates.iter().map(|e| e.t).fold(f64::NEG_INFINITY, f64::max);

        Some(WindEstimate {
            direction_deg,
            speed_kts,
            confidence,
            method: EstimateMethod::Bayesian,
            t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn est(dir: f64, speed: f64, conf: f64, t: f64) -> WindEstimate {
        WindEstimate {
            direction_deg: dir,
            speed_kts: speed,
            confidence: conf,
            method: EstimateMethod::VmgGridSearch,
            t,
        }
    }

    #[test]
    fn combined_confidence_bounded() {
        let inputs = vec![est(40.0, 10.0, 0.7, 1.0), est(50.0, 11.0, 0.6, 2.0), est(45.0, 10.5, 0.75, 3.0)];
        let c = BayesianCombiner::combine(&inputs).unwrap();
        let max_in = 0.75;
        assert!(c.confidence >= max_in, "combined {} < max input", c.confidence);
        assert!(c.confidence <= 0.95);
    }

    #[test]
    fn direction_weighted_toward_confident_input() {
        let inputs = vec![est(0.0, 10.0, 0.9, 1.0), est(90.0, 10.0, 0.1, 1.0)];
        let c = BayesianCombiner::combine(&inputs).unwrap();
        assert!(c.direction_deg < 45.0, "got {}", c.direction_deg);
    }

    #[test]
    fn zero_weights_fall_back_to_plain_mean() {
        let inputs = vec![est(80.0, 8.0, 0.0, 1.0), est(100.0, 12.0, 0.0, 2.0)];
        let c = BayesianCombiner::combine(&inputs).unwrap();
        assert!((c.direction_deg - 90.0).abs() < 1e-6);
        assert!((c.speed_kts - 10.0).abs() < 1e-9);
    }

    #[test]
    fn timestamp_is_latest_input() {
        let inputs = vec![est(10.0, 5.0, 0.5, 100.0), est(20.0, 5.0, 0.5, 250.0)];
        let c = BayesianCombiner::combine(&inputs).unwrap();
        assert_eq!(c.t, 250.0);
    }

    #[test]
    fn wraparound_directions_average_correctly() {
        let inputs = vec![est(350.0, 10.0, 0.5, 1.0), est(10.0, 10.0, 0.5, 1.0)];
        let c = BayesianCombiner::combine(&inputs).unwrap();
        assert!(c.direction_deg < 1.0 || c.direction_deg > 359.0, "got {}", c.direction_deg);
    }
}
