//! reliability.rs — Per-boat trust scoring
//!
//! A boat's contribution to the fleet estimate is weighted by how much we
//! trust it: configured crew skill, how internally consistent its recent
//! estimates are (circular concentration of directions, speed coefficient
//! of variation), and how well its latest estimate agrees with its own
//! recent history after subtracting the drift the fleet model expects.
//! A direction that genuinely shifted with the breeze is not penalized as
//! inconsistency.

use wind_types::WindEstimate;

use crate::angles::{angle_difference, mean_resultant_length};
use crate::config::{BoatType, ReliabilityConfig};
use crate::fusion::DriftModel;

/// Direction disagreement that zeroes the agreement term, degrees.
const DIR_AGREEMENT_SPAN_DEG: f64 = 45.0;
/// Speed disagreement that zeroes the agreement term, knots.
const SPEED_AGREEMENT_SPAN_KTS: f64 = 5.0;
/// Direction / speed weights inside consistency and history terms.
const DIR_TERM_WEIGHT: f64 = 0.7;
const SPEED_TERM_WEIGHT: f64 = 0.3;
/// Score used when a component has too little data to say anything.
const NEUTRAL_SCORE: f64 = 0.5;

/// Static per-boat configuration supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct BoatProfile {
    pub boat_type: BoatType,
    /// Externally configured crew skill [0, 1]
    pub skill_level: f64,
}

impl Default for BoatProfile {
    fn default() -> Self {
        Self { boat_type: BoatType::default(), skill_level: 0.5 }
    }
}

pub struct BoatReliabilityScorer {
    cfg: ReliabilityConfig,
}

impl BoatReliabilityScorer {
    pub fn new(cfg: ReliabilityConfig) -> Self {
        Self { cfg }
    }

    /// Profile assumed for boats the caller never registered.
    pub fn default_profile(&self) -> BoatProfile {
        BoatProfile { boat_type: BoatType::default(), skill_level: self.cfg.default_skill }
    }

    /// Trust score in [0, 1] for one boat given its estimate history
    /// (oldest-first, latest last) and the fleet drift model.
    pub fn reliability(
        &self,
        profile: &BoatProfile,
        history: &[WindEstimate],
        drift: &DriftModel,
    ) -> f64 {
        let skill = profile.skill_level.clamp(0.0, 1.0);
        let consistency = self.consistency_score(history);
        let agreement = self.history_score(history, drift);

        let base = (self.cfg.skill_weight * skill
            + self.cfg.consistency_weight * consistency
            + self.cfg.history_weight * agreement)
            .clamp(0.0, 1.0);

        let type_multiplier = 0.9 + 0.2 * (profile.boat_type.type_score() - 1.0);
        (base * type_multiplier).clamp(0.0, 1.0)
    }

    /// Internal spread of the boat's recent estimates: circular concentration
    /// of directions (0.7) plus a speed coefficient-of-variation penalty (0.3).
    fn consistency_score(&self, history: &[WindEstimate]) -> f64 {
        if history.len() < 2 {
            return NEUTRAL_SCORE;
        }
        let directions: Vec<f64> = history.iter().map(|e| e.direction_deg).collect();
        let concentration = mean_resultant_length(&directions);

        let speeds: Vec<f64> = history.iter().map(|e| e.speed_kts).collect();
        let mean = speeds.iter().sum::<f64>() / speeds.len() as f64;
        let cv_term = if mean > 0.0 {
            let var = speeds.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
                / speeds.len() as f64;
            (1.0 - var.sqrt() / mean).max(0.0)
        } else {
            NEUTRAL_SCORE
        };

        DIR_TERM_WEIGHT * concentration + SPEED_TERM_WEIGHT * cv_term
    }

    /// Agreement of the latest estimate with the boat's own recent history,
    /// drift-compensated.
    fn history_score(&self, history: &[WindEstimate], drift: &DriftModel) -> f64 {
        let Some((latest, earlier)) = history.split_last() else {
            return NEUTRAL_SCORE;
        };
        let comparable: Vec<&WindEstimate> = earlier
            .iter()
            .rev()
            .take(self.cfg.history_lookback)
            .filter(|e| latest.t - e.t <= self.cfg.max_history_age_s)
            .collect();
        if comparable.is_empty() {
            return NEUTRAL_SCORE;
        }

        let mut total = 0.0;
        for prev in &comparable {
            let minutes = (latest.t - prev.t) / 60.0;
            // Where the drift model says this older estimate should be now
            let expected_dir = prev.direction_deg + drift.direction_rate_deg_per_min * minutes;
            let expected_speed = prev.speed_kts + drift.speed_rate_kts_per_min * minutes;

            let dir_err = angle_difference(latest.direction_deg, expected_dir).abs();
            let dir_agreement = (1.0 - dir_err / DIR_AGREEMENT_SPAN_DEG).max(0.0);
            let speed_err = (latest.speed_kts - expected_speed).abs();
            let speed_agreement = (1.0 - speed_err / SPEED_AGREEMENT_SPAN_KTS).max(0.0);

            total += DIR_TERM_WEIGHT * dir_agreement + SPEED_TERM_WEIGHT * speed_agreement;
        }
        total / comparable.len() as f64
    }
}
