//! estimators/ — The single-boat wind estimators
//!
//! A closed set of algorithm variants behind one small capability trait:
//! each estimator reads an immutable track and produces at most one
//! `WindEstimate`. Returning `None` means the algorithm had nothing to say
//! (too few maneuvers, empty subsets); the orchestrator in `single_boat`
//! decides how to degrade.

mod maneuver_based;
mod polar_balance;
mod vmg;

pub use maneuver_based::ManeuverBasedEstimator;
pub use polar_balance::PolarBalanceEstimator;
pub use vmg::VmgGridSearchEstimator;

use wind_types::{EstimateMethod, TrackPoint, WindEstimate};

use crate::config::EstimatorConfig;

/// One wind-estimation algorithm over a single boat's track.
pub trait Estimator {
    fn method(&self) -> EstimateMethod;

    /// Estimate wind from a cleaned, speed-filtered track. `None` when the
    /// algorithm cannot produce an estimate at all (distinct from a low
    /// confidence result).
    fn estimate(&self, track: &[TrackPoint], cfg: &EstimatorConfig) -> Option<WindEstimate>;
}

/// The fixed set of single-boat algorithms. New estimators extend this enum
/// rather than branching on method-name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorKind {
    ManeuverBased,
    CourseSpeedBalance,
    VmgGridSearch,
}

impl EstimatorKind {
    /// Run order. The scan-based estimators go first so the maneuver
    /// classifier can be seeded with the best direction they found.
    pub const ALL: [EstimatorKind; 3] = [
        EstimatorKind::VmgGridSearch,
        EstimatorKind::CourseSpeedBalance,
        EstimatorKind::ManeuverBased,
    ];

    /// Construct the estimator for this kind. `assumed_wind_deg` seeds the
    /// maneuver-based estimator and is ignored by the others.
    pub fn build(self, assumed_wind_deg: Option<f64>) -> Box<dyn Estimator> {
        match self {
            EstimatorKind::ManeuverBased => {
                Box::new(ManeuverBasedEstimator::new(assumed_wind_deg))
            }
            EstimatorKind::CourseSpeedBalance => Box::new(PolarBalanceEstimator),
            EstimatorKind::VmgGridSearch => Box::new(VmgGridSearchEstimator),
        }
    }
}

// ── Shared numeric helpers ────────────────────────────────────────────────────

/// Interpolation-free percentile (nearest-rank on a sorted copy).
/// `p` in [0, 1]. Empty input returns 0.
pub(crate) fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx]
}

pub(crate) fn median(values: &[f64]) -> f64 {
    percentile(values, 0.5)
}
