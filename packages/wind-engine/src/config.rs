//! config.rs — Tunables for every stage of the estimation pipeline
//!
//! All defaults are overridable per call or per estimator instance, and all
//! of them deserialize from TOML/JSON so the driver can load a config file.
//!
//! The polar ratio constants (boat speed as a fraction of true wind speed on
//! a beat/run) are empirical tunables without a documented derivation; they
//! are kept here as named fields so a domain expert can calibrate them per
//! fleet instead of hunting for literals.

use serde::{Deserialize, Serialize};

// ── Boat type ─────────────────────────────────────────────────────────────────

/// Hull class. Adjusts the polar assumptions (optimal pointing angles, tack
/// speed-drop sensitivity) and the reliability type score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoatType {
    /// Planing dinghy — points lower, accelerates hard out of tacks
    Dinghy,
    /// Sport keelboat — the calibration baseline
    SportKeelboat,
    /// Cruiser — points lower, slower through maneuvers
    Cruiser,
}

impl Default for BoatType {
    fn default() -> Self {
        Self::SportKeelboat
    }
}

impl BoatType {
    /// Optimal true wind angle upwind, degrees off the wind
    pub fn optimal_upwind_angle(&self) -> f64 {
        match self {
            Self::Dinghy => 45.0,
            Self::SportKeelboat => 42.0,
            Self::Cruiser => 50.0,
        }
    }

    /// Optimal true wind angle downwind, degrees off the wind
    pub fn optimal_downwind_angle(&self) -> f64 {
        match self {
            Self::Dinghy => 145.0,
            Self::SportKeelboat => 150.0,
            Self::Cruiser => 160.0,
        }
    }

    /// Performance score feeding the reliability multiplier
    /// `0.9 + 0.2 × (type_score − 1.0)`
    pub fn type_score(&self) -> f64 {
        match self {
            Self::Dinghy => 0.9,
            Self::SportKeelboat => 1.0,
            Self::Cruiser => 0.8,
        }
    }
}

// ── Polar ratios ──────────────────────────────────────────────────────────────

/// Boat-speed / wind-speed ratios used to back out wind speed from boat
/// speed. Empirical; flagged for per-fleet calibration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolarRatios {
    /// Boat speed as a fraction of TWS on a close-hauled beat
    pub upwind: f64,
    /// Boat speed as a fraction of TWS on a run (jibe legs)
    pub downwind: f64,
    /// Fraction applied to the p95 boat speed in the polar-balance estimator
    pub top_speed_fraction: f64,
    /// Expected upwind/downwind boat-speed ratio in the balance score
    pub expected_speed_ratio: f64,
}

impl Default for PolarRatios {
    fn default() -> Self {
        Self {
            upwind: 0.70,
            downwind: 0.65,
            top_speed_fraction: 0.7,
            expected_speed_ratio: 1.5,
        }
    }
}

// ── Single-boat estimation ────────────────────────────────────────────────────

/// Configuration for maneuver detection and the single-boat estimators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub boat_type: BoatType,
    /// Smoothed course change that flags a maneuver candidate, degrees
    pub min_tack_angle_change: f64,
    /// |TWA| at or below this is upwind, degrees
    pub upwind_threshold: f64,
    /// |TWA| at or above this is downwind, degrees
    pub downwind_threshold: f64,
    /// Points slower than this are ignored as drifting/moored, knots
    pub min_speed_threshold_kts: f64,
    /// Centered moving-average window for the bearing-change rate, samples
    pub smoothing_window: usize,
    /// Events shorter than this are flagged out by `filter_by_duration`, s
    pub min_maneuver_duration_s: f64,
    /// Events longer than this are flagged out by `filter_by_duration`, s
    pub max_maneuver_duration_s: f64,
    /// Seconds averaged on each side of an event center for bearings/speeds
    pub event_window_s: f64,
    /// Seconds averaged on each side of a maneuver for wind-speed backout
    pub speed_window_s: f64,
    /// Fewer valid points than this returns an insufficient_data estimate
    pub min_valid_points: usize,
    /// Combine estimators via the Bayesian combiner (true) or take the
    /// single highest-confidence estimate (false)
    pub use_bayesian: bool,
    /// Track chunk size for bounded working set on long tracks, points
    pub chunk_size: usize,
    pub polar: PolarRatios,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            boat_type: BoatType::default(),
            min_tack_angle_change: 60.0,
            upwind_threshold: 45.0,
            downwind_threshold: 120.0,
            min_speed_threshold_kts: 2.0,
            smoothing_window: 5,
            min_maneuver_duration_s: 3.0,
            max_maneuver_duration_s: 20.0,
            event_window_s: 5.0,
            speed_window_s: 30.0,
            min_valid_points: 10,
            use_bayesian: true,
            chunk_size: 10_000,
            polar: PolarRatios::default(),
        }
    }
}

// ── Reliability scoring ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityConfig {
    /// Externally configured crew skill [0, 1] used when a boat has none set
    pub default_skill: f64,
    /// Component weights: skill / consistency / history (sum 1.0)
    pub skill_weight: f64,
    pub consistency_weight: f64,
    pub history_weight: f64,
    /// Historical estimates compared against the latest one
    pub history_lookback: usize,
    /// Historical estimates older than this are ignored, seconds
    pub max_history_age_s: f64,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            default_skill: 0.5,
            skill_weight: 0.4,
            consistency_weight: 0.4,
            history_weight: 0.2,
            history_lookback: 5,
            max_history_age_s: 1800.0,
        }
    }
}

// ── Fleet fusion ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// A boat contributes only if it has an estimate within this of the
    /// fusion time point, seconds
    pub time_window_s: f64,
    /// Boats needed before the full Bayesian path (prior + robust speed
    /// averaging) runs; below this, plain weighted averaging
    pub min_boats_for_bayesian: usize,
    /// Weight of the direction prior against the observed weighted mean
    pub prior_weight: f64,
    /// Robust speed averaging never down-weights a boat below this factor
    pub robust_weight_floor: f64,
    /// Bounded history retention (per boat and fleet-level), entries
    pub history_retention: usize,
    /// Fleet history entries the drift model is fitted over
    pub drift_fit_window: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            time_window_s: 60.0,
            min_boats_for_bayesian: 3,
            prior_weight: 0.3,
            robust_weight_floor: 0.1,
            history_retention: 100,
            drift_fit_window: 10,
        }
    }
}

// ── Wind field interpolation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Cells per grid side
    pub grid_resolution: usize,
    /// History entries further than this from the field time are ignored, s
    pub time_window_s: f64,
    /// Inverse-distance weighting exponent
    pub idw_exponent: f64,
    /// Within this distance of a sample the IDW path copies it exactly,
    /// in grid coordinate units (degrees; 0.01° ≈ 1 km)
    pub near_field_distance: f64,
    /// RBF kernel length scale, same spatial units as the grid
    pub gp_length_scale: f64,
    /// Constant (signal variance) factor of the kernel
    pub gp_signal_variance: f64,
    /// White-noise term added to the kernel diagonal
    pub gp_noise_variance: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            grid_resolution: 20,
            time_window_s: 1800.0,
            idw_exponent: 2.0,
            near_field_distance: 0.01,
            gp_length_scale: 0.05,
            gp_signal_variance: 1.0,
            gp_noise_variance: 1e-3,
        }
    }
}
