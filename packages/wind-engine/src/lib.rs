//! # wind-engine
//!
//! Wind estimation core for the SailWind suite: infers true wind direction
//! and speed from cleaned GPS tracks, with no wind instrumentation.
//!
//! Pipeline, bottom to top:
//! - [`maneuver`]: detect and classify course-change events (tack, jibe,
//!   bear-away, head-up) in a single boat's track
//! - [`estimators`]: three independent single-boat wind estimators
//!   (maneuver geometry, upwind/downwind polar balance, VMG grid search)
//! - [`bayesian`]: combine single-boat estimates into one record
//! - [`single_boat`]: orchestration of the above over a track
//! - [`reliability`] + [`fusion`]: weight boats by trust and fuse a fleet of
//!   estimates into one, maintaining histories and a wind drift model
//! - [`field`]: interpolate positioned fusion results into a gridded wind
//!   field (Gaussian process with IDW fallback)
//!
//! Errors surface only for caller-contract violations (non-finite input,
//! unordered timestamps). Sparse or degenerate data degrades to
//! zero-confidence records instead of failing.

pub mod angles;
pub mod bayesian;
pub mod config;
pub mod error;
pub mod estimators;
pub mod field;
pub mod fusion;
pub mod maneuver;
pub mod reliability;
pub mod single_boat;

pub use bayesian::BayesianCombiner;
pub use config::{
    BoatType, EstimatorConfig, FieldConfig, FusionConfig, PolarRatios, ReliabilityConfig,
};
pub use error::EngineError;
pub use estimators::{Estimator, EstimatorKind};
pub use field::SpatiotemporalFieldEstimator;
pub use fusion::{BoatObservation, DriftModel, MultiBoatFusionEngine};
pub use maneuver::ManeuverDetector;
pub use reliability::{BoatProfile, BoatReliabilityScorer};
pub use single_boat::SingleBoatWindEstimator;
