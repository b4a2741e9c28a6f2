//! error.rs — Engine error taxonomy
//!
//! Only caller-contract violations are errors. Data-quality problems
//! (insufficient points, zero weights, ill-conditioned GP fits) degrade to
//! guarded fallbacks or zero-confidence results and never raise.

use thiserror::Error;
use wind_types::TrackPoint;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A required track field was never populated (NaN/Inf placeholder left
    /// by the caller). The typed equivalent of a missing column.
    #[error("non-finite {field} at track index {index}")]
    NonFiniteField { field: &'static str, index: usize },

    /// Track timestamps must be strictly increasing.
    #[error("non-monotonic timestamp at track index {index}")]
    NonMonotonicTrack { index: usize },
}

/// Validate the caller contract on an input track. Called once at the
/// engine boundary; everything past this point assumes a clean track.
pub fn validate_track(track: &[TrackPoint]) -> Result<(), EngineError> {
    for (i, p) in track.iter().enumerate() {
        for (field, v) in [
            ("timestamp", p.t),
            ("latitude", p.lat),
            ("longitude", p.lon),
            ("speed", p.speed_mps),
            ("course", p.course_deg),
        ] {
            if !v.is_finite() {
                return Err(EngineError::NonFiniteField { field, index: i });
            }
        }
        if i > 0 && p.t <= track[i - 1].t {
            return Err(EngineError::NonMonotonicTrack { index: i });
        }
    }
    Ok(())
}
