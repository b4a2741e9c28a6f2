//! single_boat.rs — Orchestration of the single-boat estimators
//!
//! Runs the fixed estimator set over a cleaned track and reduces their
//! outputs to one `WindEstimate`. Estimators run in `EstimatorKind::ALL`
//! order: the scan-based pair first, then the maneuver classifier seeded
//! with the best direction found so far, so tack/jibe classification starts
//! from something sensible.
//!
//! The combiner only runs when every estimator produced a result; if any
//! abstained, the single highest-confidence estimate stands on its own,
//! keeping its own method tag.
//!
//! Sparse data never fails: fewer than `min_valid_points` moving fixes
//! returns a zero-confidence `insufficient_data` record and the pipeline
//! carries on.

use tracing::debug;
use wind_types::{TrackPoint, WindEstimate, MPS_TO_KNOTS};

use crate::bayesian::BayesianCombiner;
use crate::config::EstimatorConfig;
use crate::error::{validate_track, EngineError};
use crate::estimators::EstimatorKind;

pub struct SingleBoatWindEstimator {
    cfg: EstimatorConfig,
}

impl SingleBoatWindEstimator {
    pub fn new(cfg: EstimatorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.cfg
    }

    /// One estimate for the whole track.
    ///
    /// Errors only on caller-contract violations (non-finite fields,
    /// non-monotonic timestamps); thin or noisy data degrades to a
    /// zero-confidence result instead.
    pub fn estimate(&self, track: &[TrackPoint]) -> Result<WindEstimate, EngineError> {
        validate_track(track)?;
        Ok(self.estimate_unchecked(track))
    }

    /// Estimate over a long track in bounded chunks, one record per chunk,
    /// stamped with the chunk's last timestamp. The track is validated once
    /// up front; chunks of a validated track are themselves valid. Maneuvers
    /// whose averaging windows are cut by a chunk boundary are skipped by
    /// the detector, so a cut window can only lower confidence, never raise
    /// it.
    pub fn estimate_series(&self, track: &[TrackPoint]) -> Result<Vec<WindEstimate>, EngineError> {
        validate_track(track)?;
        let chunk = self.cfg.chunk_size.max(1);
        Ok(track.chunks(chunk).map(|c| self.estimate_unchecked(c)).collect())
    }

    /// Estimation proper, past the validation boundary.
    fn estimate_unchecked(&self, track: &[TrackPoint]) -> WindEstimate {
        let last_t = track.last().map(|p| p.t).unwrap_or(0.0);

        // Drop drifting/moored fixes; estimators want sailing data
        let min_mps = self.cfg.min_speed_threshold_kts / MPS_TO_KNOTS;
        let valid: Vec<TrackPoint> = track
            .iter()
            .filter(|p| p.speed_mps >= min_mps)
            .copied()
            .collect();
        if valid.len() < self.cfg.min_valid_points {
            debug!(
                valid = valid.len(),
                needed = self.cfg.min_valid_points,
                "insufficient valid points"
            );
            return WindEstimate::insufficient_data(last_t);
        }

        let mut estimates: Vec<WindEstimate> = Vec::with_capacity(EstimatorKind::ALL.len());
        for kind in EstimatorKind::ALL {
            let seed = estimates
                .iter()
                .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
                .map(|e| e.direction_deg);
            let estimator = kind.build(seed);
            if let Some(e) = estimator.estimate(&valid, &self.cfg) {
                debug!(
                    method = ?estimator.method(),
                    confidence = e.confidence,
                    "estimator produced a result"
                );
                estimates.push(e);
            }
        }

        if estimates.is_empty() {
            return WindEstimate::insufficient_data(last_t);
        }

        // Full house required for combination; any abstention means the
        // best single estimate is used directly
        if self.cfg.use_bayesian && estimates.len() == EstimatorKind::ALL.len() {
            BayesianCombiner::combine(&estimates).unwrap_or(estimates[0])
        } else {
            estimates
                .iter()
                .copied()
                .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
                .unwrap_or(estimates[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::{angle_difference, normalize_deg};

    /// Deterministic beat: 45°/315° legs with dipped transitions, wind 0°.
    fn beat(n_legs: usize, leg_len: usize) -> Vec<TrackPoint> {
        let mut pts = Vec::new();
        let mut t = 0.0;
        let mut course = 45.0;
        for leg in 0..n_legs {
            for _ in 0..leg_len {
                pts.push(TrackPoint {
                    t,
                    lat: 60.0 + t * 1e-6,
                    lon: 25.0 + t * 1e-6,
                    speed_mps: 2.6,
                    course_deg: course,
                });
                t += 1.0;
            }
            if leg + 1 < n_legs {
                let next = if course == 45.0 { 315.0 } else { 45.0 };
                let step = angle_difference(next, course) / 8.0;
                for k in 1..=8 {
                    pts.push(TrackPoint {
                        t,
                        lat: 60.0 + t * 1e-6,
                        lon: 25.0 + t * 1e-6,
                        speed_mps: 1.5,
                        course_deg: normalize_deg(course + step * k as f64),
                    });
                    t += 1.0;
                }
                course = next;
            }
        }
        pts
    }

    /// Upwind leg bearing away onto a run: one maneuver, no wind crossings,
    /// so the maneuver-based estimator abstains.
    fn bear_away_track() -> Vec<TrackPoint> {
        let mut pts = Vec::new();
        let mut t = 0.0;
        for _ in 0..60 {
            pts.push(TrackPoint {
                t,
                lat: 60.0 + t * 1e-6,
                lon: 25.0,
                speed_mps: 2.6,
                course_deg: 40.0,
            });
            t += 1.0;
        }
        for k in 1..=8 {
            pts.push(TrackPoint {
                t,
                lat: 60.0 + t * 1e-6,
                lon: 25.0,
                speed_mps: 2.8,
                course_deg: 40.0 + (170.0 - 40.0) * k as f64 / 8.0,
            });
            t += 1.0;
        }
        for _ in 0..60 {
            pts.push(TrackPoint {
                t,
                lat: 60.0 + t * 1e-6,
                lon: 25.0,
                speed_mps: 3.2,
                course_deg: 170.0,
            });
            t += 1.0;
        }
        pts
    }

    fn cfg() -> EstimatorConfig {
        EstimatorConfig { min_tack_angle_change: 30.0, ..EstimatorConfig::default() }
    }

    #[test]
    fn combined_estimate_near_true_wind() {
        let est = SingleBoatWindEstimator::new(cfg());
        let e = est.estimate(&beat(4, 60)).unwrap();
        let err = angle_difference(e.direction_deg, 0.0).abs();
        assert!(err < 20.0, "direction {} off true 0°", e.direction_deg);
        assert!(e.confidence > 0.0 && e.confidence <= 0.95);
    }

    #[test]
    fn abstaining_estimator_forces_best_single() {
        // No wind crossings: only the two scan-based estimators succeed, so
        // the result must carry a concrete method, not the combiner's tag
        let est = SingleBoatWindEstimator::new(cfg());
        let e = est.estimate(&bear_away_track()).unwrap();
        assert!(
            matches!(
                e.method,
                wind_types::EstimateMethod::VmgGridSearch
                    | wind_types::EstimateMethod::CourseSpeedBalance
            ),
            "partial estimator set must not be combined, got {:?}",
            e.method
        );
        assert!(e.confidence > 0.0);
    }

    #[test]
    fn insufficient_data_returns_zero_confidence() {
        let est = SingleBoatWindEstimator::new(cfg());
        // 5 moving points: below the 10-point floor
        let track: Vec<TrackPoint> = (0..5)
            .map(|i| TrackPoint {
                t: i as f64,
                lat: 60.0,
                lon: 25.0,
                speed_mps: 3.0,
                course_deg: 45.0,
            })
            .collect();
        let e = est.estimate(&track).unwrap();
        assert_eq!(e.confidence, 0.0);
        assert_eq!(e.method, wind_types::EstimateMethod::InsufficientData);
    }

    #[test]
    fn slow_points_do_not_count_as_valid() {
        let est = SingleBoatWindEstimator::new(cfg());
        // Plenty of points, all below the 2 kt speed floor
        let track: Vec<TrackPoint> = (0..50)
            .map(|i| TrackPoint {
                t: i as f64,
                lat: 60.0,
                lon: 25.0,
                speed_mps: 0.3,
                course_deg: (i * 7) as f64 % 360.0,
            })
            .collect();
        let e = est.estimate(&track).unwrap();
        assert_eq!(e.method, wind_types::EstimateMethod::InsufficientData);
    }

    #[test]
    fn idempotent_on_identical_input() {
        let est = SingleBoatWindEstimator::new(cfg());
        let track = beat(4, 60);
        let a = est.estimate(&track).unwrap();
        let b = est.estimate(&track).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn best_single_mode_picks_highest_confidence() {
        let mut c = cfg();
        c.use_bayesian = false;
        let est = SingleBoatWindEstimator::new(c);
        let e = est.estimate(&beat(4, 60)).unwrap();
        // best-single mode must name a concrete algorithm, not the combiner
        assert_ne!(e.method, wind_types::EstimateMethod::Bayesian);
        assert!(e.confidence > 0.0);
    }

    #[test]
    fn series_emits_one_record_per_chunk() {
        let mut c = cfg();
        c.chunk_size = 120;
        let est = SingleBoatWindEstimator::new(c);
        let track = beat(4, 60); // 264 points → 3 chunks
        let series = est.estimate_series(&track).unwrap();
        assert_eq!(series.len(), 3);
        // records aligned to the track's own timestamps
        assert_eq!(series[0].t, track[119].t);
        assert_eq!(series.last().unwrap().t, track.last().unwrap().t);
    }

    #[test]
    fn contract_violation_raises() {
        let est = SingleBoatWindEstimator::new(cfg());
        let mut track = beat(2, 30);
        track[5].lat = f64::NAN;
        assert!(est.estimate(&track).is_err());
    }
}
