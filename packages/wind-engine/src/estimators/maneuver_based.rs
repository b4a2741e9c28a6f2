//! maneuver_based.rs — Wind from tack/jibe geometry
//!
//! A tack or jibe is symmetric about the wind axis, so the circular midpoint
//! of the before/after bearings points either straight at the wind (bow
//! crossing) or straight away from it (stern crossing). With two or more
//! maneuvers the ambiguity averages out; a seeded assumed wind from another
//! estimator resolves it per event.
//!
//! Wind speed is backed out from boat speed around each maneuver via the
//! configured polar ratios (boat speed ≈ 0.70 × TWS on a beat, 0.65 on a
//! run), then the median across maneuvers is taken to resist outliers.

use tracing::debug;
use wind_types::{EstimateMethod, ManeuverEvent, ManeuverType, TrackPoint, WindEstimate,
    MPS_TO_KNOTS};

use crate::angles::{angle_difference, circular_mean, normalize_deg};
use crate::config::EstimatorConfig;
use crate::estimators::{median, Estimator};
use crate::maneuver::ManeuverDetector;

/// Recency ramp endpoints: oldest event weight → newest event weight.
const RECENCY_RAMP: (f64, f64) = (0.5, 1.0);

pub struct ManeuverBasedEstimator {
    /// Assumed wind used to classify maneuvers and resolve the bisector
    /// ambiguity. Seeded by the orchestrator from the best other estimate;
    /// `None` falls back to the event's own tack/jibe label.
    pub initial_wind_deg: Option<f64>,
}

impl ManeuverBasedEstimator {
    pub fn new(initial_wind_deg: Option<f64>) -> Self {
        Self { initial_wind_deg }
    }

    /// Per-event wind direction: the maneuver bisector, flipped to the
    /// side the evidence favors.
    fn event_wind(&self, ev: &ManeuverEvent) -> f64 {
        let mid = normalize_deg(ev.before_bearing + ev.bearing_change / 2.0);
        let flipped = normalize_deg(mid + 180.0);
        match self.initial_wind_deg {
            Some(w) => {
                // Take whichever bisector sits closer to the assumed wind
                if angle_difference(mid, w).abs() <= angle_difference(flipped, w).abs() {
                    mid
                } else {
                    flipped
                }
            }
            None => match ev.maneuver_type {
                ManeuverType::Jibe => flipped,
                _ => mid,
            },
        }
    }

    /// Wind speed from boat speed in ±speed_window_s around one maneuver.
    fn event_wind_speed(
        ev: &ManeuverEvent,
        track: &[TrackPoint],
        cfg: &EstimatorConfig,
    ) -> Option<f64> {
        let w = cfg.speed_window_s;
        let speeds: Vec<f64> = track
            .iter()
            .filter(|p| (p.t - ev.t).abs() <= w)
            .map(|p| p.speed_mps)
            .collect();
        if speeds.is_empty() {
            return None;
        }
        let mean_mps = speeds.iter().sum::<f64>() / speeds.len() as f64;
        let ratio = match ev.maneuver_type {
            ManeuverType::Jibe => cfg.polar.downwind,
            _ => cfg.polar.upwind,
        };
        Some(mean_mps * MPS_TO_KNOTS / ratio)
    }
}

impl Estimator for ManeuverBasedEstimator {
    fn method(&self) -> EstimateMethod {
        EstimateMethod::ManeuverBased
    }

    fn estimate(&self, track: &[TrackPoint], cfg: &EstimatorConfig) -> Option<WindEstimate> {
        let last_t = track.last()?.t;
        let assumed = self.initial_wind_deg.unwrap_or(0.0);

        let detector = ManeuverDetector::new(cfg.clone());
        let (events, rejected) = detector.filter_by_duration(detector.detect(track, assumed));
        if !rejected.is_empty() {
            debug!(rejected = rejected.len(), "maneuvers outside duration band ignored");
        }

        // Only wind-crossing maneuvers carry direction information
        let crossings: Vec<&ManeuverEvent> = events
            .iter()
            .filter(|e| matches!(e.maneuver_type, ManeuverType::Tack | ManeuverType::Jibe))
            .collect();
        if crossings.len() < 2 {
            return None;
        }

        // Direction: recency- and confidence-weighted circular mean
        let n = crossings.len();
        let directions: Vec<f64> = crossings.iter().map(|e| self.event_wind(e)).collect();
        let weights: Vec<f64> = crossings
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let ramp = if n == 1 {
                    RECENCY_RAMP.1
                } else {
                    RECENCY_RAMP.0
                        + (RECENCY_RAMP.1 - RECENCY_RAMP.0) * i as f64 / (n - 1) as f64
                };
                e.confidence * ramp
            })
            .collect();
        let direction = circular_mean(&directions, &weights);

        // Speed: median over per-maneuver backouts
        let speeds: Vec<f64> = crossings
            .iter()
            .filter_map(|e| Self::event_wind_speed(e, track, cfg))
            .collect();
        let speed_kts = if speeds.is_empty() { 0.0 } else { median(&speeds) };

        let confidence = (crossings.iter().map(|e| e.confidence).sum::<f64>() / n as f64)
            .clamp(0.0, 1.0);

        Some(WindEstimate {
            direction_deg: direction,
            speed_kts,
            confidence,
            method: EstimateMethod::ManeuverBased,
            t: last_t,
        })
    }
}
