//! maneuver.rs — Direction-change detection and tack/jibe classification
//!
//! Finds maneuver events in a single boat's track relative to an assumed
//! wind direction. The pipeline:
//!   1. Per-sample course deltas, summed over a centered window to get a
//!      smoothed course-change signal (suppresses GPS course jitter while
//!      keeping genuine turns sharp)
//!   2. Samples whose windowed change exceeds `min_tack_angle_change` become
//!      candidates; contiguous candidate runs merge into one event centered
//!      on the point of maximum change
//!   3. Bearing and speed are averaged over a window on each side of the
//!      event, and the event is classified against the wind
//!
//! Classification needs both geometry and the speed profile: a tack and a
//! jibe can be pure rotations of each other in course-over-ground terms, so
//! when both legs sit near the wind axis the tie is broken by the speed
//! signature (a tack luffs through the wind and recovers; a jibe moves the
//! boat between legs with lastingly different target speeds).

use tracing::debug;
use wind_types::{ManeuverEvent, ManeuverType, PointOfSail, TrackPoint};

use crate::angles::{angle_difference, circular_mean_unweighted};
use crate::config::EstimatorConfig;

/// Both legs within this of the wind axis counts as a wind-source crossing.
const NEAR_UPWIND_DEG: f64 = 60.0;
/// Speed-ratio band treated as "no sustained speed change".
const SPEED_RATIO_BAND: (f64, f64) = (0.9, 1.3);
/// Mid-maneuver speed below this fraction of the slower leg is a luff dip.
const DIP_FRACTION: f64 = 0.85;

pub struct ManeuverDetector {
    cfg: EstimatorConfig,
}

impl ManeuverDetector {
    pub fn new(cfg: EstimatorConfig) -> Self {
        Self { cfg }
    }

    /// Point of sail for a course relative to the wind (direction FROM).
    pub fn point_of_sail(&self, course_deg: f64, wind_deg: f64) -> PointOfSail {
        point_of_sail(course_deg, wind_deg, &self.cfg)
    }

    /// Detect and classify all maneuver events in a track.
    ///
    /// Returns every merged event, including those outside the plausible
    /// duration band; callers filter with [`ManeuverDetector::filter_by_duration`]
    /// so short glitches are visible rather than silently dropped.
    pub fn detect(&self, track: &[TrackPoint], wind_deg: f64) -> Vec<ManeuverEvent> {
        let n = track.len();
        if n < self.cfg.smoothing_window + 2 {
            return Vec::new();
        }

        // Per-sample signed course deltas
        let diffs: Vec<f64> = track
            .windows(2)
            .map(|w| angle_difference(w[1].course_deg, w[0].course_deg))
            .collect();

        // Windowed course change centered on each sample
        let half = self.cfg.smoothing_window / 2;
        let windowed: Vec<f64> = (0..n)
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(diffs.len());
                diffs[lo..hi].iter().sum()
            })
            .collect();

        // Candidate flags → contiguous runs
        let flagged: Vec<bool> = windowed
            .iter()
            .map(|w| w.abs() >= self.cfg.min_tack_angle_change)
            .collect();

        let mut events = Vec::new();
        let mut i = 0;
        while i < n {
            if !flagged[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < n && flagged[i] {
                i += 1;
            }
            let end = i - 1; // inclusive

            if let Some(ev) = self.build_event(track, &windowed, start, end, wind_deg) {
                events.push(ev);
            }
        }

        debug!(
            events = events.len(),
            wind_deg, "maneuver detection complete"
        );
        events
    }

    /// Partition events into (plausible, rejected) by duration band.
    pub fn filter_by_duration(
        &self,
        events: Vec<ManeuverEvent>,
    ) -> (Vec<ManeuverEvent>, Vec<ManeuverEvent>) {
        events.into_iter().partition(|e| {
            e.duration_s >= self.cfg.min_maneuver_duration_s
                && e.duration_s <= self.cfg.max_maneuver_duration_s
        })
    }

    fn build_event(
        &self,
        track: &[TrackPoint],
        windowed: &[f64],
        start: usize,
        end: usize,
        wind_deg: f64,
    ) -> Option<ManeuverEvent> {
        // Event center = point of maximum windowed change
        let center = (start..=end)
            .max_by(|&a, &b| windowed[a].abs().partial_cmp(&windowed[b].abs()).unwrap())
            .unwrap_or(start);

        let t_start = track[start].t;
        let t_end = track[end].t;
        let w = self.cfg.event_window_s;

        // Steady-leg samples on each side of the event
        let before: Vec<&TrackPoint> = track
            .iter()
            .filter(|p| p.t >= t_start - w && p.t < t_start)
            .collect();
        let after: Vec<&TrackPoint> = track
            .iter()
            .filter(|p| p.t > t_end && p.t <= t_end + w)
            .collect();
        if before.is_empty() || after.is_empty() {
            return None; // event touches the track edge
        }

        let before_bearing =
            circular_mean_unweighted(&before.iter().map(|p| p.course_deg).collect::<Vec<_>>());
        let after_bearing =
            circular_mean_unweighted(&after.iter().map(|p| p.course_deg).collect::<Vec<_>>());
        let speed_before =
            before.iter().map(|p| p.speed_mps).sum::<f64>() / before.len() as f64;
        let speed_after = after.iter().map(|p| p.speed_mps).sum::<f64>() / after.len() as f64;
        let min_during = track[start..=end]
            .iter()
            .map(|p| p.speed_mps)
            .fold(f64::INFINITY, f64::min);

        let (maneuver_type, before_state, after_state, confidence) = categorize_maneuver(
            before_bearing,
            after_bearing,
            speed_before,
            speed_after,
            min_during,
            wind_deg,
            &self.cfg,
        );

        let c = &track[center];
        Some(ManeuverEvent {
            t: c.t,
            lat: c.lat,
            lon: c.lon,
            before_bearing,
            after_bearing,
            bearing_change: angle_difference(after_bearing, before_bearing),
            speed_before,
            speed_after,
            speed_ratio: if speed_before > 0.0 {
                speed_after / speed_before
            } else {
                1.0
            },
            duration_s: t_end - t_start,
            maneuver_type,
            before_state,
            after_state,
            confidence,
        })
    }
}

/// Point of sail from a course and the wind direction (FROM convention).
pub fn point_of_sail(course_deg: f64, wind_deg: f64, cfg: &EstimatorConfig) -> PointOfSail {
    let rel = angle_difference(course_deg, wind_deg).abs();
    if rel <= cfg.upwind_threshold {
        PointOfSail::Upwind
    } else if rel >= cfg.downwind_threshold {
        PointOfSail::Downwind
    } else {
        PointOfSail::Reaching
    }
}

/// Classify a course change between two steady legs against the wind.
///
/// Time-reversal symmetric by construction: swapping the legs (and the
/// implied speed-ratio inversion) maps tack→tack, jibe→jibe, and swaps
/// bear-away↔head-up.
pub fn categorize_maneuver(
    before_bearing: f64,
    after_bearing: f64,
    speed_before: f64,
    speed_after: f64,
    min_speed_during: f64,
    wind_deg: f64,
    cfg: &EstimatorConfig,
) -> (ManeuverType, PointOfSail, PointOfSail, f64) {
    let before_state = point_of_sail(before_bearing, wind_deg, cfg);
    let after_state = point_of_sail(after_bearing, wind_deg, cfg);

    let change = angle_difference(after_bearing, before_bearing).abs();
    // Reversal confidence: peaks for a clean ~180° flip; floored at 0.1 for
    // any event that matches a known pattern
    let raw_confidence = 1.0 - ((change - 180.0).abs() / 90.0).min(1.0);

    if !(60.0..=180.0).contains(&change) {
        return (ManeuverType::Unknown, before_state, after_state, raw_confidence);
    }

    let rel_before = angle_difference(before_bearing, wind_deg).abs();
    let rel_after = angle_difference(after_bearing, wind_deg).abs();

    // Ratio symmetrized so the signature survives time reversal
    let ratio = if speed_before > 0.0 && speed_after > 0.0 {
        (speed_after / speed_before).max(speed_before / speed_after)
    } else {
        1.0
    };
    let sustained_change = ratio > SPEED_RATIO_BAND.1 || ratio < SPEED_RATIO_BAND.0;
    let slower_leg = speed_before.min(speed_after);
    let luff_dip = slower_leg > 0.0 && min_speed_during < DIP_FRACTION * slower_leg;

    let kind = if rel_before >= cfg.downwind_threshold && rel_after >= cfg.downwind_threshold {
        // Both legs deep downwind: the stern crossed the wind
        ManeuverType::Jibe
    } else if rel_before <= NEAR_UPWIND_DEG && rel_after <= NEAR_UPWIND_DEG {
        // Both legs near the wind axis: geometry alone is ambiguous
        if luff_dip && !sustained_change {
            // Symmetric dip-and-recover: head-to-wind crossing
            ManeuverType::Tack
        } else if sustained_change {
            // Lasting speed change across the crossing: leg targets differ
            ManeuverType::Jibe
        } else {
            ManeuverType::Unknown
        }
    } else if before_state == PointOfSail::Upwind && after_state == PointOfSail::Downwind {
        ManeuverType::BearAway
    } else if before_state == PointOfSail::Downwind && after_state == PointOfSail::Upwind {
        ManeuverType::HeadUp
    } else {
        ManeuverType::Unknown
    };

    let confidence = if kind == ManeuverType::Unknown {
        raw_confidence
    } else {
        raw_confidence.max(0.1)
    };
    (kind, before_state, after_state, confidence)
}
