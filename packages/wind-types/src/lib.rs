//! # wind-types
//!
//! Shared record structures for the SailWind estimation suite.
//!
//! These types are used by:
//! - `wind-engine`: the maneuver-detection / wind-estimation / fusion core
//! - `wind-sim`: the synthetic regatta track generator and batch driver
//! - external collaborators (ingestion, dashboard, persistence) that supply
//!   cleaned tracks and consume estimate records as JSON
//!
//! ## Conventions
//!
//! - Bearings and wind directions are degrees true, clockwise from north,
//!   normalized to [0, 360). Wind direction is the direction the wind blows
//!   FROM (meteorological convention).
//! - Timestamps are f64 Unix seconds. Tracks are strictly time-ordered.
//! - Boat speed over ground is m/s in tracks; estimated wind speed is knots.
//! - Confidence values are always inside [0, 1].

use serde::{Deserialize, Serialize};

/// Mean Earth radius, meters (WGS-84 sphere approximation)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// m/s → knots
pub const MPS_TO_KNOTS: f64 = 1.943_844;

// ── Track points ──────────────────────────────────────────────────────────────

/// One cleaned GPS fix handed to the engine by the ingestion collaborator.
/// Immutable once inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// Unix timestamp, seconds (strictly increasing within a track)
    pub t: f64,
    /// Latitude, degrees
    pub lat: f64,
    /// Longitude, degrees
    pub lon: f64,
    /// Speed over ground, m/s
    pub speed_mps: f64,
    /// Course over ground, degrees true [0, 360)
    pub course_deg: f64,
}

impl TrackPoint {
    /// Boat speed in knots
    pub fn speed_kts(&self) -> f64 {
        self.speed_mps * MPS_TO_KNOTS
    }

    /// Great-circle (haversine) distance to another fix, meters
    pub fn distance_m(&self, other: &TrackPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Initial great-circle bearing toward another fix, degrees [0, 360)
    pub fn bearing_to(&self, other: &TrackPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlon = (other.lon - self.lon).to_radians();
        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Fill `speed_mps` / `course_deg` from consecutive positions when the
/// ingestion source supplies positions only. The first point inherits the
/// second point's derived motion (there is no preceding fix to difference).
pub fn derive_motion(points: &mut [TrackPoint]) {
    if points.len() < 2 {
        return;
    }
    for i in 1..points.len() {
        let prev = points[i - 1];
        let dt = points[i].t - prev.t;
        if dt <= 0.0 {
            continue;
        }
        let dist = prev.distance_m(&points[i]);
        points[i].speed_mps = dist / dt;
        points[i].course_deg = prev.bearing_to(&points[i]);
    }
    points[0].speed_mps = points[1].speed_mps;
    points[0].course_deg = points[1].course_deg;
}

// ── Maneuvers ─────────────────────────────────────────────────────────────────

/// Point of sail relative to an assumed wind direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointOfSail {
    /// Close-hauled to close reach: |TWA| ≤ upwind threshold
    Upwind,
    /// Broad reach to run: |TWA| ≥ downwind threshold
    Downwind,
    /// Everything between
    Reaching,
}

/// Classified direction-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverType {
    /// Bow crosses the wind; both legs near upwind
    Tack,
    /// Stern crosses the wind; both legs near downwind
    Jibe,
    /// Upwind → downwind transition (not a wind crossing)
    BearAway,
    /// Downwind → upwind transition
    HeadUp,
    /// Large course change that matches no pattern
    Unknown,
}

/// One detected maneuver in a single boat's track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ManeuverEvent {
    /// Event center (point of maximum bearing change), Unix seconds
    pub t: f64,
    pub lat: f64,
    pub lon: f64,
    /// Mean bearing over the window before the event, degrees [0, 360)
    pub before_bearing: f64,
    /// Mean bearing over the window after the event, degrees [0, 360)
    pub after_bearing: f64,
    /// Signed shortest-path course change, degrees (−180, 180]
    pub bearing_change: f64,
    /// Mean speed before / after, m/s
    pub speed_before: f64,
    pub speed_after: f64,
    /// speed_after / speed_before (1.0 when speed_before is zero)
    pub speed_ratio: f64,
    /// Event duration, seconds
    pub duration_s: f64,
    pub maneuver_type: ManeuverType,
    pub before_state: PointOfSail,
    pub after_state: PointOfSail,
    /// Classifier confidence [0, 1]; peaks for a clean ~180° reversal
    pub confidence: f64,
}

// ── Wind estimates ────────────────────────────────────────────────────────────

/// Which algorithm produced a WindEstimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMethod {
    /// Tack/jibe geometry (wind bisects the maneuver)
    ManeuverBased,
    /// Upwind/downwind speed-ratio and pointing-angle balance
    CourseSpeedBalance,
    /// VMG-maximizing grid search
    VmgGridSearch,
    /// Bayesian combination of single-boat estimators
    Bayesian,
    /// Cross-boat fleet fusion
    Fleet,
    /// Not enough valid data; confidence is zero by construction
    InsufficientData,
}

/// One wind estimate: the engine's atomic output record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindEstimate {
    /// True wind direction (blowing FROM), degrees [0, 360)
    pub direction_deg: f64,
    /// True wind speed, knots
    pub speed_kts: f64,
    /// Estimate confidence [0, 1]
    pub confidence: f64,
    pub method: EstimateMethod,
    /// Estimate time, Unix seconds
    pub t: f64,
}

impl WindEstimate {
    /// Zero-confidence placeholder returned instead of failing on sparse
    /// input, so pipelines degrade gracefully.
    pub fn insufficient_data(t: f64) -> Self {
        Self {
            direction_deg: 0.0,
            speed_kts: 0.0,
            confidence: 0.0,
            method: EstimateMethod::InsufficientData,
            t,
        }
    }
}

// ── Fleet fusion output ───────────────────────────────────────────────────────

/// One fleet-level fused wind estimate at a time point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionResult {
    /// Fusion time, Unix seconds
    pub t: f64,
    /// Fused true wind direction, degrees [0, 360)
    pub wind_direction_deg: f64,
    /// Fused true wind speed, knots
    pub wind_speed_kts: f64,
    /// Combined confidence [0, 1]
    pub confidence: f64,
    /// Weighted circular std of contributing directions, degrees
    pub direction_std_deg: f64,
    /// Weighted std of contributing speeds, knots
    pub speed_std_kts: f64,
    /// Weighted mean position of contributing boats, if positions were given
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Number of boats that contributed
    pub boat_count: usize,
}

// ── Wind field grid ───────────────────────────────────────────────────────────

/// Gridded wind field at one time point. Row-major `rows × cols` arrays;
/// regenerated on demand, never persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindFieldGrid {
    pub rows: usize,
    pub cols: usize,
    /// Cell-center latitudes / longitudes (length rows × cols)
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Per-cell wind direction, degrees [0, 360)
    pub direction_deg: Vec<f64>,
    /// Per-cell wind speed, knots
    pub speed_kts: Vec<f64>,
    /// Per-cell confidence [0, 1]
    pub confidence: Vec<f64>,
    /// Field time, Unix seconds
    pub t: f64,
}

impl WindFieldGrid {
    /// Flat index for (row, col)
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // ~1 degree of latitude ≈ 111.2 km
        let a = TrackPoint { t: 0.0, lat: 60.0, lon: 25.0, speed_mps: 0.0, course_deg: 0.0 };
        let b = TrackPoint { t: 0.0, lat: 61.0, lon: 25.0, speed_mps: 0.0, course_deg: 0.0 };
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 300.0, "got {d}");
    }

    #[test]
    fn bearing_due_north_and_east() {
        let a = TrackPoint { t: 0.0, lat: 60.0, lon: 25.0, speed_mps: 0.0, course_deg: 0.0 };
        let n = TrackPoint { t: 0.0, lat: 60.1, lon: 25.0, speed_mps: 0.0, course_deg: 0.0 };
        let e = TrackPoint { t: 0.0, lat: 60.0, lon: 25.1, speed_mps: 0.0, course_deg: 0.0 };
        assert!(a.bearing_to(&n).abs() < 0.5);
        assert!((a.bearing_to(&e) - 90.0).abs() < 0.5);
    }

    #[test]
    fn derive_motion_fills_speed_and_course() {
        // Two fixes 111.2 km apart, 1000 s apart, due north
        let mut pts = vec![
            TrackPoint { t: 0.0, lat: 60.0, lon: 25.0, speed_mps: 0.0, course_deg: 0.0 },
            TrackPoint { t: 1000.0, lat: 61.0, lon: 25.0, speed_mps: 0.0, course_deg: 0.0 },
        ];
        derive_motion(&mut pts);
        assert!((pts[1].speed_mps - 111.2).abs() < 0.5);
        assert!(pts[1].course_deg.abs() < 0.5 || (pts[1].course_deg - 360.0).abs() < 0.5);
        // first point inherits
        assert_eq!(pts[0].speed_mps, pts[1].speed_mps);
    }
}
