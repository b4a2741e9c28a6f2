//! End-to-end pipeline scenarios: synthetic fleet tracks through single-boat
//! estimation, fleet fusion, and field interpolation.

use wind_engine::angles::{angle_difference, normalize_deg};
use wind_engine::{
    BoatObservation, BoatProfile, BoatReliabilityScorer, BoatType, EstimatorConfig,
    FieldConfig, FusionConfig, ManeuverDetector, MultiBoatFusionEngine, ReliabilityConfig,
    SingleBoatWindEstimator, SpatiotemporalFieldEstimator,
};
use wind_types::{EstimateMethod, ManeuverType, TrackPoint};

/// Deterministic windward beat under a given wind: legs at wind ± 45° with
/// dipped 8-sample transitions, 1 Hz, steady 2.6 m/s legs.
fn beat_track(wind_deg: f64, n_legs: usize, leg_len: usize, lat0: f64, lon0: f64) -> Vec<TrackPoint> {
    let mut pts = Vec::new();
    let mut t = 0.0;
    let mut board = 1.0;
    for leg in 0..n_legs {
        let course = normalize_deg(wind_deg + board * 45.0);
        for _ in 0..leg_len {
            pts.push(TrackPoint {
                t,
                lat: lat0 + t * 2e-6,
                lon: lon0 + t * 1e-6,
                speed_mps: 2.6,
                course_deg: course,
            });
            t += 1.0;
        }
        if leg + 1 < n_legs {
            let next = normalize_deg(wind_deg - board * 45.0);
            let step = angle_difference(next, course) / 8.0;
            for k in 1..=8 {
                pts.push(TrackPoint {
                    t,
                    lat: lat0 + t * 2e-6,
                    lon: lon0 + t * 1e-6,
                    speed_mps: 1.5,
                    course_deg: normalize_deg(course + step * k as f64),
                });
                t += 1.0;
            }
            board = -board;
        }
    }
    pts
}

fn estimator_cfg() -> EstimatorConfig {
    EstimatorConfig { min_tack_angle_change: 30.0, ..EstimatorConfig::default() }
}

#[test]
fn beating_boat_recovers_wind_direction_across_north() {
    // Wind from 350°: legs at 35° and 305°, estimates must wrap cleanly
    let track = beat_track(350.0, 4, 60, 60.10, 24.95);
    let est = SingleBoatWindEstimator::new(estimator_cfg());
    let e = est.estimate(&track).unwrap();
    let err = angle_difference(e.direction_deg, 350.0).abs();
    assert!(err < 25.0, "estimated {:.1}°, true 350°", e.direction_deg);
    assert!(e.confidence > 0.0 && e.confidence <= 0.95);
    assert!(e.speed_kts > 0.0);
}

#[test]
fn detected_maneuvers_on_a_beat_are_tacks() {
    let track = beat_track(0.0, 4, 60, 60.10, 24.95);
    let det = ManeuverDetector::new(estimator_cfg());
    let (kept, _) = det.filter_by_duration(det.detect(&track, 0.0));
    assert_eq!(kept.len(), 3, "four legs means three crossings");
    for ev in &kept {
        assert_eq!(ev.maneuver_type, ManeuverType::Tack);
        assert!(ev.confidence > 0.0);
    }
}

#[test]
fn fleet_pipeline_fuses_and_interpolates() {
    let wind = 45.0;
    let est = SingleBoatWindEstimator::new(estimator_cfg());

    // Three boats on the same breeze at different corners of the course
    let positions = [(60.10, 24.95), (60.12, 24.95), (60.10, 24.98)];
    let mut fusion = MultiBoatFusionEngine::new(
        FusionConfig::default(),
        BoatReliabilityScorer::new(ReliabilityConfig::default()),
    );
    for (i, _) in positions.iter().enumerate() {
        fusion.set_profile(
            i as u32,
            BoatProfile { boat_type: BoatType::SportKeelboat, skill_level: 0.7 },
        );
    }

    let mut observations = Vec::new();
    let mut t_end = 0.0;
    for (i, (lat, lon)) in positions.iter().enumerate() {
        let track = beat_track(wind, 4, 60, *lat, *lon);
        let e = est.estimate(&track).unwrap();
        assert_ne!(e.method, EstimateMethod::InsufficientData);
        let last = track.last().unwrap();
        t_end = last.t;
        observations.push(BoatObservation {
            boat_id: i as u32,
            estimate: e,
            lat: Some(last.lat),
            lon: Some(last.lon),
        });
    }

    let fused = fusion.fuse(&observations, t_end).expect("fusion result");
    assert_eq!(fused.boat_count, 3);
    assert!(
        angle_difference(fused.wind_direction_deg, wind).abs() < 25.0,
        "fused {:.1}°, true {wind}°",
        fused.wind_direction_deg
    );
    assert!(fused.confidence > 0.0 && fused.confidence <= 0.95);
    assert!(fused.lat.is_some() && fused.lon.is_some());

    // Field from the run's fleet history
    let history: Vec<_> = fusion.fleet_history().iter().copied().collect();
    let field = SpatiotemporalFieldEstimator::new(FieldConfig::default());
    let grid = field
        .field_at(&history, fusion.drift_model(), t_end)
        .expect("wind field");
    assert_eq!(grid.direction_deg.len(), grid.rows * grid.cols);
    for i in 0..grid.direction_deg.len() {
        assert!(
            angle_difference(grid.direction_deg[i], fused.wind_direction_deg).abs() < 1.0,
            "single-sample field must carry the fused value everywhere"
        );
        assert!((0.1..=1.0).contains(&grid.confidence[i]));
    }
}

#[test]
fn drifting_fleet_never_errors() {
    // All boats below the speed floor: insufficient data end to end
    let track: Vec<TrackPoint> = (0..120)
        .map(|i| TrackPoint {
            t: i as f64,
            lat: 60.10,
            lon: 24.95,
            speed_mps: 0.4,
            course_deg: (i * 3) as f64 % 360.0,
        })
        .collect();
    let est = SingleBoatWindEstimator::new(estimator_cfg());
    let e = est.estimate(&track).unwrap();
    assert_eq!(e.method, EstimateMethod::InsufficientData);
    assert_eq!(e.confidence, 0.0);

    // And an empty observation set fuses to nothing, not an error
    let mut fusion = MultiBoatFusionEngine::new(
        FusionConfig::default(),
        BoatReliabilityScorer::new(ReliabilityConfig::default()),
    );
    assert!(fusion.fuse(&[], 0.0).is_none());
}
