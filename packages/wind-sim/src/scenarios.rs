//! scenarios.rs — Named simulation presets
//!
//! Each preset exercises a specific part of the estimation pipeline: clean
//! beats for maneuver geometry, downwind legs for jibe classification, a
//! veering breeze for the drift model, light air for graceful degradation,
//! and a mixed fleet for reliability weighting.

use serde::{Deserialize, Serialize};
use tracing::warn;
use wind_engine::BoatType;

use crate::track_gen::TrackGenConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub n_boats: usize,
    pub wind_direction_deg: f64,
    pub wind_speed_kts: f64,
    pub wind_veer_deg_per_min: f64,
    pub duration_s: f64,
    /// Seconds sailed per windward/leeward leg
    pub leg_duration_s: f64,
    /// Nominal seconds between tacks/jibes
    pub maneuver_interval_s: f64,
    pub course_noise_deg: f64,
    pub speed_noise_frac: f64,
    /// Per-boat (type, skill) profiles; cycled when shorter than n_boats
    pub boats: Vec<BoatSpec>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoatSpec {
    pub boat_type: BoatType,
    pub skill_level: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "steady_beat".into(),
            n_boats: 4,
            wind_direction_deg: 210.0,
            wind_speed_kts: 12.0,
            wind_veer_deg_per_min: 0.0,
            duration_s: 1800.0,
            leg_duration_s: 400.0,
            maneuver_interval_s: 90.0,
            course_noise_deg: 2.0,
            speed_noise_frac: 0.05,
            boats: vec![BoatSpec { boat_type: BoatType::SportKeelboat, skill_level: 0.6 }],
        }
    }
}

impl ScenarioConfig {
    /// Per-boat spec, cycling the configured list.
    pub fn boat_spec(&self, boat_index: usize) -> BoatSpec {
        self.boats[boat_index % self.boats.len()]
    }

    /// Track-generator config for one boat, offset slightly so the fleet
    /// spreads across the course area.
    pub fn track_cfg(&self, boat_index: usize) -> TrackGenConfig {
        let spec = self.boat_spec(boat_index);
        TrackGenConfig {
            wind_direction_deg: self.wind_direction_deg,
            wind_speed_kts: self.wind_speed_kts,
            wind_veer_deg_per_min: self.wind_veer_deg_per_min,
            duration_s: self.duration_s,
            leg_duration_s: self.leg_duration_s,
            maneuver_interval_s: self.maneuver_interval_s,
            // Lower skill sails a noisier track
            course_noise_deg: self.course_noise_deg * (1.5 - spec.skill_level * 0.8),
            speed_noise_frac: self.speed_noise_frac,
            start_lat: 60.10 + (boat_index as f64 % 4.0) * 0.005,
            start_lon: 24.95 + (boat_index as f64 / 4.0).floor() * 0.005,
            upwind_twa_deg: spec.boat_type.optimal_upwind_angle(),
            downwind_twa_deg: spec.boat_type.optimal_downwind_angle(),
            ..TrackGenConfig::default()
        }
    }
}

/// Preset by name; unknown names fall back to the default with a warning.
pub fn preset(name: &str) -> ScenarioConfig {
    match name {
        "steady_beat" => ScenarioConfig::default(),
        "downwind_run" => preset_downwind_run(),
        "shifting_breeze" => preset_shifting_breeze(),
        "light_air" => preset_light_air(),
        "mixed_fleet" => preset_mixed_fleet(),
        other => {
            warn!("unknown scenario preset '{other}', using steady_beat");
            ScenarioConfig::default()
        }
    }
}

/// Long leeward legs with jibes: exercises jibe classification and the
/// downwind polar backout.
pub fn preset_downwind_run() -> ScenarioConfig {
    ScenarioConfig {
        name: "downwind_run".into(),
        leg_duration_s: 700.0,
        maneuver_interval_s: 120.0,
        ..ScenarioConfig::default()
    }
}

/// Breeze veering 1.5°/min: the drift model should track it and the field
/// should project samples forward without penalizing boats for the shift.
pub fn preset_shifting_breeze() -> ScenarioConfig {
    ScenarioConfig {
        name: "shifting_breeze".into(),
        wind_veer_deg_per_min: 1.5,
        ..ScenarioConfig::default()
    }
}

/// 2 knots of wind: boat speeds fall below the valid-point floor and the
/// pipeline must degrade to insufficient-data records, not errors.
pub fn preset_light_air() -> ScenarioConfig {
    ScenarioConfig {
        name: "light_air".into(),
        wind_speed_kts: 2.0,
        course_noise_deg: 6.0,
        ..ScenarioConfig::default()
    }
}

/// Mixed hulls and crews: reliability weighting should favor the steady
/// keelboats over the noisy novice cruiser.
pub fn preset_mixed_fleet() -> ScenarioConfig {
    ScenarioConfig {
        name: "mixed_fleet".into(),
        n_boats: 6,
        boats: vec![
            BoatSpec { boat_type: BoatType::SportKeelboat, skill_level: 0.9 },
            BoatSpec { boat_type: BoatType::SportKeelboat, skill_level: 0.6 },
            BoatSpec { boat_type: BoatType::Dinghy, skill_level: 0.7 },
            BoatSpec { boat_type: BoatType::Cruiser, skill_level: 0.3 },
        ],
        ..ScenarioConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(preset("downwind_run").name, "downwind_run");
        assert_eq!(preset("mixed_fleet").n_boats, 6);
        // unknown falls back
        assert_eq!(preset("no_such_preset").name, "steady_beat");
    }

    #[test]
    fn boat_specs_cycle() {
        let sc = preset_mixed_fleet();
        assert_eq!(sc.boat_spec(0).skill_level, sc.boat_spec(4).skill_level);
    }

    #[test]
    fn skill_scales_course_noise() {
        let sc = preset_mixed_fleet();
        let expert = sc.track_cfg(0); // skill 0.9
        let novice = sc.track_cfg(3); // skill 0.3
        assert!(novice.course_noise_deg > expert.course_noise_deg);
    }
}
