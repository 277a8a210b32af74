//! Simulation configuration surface
//!
//! An owned configuration value passed by reference into the components
//! that need it. Changes go through explicit apply steps on the simulation
//! that validate before mutating; there is no ambient shared state.

use super::movements::TurnSplits;
use super::signal::{ControlMode, PhaseTopology, SignalTiming};
use super::types::Approach;
use super::vehicle_types::VehicleMix;

/// Which side of the road traffic drives on. Passed through to renderers;
/// not used algorithmically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePolicy {
    DriveOnRight,
    DriveOnLeft,
}

/// Canvas and road geometry in world units (pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub road_width: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            canvas_width: 600.0,
            canvas_height: 600.0,
            road_width: 120.0,
        }
    }
}

impl Geometry {
    pub fn center_x(&self) -> f32 {
        self.canvas_width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.canvas_height / 2.0
    }

    /// Width of one lane given the number of lanes per direction
    pub fn lane_width(&self, num_lanes: usize) -> f32 {
        self.road_width / (2.0 * num_lanes as f32)
    }

    /// Distance from the intersection center to each stop line
    pub fn stop_line_offset(&self) -> f32 {
        self.road_width / 2.0 + 5.0
    }
}

/// Named traffic-intensity presets mapped to (N/S, E/W) hourly volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficPreset {
    Light,
    Balanced,
    NsHeavy,
    EwHeavy,
    RushHour,
}

impl TrafficPreset {
    /// (ns_vph, ew_vph) arrival-rate pair
    pub fn volumes(&self) -> (f64, f64) {
        match self {
            TrafficPreset::Light => (200.0, 200.0),
            TrafficPreset::Balanced => (500.0, 500.0),
            TrafficPreset::NsHeavy => (900.0, 200.0),
            TrafficPreset::EwHeavy => (200.0, 900.0),
            TrafficPreset::RushHour => (900.0, 900.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrafficPreset::Light => "Light Traffic",
            TrafficPreset::Balanced => "Balanced Traffic",
            TrafficPreset::NsHeavy => "N/S Heavy",
            TrafficPreset::EwHeavy => "E/W Heavy",
            TrafficPreset::RushHour => "Rush Hour",
        }
    }
}

/// Complete configuration for one simulation run
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub geometry: Geometry,
    pub lane_policy: LanePolicy,
    /// Lanes per direction of travel
    pub num_lanes: usize,
    /// Free-flow speed in world units per second, before type and
    /// environment multipliers
    pub base_speed: f32,
    /// Acceleration limit in world units per second squared
    pub accel: f32,
    /// Deceleration limit in world units per second squared
    pub decel: f32,
    /// Hard cap on concurrently simulated vehicles
    pub max_vehicles: usize,
    pub timing: SignalTiming,
    pub mode: ControlMode,
    pub topology: PhaseTopology,
    /// Hourly volumes per approach, indexed by [`Approach::index`]
    pub volumes: [f64; 4],
    pub turn_splits: TurnSplits,
    pub vehicle_mix: VehicleMix,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            lane_policy: LanePolicy::DriveOnRight,
            num_lanes: 2,
            base_speed: 120.0,
            accel: 180.0,
            decel: 240.0,
            max_vehicles: 50,
            timing: SignalTiming::default(),
            mode: ControlMode::Pretimed,
            topology: PhaseTopology::Simple,
            volumes: [800.0; 4],
            turn_splits: TurnSplits::default(),
            vehicle_mix: VehicleMix::default(),
        }
    }
}

impl SimConfig {
    pub fn volume(&self, approach: Approach) -> f64 {
        self.volumes[approach.index()]
    }

    pub fn set_volume(&mut self, approach: Approach, vph: f64) {
        self.volumes[approach.index()] = vph;
    }

    /// Overwrite per-approach volumes from a named preset
    pub fn apply_preset(&mut self, preset: TrafficPreset) {
        let (ns, ew) = preset.volumes();
        self.volumes[Approach::North.index()] = ns;
        self.volumes[Approach::South.index()] = ns;
        self.volumes[Approach::East.index()] = ew;
        self.volumes[Approach::West.index()] = ew;
    }
}
