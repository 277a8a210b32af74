//! Headless intersection simulation core
//!
//! Everything here runs without any rendering dependency. The external
//! driver owns the tick loop; the simulation exposes its live vehicle
//! collection and a metrics snapshot for display.

mod arrivals;
mod config;
mod environment;
mod metrics;
mod movements;
mod signal;
mod types;
mod vehicle;
mod vehicle_types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use arrivals::ArrivalStream;
#[allow(unused_imports)]
pub use config::{Geometry, LanePolicy, SimConfig, TrafficPreset};
#[allow(unused_imports)]
pub use environment::{EnvironmentState, Weather};
#[allow(unused_imports)]
pub use metrics::{level_of_service, ApproachMetrics, MeasurementWindow, MetricsCollector};
#[allow(unused_imports)]
pub use movements::{pick_movement, TurnSplit, TurnSplits};
#[allow(unused_imports)]
pub use signal::{
    ControlMode, Phase, PhaseState, PhaseTopology, SignalController, SignalTiming,
};
#[allow(unused_imports)]
pub use types::{Approach, Axis, Movement, VehicleId};
#[allow(unused_imports)]
pub use vehicle::{initial_lane, LaneNeighbor, Vehicle, LANE_CHANGE_COOLDOWN};
#[allow(unused_imports)]
pub use vehicle_types::{VehicleClass, VehicleMix, VehicleType, VehicleTypeRegistry};
pub use world::Simulation;
