//! Main simulation world that ties everything together
//!
//! Owns the vehicle collection, the signal controller, the per-approach
//! arrival streams, and the metrics collector, all advanced by a single
//! externally driven `tick`. The per-tick order is fixed: arrivals, then
//! environment, then signal update, then vehicle updates, then off-screen
//! removal and metrics sampling.

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::arrivals::ArrivalStream;
use super::config::{SimConfig, TrafficPreset};
use super::environment::EnvironmentState;
use super::metrics::MetricsCollector;
use super::movements::{pick_movement, TurnSplits};
use super::signal::{ControlMode, SignalController, SignalTiming};
use super::types::{Approach, VehicleId};
use super::vehicle::{LaneNeighbor, Vehicle};
use super::vehicle_types::{VehicleMix, VehicleTypeRegistry};

/// The simulation world for one signalized intersection
pub struct Simulation {
    /// Active configuration; mutate through the `apply_*` methods so
    /// changes are validated before they take effect
    pub config: SimConfig,
    pub controller: SignalController,
    pub environment: EnvironmentState,
    /// Live vehicle collection, exposed for external rendering
    pub vehicles: Vec<Vehicle>,
    pub metrics: MetricsCollector,
    /// Simulation clock in seconds
    pub time: f64,
    streams: [ArrivalStream; 4],
    registry: VehicleTypeRegistry,
    next_id: usize,
    rng: StdRng,
}

impl Simulation {
    fn new_internal(config: SimConfig, mut rng: StdRng) -> Self {
        let controller = SignalController::new(config.topology, config.mode, config.timing);
        let mut registry = VehicleTypeRegistry::new();
        registry.apply_mix(&config.vehicle_mix);
        let mut streams = Approach::ALL
            .map(|approach| ArrivalStream::new(approach, config.volume(approach)));
        for stream in &mut streams {
            stream.schedule(0.0, &mut rng);
        }
        Self {
            config,
            controller,
            environment: EnvironmentState::new(),
            vehicles: Vec::new(),
            metrics: MetricsCollector::new(),
            time: 0.0,
            streams,
            registry,
            next_id: 0,
            rng,
        }
    }

    pub fn new(config: SimConfig) -> Self {
        Self::new_internal(config, StdRng::from_os_rng())
    }

    /// Create a simulation with a seeded RNG for reproducible runs
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Self {
        Self::new_internal(config, StdRng::seed_from_u64(seed))
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Advance the whole simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        let dt64 = dt as f64;
        self.time += dt64;

        // Arrivals. Vehicles spawned here are appended after `existing`
        // and join the flow on the next tick.
        let existing = self.vehicles.len();
        for index in 0..self.streams.len() {
            if !self.streams[index].try_generate(self.time, &mut self.rng) {
                continue;
            }
            let approach = self.streams[index].approach;
            if self.vehicles.len() >= self.config.max_vehicles {
                debug!("vehicle cap reached, dropping arrival on {}", approach);
                continue;
            }
            let movement =
                pick_movement(approach, Some(&self.config.turn_splits), &mut self.rng);
            let vtype = *self.registry.pick(&mut self.rng);
            let id = self.next_vehicle_id();
            let vehicle = Vehicle::new(id, approach, movement, &vtype, &self.config, &mut self.rng);
            self.metrics.record_arrival(approach);
            self.vehicles.push(vehicle);
        }

        self.environment.update(dt);

        // Feed the controller detector state derived from current queues
        let queues = MetricsCollector::queue_counts(&self.vehicles);
        let ns = queues[Approach::North.index()] + queues[Approach::South.index()];
        let ew = queues[Approach::East.index()] + queues[Approach::West.index()];
        self.controller.set_detector_demand(ns > 0, ew > 0);
        self.controller.set_detector_counts(ns, ew);
        self.controller.update(dt);

        // Vehicle updates against a pre-update snapshot of lane occupancy
        let snapshot: Vec<LaneNeighbor> =
            self.vehicles.iter().map(Vehicle::as_neighbor).collect();
        for vehicle in &mut self.vehicles[..existing] {
            vehicle.update(
                dt,
                &snapshot,
                &self.controller,
                &self.environment,
                &self.config,
                &mut self.rng,
            );
        }

        // Remove vehicles that have left the simulated region
        let mut index = 0;
        while index < self.vehicles.len() {
            if self.vehicles[index].is_offscreen(&self.config) {
                let vehicle = self.vehicles.swap_remove(index);
                if vehicle.passed_intersection {
                    self.metrics.record_exit(vehicle.approach, vehicle.wait_time);
                }
            } else {
                index += 1;
            }
        }

        let window_done = self.metrics.advance(dt64);
        self.metrics.sample(dt64, &self.vehicles);
        if window_done {
            self.metrics.finalize();
            info!(
                "measurement window complete: {} vehicles, overall LOS {}",
                self.metrics.total_vehicles, self.metrics.overall_los
            );
        }
    }

    /// Validate and commit a new turn-split table. An invalid table is
    /// refused with the offending approach named and the running
    /// configuration is left untouched.
    pub fn apply_turn_splits(&mut self, splits: TurnSplits) -> Result<()> {
        splits.validate()?;
        self.config.turn_splits = splits;
        Ok(())
    }

    /// Merge new signal timing into the running controller
    pub fn reconfigure_signals(&mut self, timing: SignalTiming) {
        self.config.timing = timing;
        self.controller.reconfigure(timing);
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        self.config.mode = mode;
        self.controller.set_mode(mode);
    }

    /// Rewrite the vehicle mix weights. The percentages are applied as
    /// given; selection stays proportional to weight either way.
    pub fn apply_vehicle_mix(&mut self, mix: VehicleMix) {
        self.config.vehicle_mix = mix;
        self.registry.apply_mix(&mix);
    }

    /// Change one approach's hourly volume at runtime
    pub fn set_volume(&mut self, approach: Approach, vph: f64) {
        self.config.set_volume(approach, vph);
        self.streams[approach.index()].update_rate(vph, self.time, &mut self.rng);
    }

    /// Apply a named traffic-intensity preset to all four approaches
    pub fn apply_preset(&mut self, preset: TrafficPreset) {
        self.config.apply_preset(preset);
        for approach in Approach::ALL {
            let vph = self.config.volume(approach);
            self.streams[approach.index()].update_rate(vph, self.time, &mut self.rng);
        }
        info!("traffic preset applied: {}", preset.name());
    }

    /// Begin a fixed-duration measurement window, clearing prior metrics
    pub fn start_measurement(&mut self, duration: f64) {
        self.metrics.start_window(duration);
    }

    /// Clear all vehicles and metrics and restart the clock. Configuration
    /// is preserved.
    pub fn reset(&mut self) {
        self.vehicles.clear();
        self.metrics = MetricsCollector::new();
        self.time = 0.0;
        self.next_id = 0;
        self.controller =
            SignalController::new(self.config.topology, self.config.mode, self.config.timing);
        self.streams = Approach::ALL
            .map(|approach| ArrivalStream::new(approach, self.config.volume(approach)));
        for stream in &mut self.streams {
            stream.schedule(0.0, &mut self.rng);
        }
    }

    /// Print a summary of the current state and metrics
    pub fn print_summary(&mut self) {
        self.metrics.finalize();
        println!("=== Intersection Simulation Summary ===");
        println!("Time: {:.1}s", self.time);
        println!("Signal: {}", self.controller.phase_label());
        println!("Active vehicles: {}", self.vehicles.len());
        println!("Vehicles completed: {}", self.metrics.total_vehicles);
        println!();
        println!("--- Per Approach ---");
        println!(
            "{:<8} {:>8} {:>12} {:>10} {:>5}",
            "", "volume", "avg delay", "max queue", "LOS"
        );
        for approach in Approach::ALL {
            let metrics = self.metrics.approach(approach);
            println!(
                "{:<8} {:>8} {:>11.1}s {:>10} {:>5}",
                approach.title(),
                metrics.volume,
                metrics.avg_delay,
                metrics.max_queue,
                metrics.los
            );
        }
        println!();
        println!(
            "Overall: avg delay {:.1}s, LOS {}, max queue {}",
            self.metrics.overall_avg_delay, self.metrics.overall_los, self.metrics.max_queue
        );
    }
}
