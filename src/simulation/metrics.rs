//! Delay, queue, and level-of-service metrics

use super::types::Approach;
use super::vehicle::Vehicle;

/// Map average delay (seconds per vehicle) to an HCM-style level-of-service
/// grade. Monotone, boundary-inclusive on the lower end of each bucket.
pub fn level_of_service(delay: f64) -> char {
    if delay <= 10.0 {
        'A'
    } else if delay <= 20.0 {
        'B'
    } else if delay <= 35.0 {
        'C'
    } else if delay <= 55.0 {
        'D'
    } else if delay <= 80.0 {
        'E'
    } else {
        'F'
    }
}

/// Aggregated measurements for one approach
#[derive(Debug, Clone, Default)]
pub struct ApproachMetrics {
    /// Vehicles spawned on this approach
    pub volume: u32,
    /// Summed seconds of stopped time while approaching the intersection
    pub total_delay: f64,
    /// Largest instantaneous queue observed
    pub max_queue: u32,
    /// Per-vehicle wait times recorded as vehicles leave the region
    pub wait_times: Vec<f32>,
    /// Derived at finalization: total delay over volume
    pub avg_delay: f64,
    pub los: char,
}

impl ApproachMetrics {
    fn new() -> Self {
        Self {
            los: 'A',
            ..Self::default()
        }
    }

    /// Average delay per vehicle; defined as 0 when no vehicles were seen
    pub fn average_delay(&self) -> f64 {
        if self.volume == 0 {
            0.0
        } else {
            self.total_delay / self.volume as f64
        }
    }
}

/// The fixed-duration measurement window for a timed run
#[derive(Debug, Clone)]
pub struct MeasurementWindow {
    pub running: bool,
    pub duration: f64,
    pub elapsed: f64,
}

impl Default for MeasurementWindow {
    fn default() -> Self {
        Self {
            running: false,
            duration: 300.0,
            elapsed: 0.0,
        }
    }
}

/// Collects per-approach and overall metrics over a simulation run
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    approaches: [ApproachMetrics; 4],
    pub total_vehicles: u32,
    pub simulation_time: f64,
    pub window: MeasurementWindow,
    pub overall_avg_delay: f64,
    pub overall_los: char,
    pub max_queue: u32,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            approaches: [
                ApproachMetrics::new(),
                ApproachMetrics::new(),
                ApproachMetrics::new(),
                ApproachMetrics::new(),
            ],
            total_vehicles: 0,
            simulation_time: 0.0,
            window: MeasurementWindow::default(),
            overall_avg_delay: 0.0,
            overall_los: 'A',
            max_queue: 0,
        }
    }

    pub fn approach(&self, approach: Approach) -> &ApproachMetrics {
        &self.approaches[approach.index()]
    }

    /// Begin a fixed-duration measurement window, clearing prior data
    pub fn start_window(&mut self, duration: f64) {
        *self = Self::new();
        self.window.running = true;
        self.window.duration = duration;
    }

    /// Advance clocks; returns true at the instant the window completes
    pub fn advance(&mut self, dt: f64) -> bool {
        self.simulation_time += dt;
        if self.window.running {
            self.window.elapsed += dt;
            if self.window.elapsed >= self.window.duration {
                self.window.running = false;
                return true;
            }
        }
        false
    }

    pub fn window_complete(&self) -> bool {
        !self.window.running && self.window.elapsed >= self.window.duration
    }

    pub fn record_arrival(&mut self, approach: Approach) {
        self.approaches[approach.index()].volume += 1;
    }

    /// Record a vehicle leaving the simulated region after completing its
    /// movement
    pub fn record_exit(&mut self, approach: Approach, wait_time: f32) {
        self.total_vehicles += 1;
        if wait_time > 0.0 {
            self.approaches[approach.index()].wait_times.push(wait_time);
        }
    }

    /// Sample the live vehicle collection: accrue stopped-vehicle delay and
    /// track per-approach queue peaks
    pub fn sample(&mut self, dt: f64, vehicles: &[Vehicle]) {
        let mut queues = [0u32; 4];
        for vehicle in vehicles {
            if vehicle.stopped && !vehicle.passed_intersection {
                let index = vehicle.approach.index();
                self.approaches[index].total_delay += dt;
                queues[index] += 1;
            }
        }
        for (metrics, queue) in self.approaches.iter_mut().zip(queues) {
            metrics.max_queue = metrics.max_queue.max(queue);
        }
    }

    /// Instantaneous queue lengths per approach (stopped vehicles that have
    /// not yet cleared the intersection)
    pub fn queue_counts(vehicles: &[Vehicle]) -> [u32; 4] {
        let mut queues = [0u32; 4];
        for vehicle in vehicles {
            if vehicle.stopped && !vehicle.passed_intersection {
                queues[vehicle.approach.index()] += 1;
            }
        }
        queues
    }

    /// Derive average delays and LOS grades from the accumulated data
    pub fn finalize(&mut self) {
        let mut total_delay = 0.0;
        let mut total_volume = 0u32;
        for metrics in &mut self.approaches {
            metrics.avg_delay = metrics.average_delay();
            metrics.los = level_of_service(metrics.avg_delay);
            total_delay += metrics.total_delay;
            total_volume += metrics.volume;
        }
        self.overall_avg_delay = if total_volume == 0 {
            0.0
        } else {
            total_delay / total_volume as f64
        };
        self.overall_los = level_of_service(self.overall_avg_delay);
        self.max_queue = self
            .approaches
            .iter()
            .map(|metrics| metrics.max_queue)
            .max()
            .unwrap_or(0);
    }
}
