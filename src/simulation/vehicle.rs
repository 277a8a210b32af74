//! Vehicle kinematics, lane assignment, and signal-gated stopping
//!
//! Vehicles travel straight along their approach in screen coordinates.
//! Internally most comparisons happen in "progress" space: the distance a
//! vehicle has covered along its direction of travel, increasing toward and
//! through the intersection. This collapses the four approach directions
//! into one set of comparisons.

use rand::Rng;

use super::config::SimConfig;
use super::environment::EnvironmentState;
use super::signal::SignalController;
use super::types::{Approach, Movement, VehicleId};
use super::vehicle_types::{VehicleClass, VehicleType};

/// Seconds a vehicle must wait between lane changes
pub const LANE_CHANGE_COOLDOWN: f32 = 2.0;

/// Look-ahead distance past the front bumper when deciding to stop for
/// a signal
const STOP_LOOKAHEAD: f32 = 2.0;

/// Following gap threshold as a multiple of vehicle length
const SAFE_FOLLOWING_FACTOR: f32 = 0.8;

/// A lane-change is blocked when another vehicle sits within this many
/// vehicle lengths in the target lane
const LANE_CLEAR_FACTOR: f32 = 2.0;

/// Extra restart delay for vehicles queued behind a stopped leader
const QUEUED_RESTART_DELAY: f32 = 0.3;

/// Read-only snapshot of one vehicle's lane occupancy, captured before the
/// vehicle-update phase so updates never observe half-advanced neighbors
#[derive(Debug, Clone, Copy)]
pub struct LaneNeighbor {
    pub id: VehicleId,
    pub approach: Approach,
    pub lane: usize,
    /// Progress-space position (see module docs)
    pub progress: f32,
    pub length: f32,
    pub stopped: bool,
}

/// One simulated vehicle
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub approach: Approach,
    pub movement: Movement,
    pub class: VehicleClass,
    pub width: f32,
    pub length: f32,
    pub x: f32,
    pub y: f32,
    pub lane: usize,
    pub target_lane: usize,
    /// Current longitudinal speed in world units per second
    pub current_speed: f32,
    pub speed_multiplier: f32,
    /// Acceleration limit in world units per second squared
    pub accel: f32,
    /// Deceleration limit in world units per second squared
    pub decel: f32,
    pub stopped: bool,
    /// Total time spent stopped, in seconds
    pub wait_time: f32,
    pub passed_intersection: bool,
    time_since_lane_change: f32,
    restart_delay: f32,
}

impl Vehicle {
    pub fn new<R: Rng>(
        id: VehicleId,
        approach: Approach,
        movement: Movement,
        vtype: &VehicleType,
        config: &SimConfig,
        rng: &mut R,
    ) -> Self {
        let lane = initial_lane(movement, config.num_lanes, rng);
        let mut vehicle = Self {
            id,
            approach,
            movement,
            class: vtype.class,
            width: vtype.width,
            length: vtype.length,
            x: 0.0,
            y: 0.0,
            lane,
            target_lane: lane,
            current_speed: config.base_speed * vtype.speed_multiplier,
            speed_multiplier: vtype.speed_multiplier,
            accel: config.accel,
            decel: config.decel,
            stopped: false,
            wait_time: 0.0,
            passed_intersection: false,
            time_since_lane_change: 0.0,
            restart_delay: 0.0,
        };
        vehicle.place_at_entry(config);
        vehicle
    }

    pub fn is_emergency(&self) -> bool {
        self.class == VehicleClass::Emergency
    }

    /// Direction of travel as a unit vector in screen coordinates
    pub fn direction(&self) -> (f32, f32) {
        match self.approach {
            Approach::North => (0.0, 1.0),
            Approach::South => (0.0, -1.0),
            Approach::West => (1.0, 0.0),
            Approach::East => (-1.0, 0.0),
        }
    }

    /// Velocity vector in world units per second
    pub fn velocity(&self) -> (f32, f32) {
        let (dx, dy) = self.direction();
        (dx * self.current_speed, dy * self.current_speed)
    }

    /// Position along the direction of travel; grows toward and through
    /// the intersection
    pub fn progress(&self) -> f32 {
        match self.approach {
            Approach::North => self.y,
            Approach::South => -self.y,
            Approach::West => self.x,
            Approach::East => -self.x,
        }
    }

    fn set_progress(&mut self, p: f32) {
        match self.approach {
            Approach::North => self.y = p,
            Approach::South => self.y = -p,
            Approach::West => self.x = p,
            Approach::East => self.x = -p,
        }
    }

    /// Progress value of the intersection center for this approach
    fn center_progress(&self, config: &SimConfig) -> f32 {
        match self.approach {
            Approach::North => config.geometry.center_y(),
            Approach::South => -config.geometry.center_y(),
            Approach::West => config.geometry.center_x(),
            Approach::East => -config.geometry.center_x(),
        }
    }

    /// Progress value of this approach's stop line
    fn stop_line_progress(&self, config: &SimConfig) -> f32 {
        self.center_progress(config) - config.geometry.stop_line_offset()
    }

    pub fn has_passed_stop_line(&self, config: &SimConfig) -> bool {
        self.progress() > self.stop_line_progress(config)
    }

    fn approaching_stop_line(&self, config: &SimConfig) -> bool {
        self.progress() + self.length / 2.0 + STOP_LOOKAHEAD >= self.stop_line_progress(config)
    }

    /// Whether the vehicle has left the simulated region
    pub fn is_offscreen(&self, config: &SimConfig) -> bool {
        let margin = self.length * 2.0;
        self.x < -margin
            || self.x > config.geometry.canvas_width + margin
            || self.y < -margin
            || self.y > config.geometry.canvas_height + margin
    }

    /// Lateral coordinate of the center of `lane` for this approach
    fn lane_center(&self, config: &SimConfig, lane: usize) -> f32 {
        let geo = &config.geometry;
        let lane_width = geo.lane_width(config.num_lanes);
        let offset = (lane as f32 + 0.5) * lane_width;
        match self.approach {
            Approach::North => geo.center_x() - geo.road_width / 2.0 + offset,
            Approach::South => geo.center_x() + geo.road_width / 2.0 - offset,
            Approach::East => geo.center_y() + geo.road_width / 2.0 - offset,
            Approach::West => geo.center_y() - geo.road_width / 2.0 + offset,
        }
    }

    /// Place the vehicle off-screen at its approach entry, centered in its
    /// assigned lane
    fn place_at_entry(&mut self, config: &SimConfig) {
        let lateral = self.lane_center(config, self.lane);
        match self.approach {
            Approach::North => {
                self.x = lateral;
                self.y = -self.length;
            }
            Approach::South => {
                self.x = lateral;
                self.y = config.geometry.canvas_height + self.length;
            }
            Approach::East => {
                self.x = config.geometry.canvas_width + self.length;
                self.y = lateral;
            }
            Approach::West => {
                self.x = -self.length;
                self.y = lateral;
            }
        }
    }

    fn snap_to_lane(&mut self, config: &SimConfig) {
        let lateral = self.lane_center(config, self.lane);
        match self.approach {
            Approach::North | Approach::South => self.x = lateral,
            Approach::East | Approach::West => self.y = lateral,
        }
    }

    /// Advance the vehicle by `dt` seconds.
    ///
    /// `others` is the pre-update lane snapshot of all vehicles, including
    /// this one (matched entries are skipped by id).
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        others: &[LaneNeighbor],
        signal: &SignalController,
        environment: &EnvironmentState,
        config: &SimConfig,
        rng: &mut R,
    ) {
        self.time_since_lane_change += dt;
        if self.time_since_lane_change > LANE_CHANGE_COOLDOWN {
            self.consider_lane_change(others, config, rng);
        }

        // Emergency vehicles run the light
        let has_green = self.is_emergency()
            || signal.has_right_of_way(self.approach, self.movement);
        let past_stop_line = self.has_passed_stop_line(config);

        if !self.passed_intersection && self.progress() > self.center_progress(config) {
            self.passed_intersection = true;
        }

        let was_stopped = self.stopped;
        let mut should_stop = false;
        let stopping_for_signal =
            !has_green && !past_stop_line && self.approaching_stop_line(config);
        if stopping_for_signal {
            should_stop = true;
        }

        // Car-following against the lead vehicle in this lane
        let mut lead_stopped = false;
        if let Some(lead) = self.find_lead(others) {
            let gap = lead.progress - self.progress() - self.length / 2.0 - lead.length / 2.0;
            let safe_gap =
                self.length * SAFE_FOLLOWING_FACTOR * environment.safety_factor();
            if gap < safe_gap {
                should_stop = true;
                lead_stopped = lead.stopped;
            }
        }

        // Stagger restarts so a released queue doesn't move as one block
        if should_stop {
            self.restart_delay = 0.0;
        } else if was_stopped {
            if self.restart_delay <= 0.0 {
                self.restart_delay = rng.random_range(0.1..0.5);
                if lead_stopped {
                    self.restart_delay += QUEUED_RESTART_DELAY;
                }
            }
            self.restart_delay -= dt;
            if self.restart_delay > 0.0 {
                should_stop = true;
            }
        }

        self.stopped = should_stop;
        if self.stopped {
            self.wait_time += dt;
        }

        let target_speed = if should_stop {
            0.0
        } else {
            config.base_speed * self.speed_multiplier * environment.speed_factor()
        };

        if self.current_speed < target_speed {
            self.current_speed = (self.current_speed + self.accel * dt).min(target_speed);
        } else if self.current_speed > target_speed {
            self.current_speed = (self.current_speed - self.decel * dt).max(target_speed);
        }

        let (vx, vy) = self.velocity();
        self.x += vx * dt;
        self.y += vy * dt;

        // Don't let a signal stop overshoot the stop line
        if self.stopped && stopping_for_signal {
            let limit = self.stop_line_progress(config) - self.length / 2.0;
            if self.progress() > limit {
                self.set_progress(limit);
            }
        }
    }

    /// Re-evaluate the desired lane and shift one lane toward it if the
    /// target lane is clear. Turning traffic pulls toward the lane its
    /// movement requires; through traffic redraws its preference and may
    /// wander between lanes.
    fn consider_lane_change<R: Rng>(
        &mut self,
        others: &[LaneNeighbor],
        config: &SimConfig,
        rng: &mut R,
    ) {
        self.target_lane = initial_lane(self.movement, config.num_lanes, rng);
        if self.lane == self.target_lane {
            return;
        }
        let step = if self.target_lane > self.lane { 1 } else { -1 };
        let new_lane = (self.lane as isize + step) as usize;
        if new_lane >= config.num_lanes {
            return;
        }
        if self.is_lane_clear(new_lane, others) {
            self.lane = new_lane;
            self.snap_to_lane(config);
            self.time_since_lane_change = 0.0;
        }
    }

    /// A lane is clear when no same-approach vehicle occupies it within an
    /// unsafe longitudinal gap (twice this vehicle's length)
    fn is_lane_clear(&self, lane: usize, others: &[LaneNeighbor]) -> bool {
        for other in others {
            if other.id == self.id || other.approach != self.approach || other.lane != lane {
                continue;
            }
            if (other.progress - self.progress()).abs() < self.length * LANE_CLEAR_FACTOR {
                return false;
            }
        }
        true
    }

    /// The closest vehicle ahead of this one in the same approach and lane
    fn find_lead<'a>(&self, others: &'a [LaneNeighbor]) -> Option<&'a LaneNeighbor> {
        let progress = self.progress();
        others
            .iter()
            .filter(|other| {
                other.id != self.id
                    && other.approach == self.approach
                    && other.lane == self.lane
                    && other.progress > progress
            })
            .min_by_key(|other| ordered_float::OrderedFloat(other.progress - progress))
    }

    /// Snapshot this vehicle's lane occupancy for neighbor queries
    pub fn as_neighbor(&self) -> LaneNeighbor {
        LaneNeighbor {
            id: self.id,
            approach: self.approach,
            lane: self.lane,
            progress: self.progress(),
            length: self.length,
            stopped: self.stopped,
        }
    }
}

/// Lane appropriate to a movement: innermost for left turns, outermost for
/// right turns, uniform-random among lanes for through traffic
pub fn initial_lane<R: Rng>(movement: Movement, num_lanes: usize, rng: &mut R) -> usize {
    match movement {
        Movement::Left => 0,
        Movement::Right => num_lanes - 1,
        Movement::Thru => rng.random_range(0..num_lanes),
    }
}
