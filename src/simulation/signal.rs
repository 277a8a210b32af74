//! Signal controller state machine
//!
//! Cycles GREEN -> YELLOW -> ALL_RED -> next phase over a fixed phase
//! topology. Three operating modes decide when a green phase is allowed to
//! end: pretimed (fixed time), actuated (gap-out on detector demand), and
//! adaptive (compare served vs. opposing detector counts). The topology is
//! fixed for the lifetime of a controller; reconfiguration only adjusts
//! timing parameters.

use log::debug;

use super::types::{Approach, Axis, Movement};

/// Sub-state of the current signal phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Green,
    Yellow,
    AllRed,
}

/// How green time is allocated across phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTopology {
    /// Two phases: N/S (with permissive lefts), then E/W
    Simple,
    /// Four phases: N/S left, N/S thru, E/W left, E/W thru
    ProtectedLeft,
    /// Four phases, one approach fully exclusive at a time: N, E, S, W
    ApproachByApproach,
}

impl PhaseTopology {
    pub fn phase_count(&self) -> usize {
        match self {
            PhaseTopology::Simple => 2,
            PhaseTopology::ProtectedLeft => 4,
            PhaseTopology::ApproachByApproach => 4,
        }
    }

    /// The movement group served by a phase index
    pub fn phase(&self, index: usize) -> Phase {
        match self {
            PhaseTopology::Simple => match index % 2 {
                0 => Phase::Through(Axis::NorthSouth),
                _ => Phase::Through(Axis::EastWest),
            },
            PhaseTopology::ProtectedLeft => match index % 4 {
                0 => Phase::ProtectedLeft(Axis::NorthSouth),
                1 => Phase::Through(Axis::NorthSouth),
                2 => Phase::ProtectedLeft(Axis::EastWest),
                _ => Phase::Through(Axis::EastWest),
            },
            PhaseTopology::ApproachByApproach => match index % 4 {
                0 => Phase::Exclusive(Approach::North),
                1 => Phase::Exclusive(Approach::East),
                2 => Phase::Exclusive(Approach::South),
                _ => Phase::Exclusive(Approach::West),
            },
        }
    }
}

/// A movement group holding the right of way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Through (and right-turn) movements on one axis; lefts are permissive
    /// only under the [`PhaseTopology::Simple`] topology
    Through(Axis),
    /// Protected left turns on one axis
    ProtectedLeft(Axis),
    /// One approach moves, all movements allowed
    Exclusive(Approach),
}

impl Phase {
    /// The street axis this phase serves, used by detector logic
    pub fn served_axis(&self) -> Axis {
        match self {
            Phase::Through(axis) | Phase::ProtectedLeft(axis) => *axis,
            Phase::Exclusive(approach) => approach.axis(),
        }
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Phase::ProtectedLeft(_))
    }
}

/// Control strategy deciding when a green phase may end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Fixed-time operation; switch as soon as minimum green is served
    Pretimed,
    /// Gap-out on absence of detector demand, bounded by max green
    Actuated,
    /// Switch early when the opposing axis shows markedly more demand
    Adaptive,
}

/// Signal timing parameters in seconds
///
/// Defaults mirror a typical pretimed setup; missing values in a partial
/// reconfiguration simply keep their previous settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalTiming {
    pub min_green_ns: f32,
    pub min_green_ew: f32,
    /// Minimum green for exclusive single-approach phases
    pub min_green_approach: f32,
    pub yellow: f32,
    pub all_red: f32,
    /// Minimum green for protected-left phases
    pub left_min_green: f32,
    /// Yellow duration for protected-left phases
    pub left_yellow: f32,
    pub max_green_ns: f32,
    pub max_green_ew: f32,
    /// Gap-out threshold for actuated control
    pub gap: f32,
}

impl Default for SignalTiming {
    fn default() -> Self {
        Self {
            min_green_ns: 30.0,
            min_green_ew: 30.0,
            min_green_approach: 15.0,
            yellow: 3.0,
            all_red: 2.0,
            left_min_green: 8.0,
            left_yellow: 3.0,
            max_green_ns: 90.0,
            max_green_ew: 90.0,
            gap: 3.0,
        }
    }
}

/// Adaptive control switches early when the opposing count exceeds the
/// served count by this factor
const ADAPTIVE_OPPOSING_RATIO: f32 = 1.2;

/// The signal phase state machine
#[derive(Debug, Clone)]
pub struct SignalController {
    topology: PhaseTopology,
    mode: ControlMode,
    timing: SignalTiming,
    phase_index: usize,
    state: PhaseState,
    /// Countdown for the current sub-state; during GREEN it tracks the
    /// remaining minimum green
    timer: f32,
    /// Elapsed green time for the current phase
    cumulative_green: f32,
    /// Seconds without demand on the served axis (actuated mode)
    gap_timer: f32,
    switch_requested: bool,
    /// Per-axis presence detectors; absent input means demand is assumed
    /// on both axes and no early switch occurs
    detector_demand: Option<(bool, bool)>,
    /// Per-axis detector vehicle counts for adaptive control
    detector_counts: Option<(u32, u32)>,
}

impl SignalController {
    pub fn new(topology: PhaseTopology, mode: ControlMode, timing: SignalTiming) -> Self {
        let mut controller = Self {
            topology,
            mode,
            timing,
            phase_index: 0,
            state: PhaseState::Green,
            timer: 0.0,
            cumulative_green: 0.0,
            gap_timer: 0.0,
            switch_requested: false,
            detector_demand: None,
            detector_counts: None,
        };
        controller.timer = controller.required_green(controller.current_phase());
        controller
    }

    pub fn topology(&self) -> PhaseTopology {
        self.topology
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn timing(&self) -> &SignalTiming {
        &self.timing
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn current_phase(&self) -> Phase {
        self.topology.phase(self.phase_index)
    }

    pub fn phase_count(&self) -> usize {
        self.topology.phase_count()
    }

    pub fn cumulative_green(&self) -> f32 {
        self.cumulative_green
    }

    /// Supply presence detector state (actuated mode)
    pub fn set_detector_demand(&mut self, ns: bool, ew: bool) {
        self.detector_demand = Some((ns, ew));
    }

    /// Supply detector vehicle counts (adaptive mode)
    pub fn set_detector_counts(&mut self, ns: u32, ew: u32) {
        self.detector_counts = Some((ns, ew));
    }

    /// Switch mode at runtime; timers and phase position are kept
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    /// Minimum green required for a phase, by phase type
    fn required_green(&self, phase: Phase) -> f32 {
        match phase {
            Phase::Exclusive(_) => self.timing.min_green_approach,
            Phase::ProtectedLeft(_) => self.timing.left_min_green,
            Phase::Through(Axis::NorthSouth) => self.timing.min_green_ns,
            Phase::Through(Axis::EastWest) => self.timing.min_green_ew,
        }
    }

    fn max_green(&self, axis: Axis) -> f32 {
        match axis {
            Axis::NorthSouth => self.timing.max_green_ns,
            Axis::EastWest => self.timing.max_green_ew,
        }
    }

    fn demand_on(&self, axis: Axis) -> bool {
        match (axis, self.detector_demand) {
            (Axis::NorthSouth, Some((ns, _))) => ns,
            (Axis::EastWest, Some((_, ew))) => ew,
            // No detectors wired up: assume demand everywhere
            (_, None) => true,
        }
    }

    fn count_on(&self, axis: Axis) -> Option<u32> {
        self.detector_counts.map(|(ns, ew)| match axis {
            Axis::NorthSouth => ns,
            Axis::EastWest => ew,
        })
    }

    /// Advance the state machine by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.timer -= dt;
        if self.state == PhaseState::Green {
            self.cumulative_green += dt;
        }

        match self.state {
            PhaseState::Green => {
                let phase = self.current_phase();
                let axis = phase.served_axis();

                match self.mode {
                    ControlMode::Pretimed => {
                        if self.timer <= 0.0 {
                            self.switch_requested = true;
                        }
                    }
                    ControlMode::Actuated => {
                        // Gap-out: once minimum green is served, accumulate
                        // time without demand on the served axis
                        if self.timer <= 0.0 {
                            if self.demand_on(axis) {
                                self.gap_timer = 0.0;
                            } else {
                                self.gap_timer += dt;
                            }
                            if self.gap_timer >= self.timing.gap {
                                self.switch_requested = true;
                            }
                        }
                        if self.cumulative_green >= self.max_green(axis) {
                            self.switch_requested = true;
                        }
                    }
                    ControlMode::Adaptive => {
                        if self.timer <= 0.0 {
                            if let (Some(served), Some(opposing)) =
                                (self.count_on(axis), self.count_on(axis.opposing()))
                            {
                                if opposing as f32 > served as f32 * ADAPTIVE_OPPOSING_RATIO {
                                    self.switch_requested = true;
                                }
                            }
                        }
                        if self.cumulative_green >= self.max_green(axis) {
                            self.switch_requested = true;
                        }
                    }
                }

                // A queued switch request only takes effect once minimum
                // green has been served
                if self.switch_requested && self.timer <= 0.0 {
                    self.state = PhaseState::Yellow;
                    self.timer = if phase.is_left() {
                        self.timing.left_yellow
                    } else {
                        self.timing.yellow
                    };
                    debug!("phase {} -> yellow", self.phase_label());
                }
            }
            PhaseState::Yellow => {
                if self.timer <= 0.0 {
                    self.state = PhaseState::AllRed;
                    self.timer = self.timing.all_red;
                }
            }
            PhaseState::AllRed => {
                if self.timer <= 0.0 {
                    self.phase_index = (self.phase_index + 1) % self.phase_count();
                    self.state = PhaseState::Green;
                    self.timer = self.required_green(self.current_phase());
                    self.switch_requested = false;
                    self.cumulative_green = 0.0;
                    self.gap_timer = 0.0;
                    debug!("green: {}", self.phase_label());
                }
            }
        }
    }

    /// Request an early end to the current green (e.g. an operator button).
    /// Honored only once minimum green has been served.
    pub fn request_switch(&mut self) -> bool {
        if self.state == PhaseState::Green && self.timer <= 0.0 {
            self.switch_requested = true;
            return true;
        }
        false
    }

    /// Merge new timing parameters at runtime. If the current green now
    /// requires less minimum green than remains on the timer, the timer is
    /// clamped down so the change takes effect immediately.
    pub fn reconfigure(&mut self, timing: SignalTiming) {
        self.timing = timing;
        if self.state == PhaseState::Green {
            let required = self.required_green(self.current_phase());
            if self.timer > required {
                self.timer = required;
            }
        }
    }

    /// Whether a vehicle on `approach` making `movement` currently has the
    /// right of way. GREEN and YELLOW both grant it; ALL_RED grants none.
    pub fn has_right_of_way(&self, approach: Approach, movement: Movement) -> bool {
        if self.state == PhaseState::AllRed {
            return false;
        }
        match self.current_phase() {
            Phase::Exclusive(served) => approach == served,
            Phase::ProtectedLeft(axis) => approach.axis() == axis && movement == Movement::Left,
            Phase::Through(axis) => {
                if approach.axis() != axis {
                    return false;
                }
                // Under the protected-left topology, lefts wait for their
                // own phase; under the simple topology they are permissive
                match self.topology {
                    PhaseTopology::ProtectedLeft => movement != Movement::Left,
                    _ => true,
                }
            }
        }
    }

    fn protected_lefts(&self) -> bool {
        self.topology == PhaseTopology::ProtectedLeft
    }

    /// Human-readable description of the current state, for displays
    pub fn phase_label(&self) -> String {
        let phase = self.current_phase();
        match self.state {
            PhaseState::AllRed => "All Red".to_string(),
            PhaseState::Green => match phase {
                Phase::Exclusive(approach) => format!("{} Green", approach.title()),
                Phase::ProtectedLeft(Axis::NorthSouth) => "N/S Left".to_string(),
                Phase::ProtectedLeft(Axis::EastWest) => "E/W Left".to_string(),
                // Alongside protected lefts, thru phases are labeled as such
                Phase::Through(Axis::NorthSouth) if self.protected_lefts() => {
                    "N/S Thru".to_string()
                }
                Phase::Through(Axis::EastWest) if self.protected_lefts() => {
                    "E/W Thru".to_string()
                }
                Phase::Through(Axis::NorthSouth) => "N/S Green".to_string(),
                Phase::Through(Axis::EastWest) => "E/W Green".to_string(),
            },
            PhaseState::Yellow => match phase {
                Phase::Exclusive(approach) => format!("{} Yellow", approach.title()),
                Phase::ProtectedLeft(Axis::NorthSouth) => "N/S Left Yellow".to_string(),
                Phase::ProtectedLeft(Axis::EastWest) => "E/W Left Yellow".to_string(),
                Phase::Through(Axis::NorthSouth) if self.protected_lefts() => {
                    "N/S Thru Yellow".to_string()
                }
                Phase::Through(Axis::EastWest) if self.protected_lefts() => {
                    "E/W Thru Yellow".to_string()
                }
                Phase::Through(Axis::NorthSouth) => "N/S Yellow".to_string(),
                Phase::Through(Axis::EastWest) => "E/W Yellow".to_string(),
            },
        }
    }
}
