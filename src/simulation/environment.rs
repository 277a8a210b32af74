//! Weather and time-of-day effects on driving behavior

/// Weather condition affecting speed and following distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weather {
    Clear,
    Rain,
    Snow,
}

impl Weather {
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Weather::Clear => 1.0,
            Weather::Rain => 0.85,
            Weather::Snow => 0.7,
        }
    }

    pub fn safety_multiplier(&self) -> f32 {
        match self {
            Weather::Clear => 1.0,
            Weather::Rain => 1.3,
            Weather::Snow => 1.5,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Weather::Clear => "Normal driving conditions",
            Weather::Rain => "Reduced visibility, slower speeds, increased following distance",
            Weather::Snow => "Poor traction, slower speeds, greater following distance",
        }
    }
}

/// Night driving multipliers
const NIGHT_SPEED_MULTIPLIER: f32 = 0.9;
const NIGHT_SAFETY_MULTIPLIER: f32 = 1.2;

/// Length of one day/night cycle on the internal clock
const CYCLE_LENGTH: f32 = 1000.0;

/// Ambient conditions shared by all vehicles
#[derive(Debug, Clone)]
pub struct EnvironmentState {
    pub weather: Weather,
    /// Position on the day/night clock, 0..1000; daytime is (0, 500)
    pub time_of_day: f32,
    /// Clock units advanced per second when cycling is enabled
    pub cycle_speed: f32,
    pub cycle_enabled: bool,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        Self {
            weather: Weather::Clear,
            time_of_day: 250.0,
            cycle_speed: 12.0,
            cycle_enabled: false,
        }
    }
}

impl EnvironmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_daytime(&self) -> bool {
        self.time_of_day > 0.0 && self.time_of_day < CYCLE_LENGTH / 2.0
    }

    pub fn update(&mut self, dt: f32) {
        if self.cycle_enabled {
            self.time_of_day = (self.time_of_day + self.cycle_speed * dt) % CYCLE_LENGTH;
        }
    }

    /// Combined multiplier applied to free-flow speed
    pub fn speed_factor(&self) -> f32 {
        let time = if self.is_daytime() {
            1.0
        } else {
            NIGHT_SPEED_MULTIPLIER
        };
        self.weather.speed_multiplier() * time
    }

    /// Combined multiplier applied to safe following distance; the more
    /// cautious of the weather and time factors wins
    pub fn safety_factor(&self) -> f32 {
        let time = if self.is_daytime() {
            1.0
        } else {
            NIGHT_SAFETY_MULTIPLIER
        };
        self.weather.safety_multiplier().max(time)
    }
}
