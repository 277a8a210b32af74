//! Vehicle archetypes and weighted random selection

use rand::Rng;

/// The archetype a vehicle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleClass {
    Car,
    Truck,
    SportsCar,
    Emergency,
    Bus,
}

impl VehicleClass {
    pub fn name(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
            VehicleClass::SportsCar => "sports_car",
            VehicleClass::Emergency => "emergency",
            VehicleClass::Bus => "bus",
        }
    }
}

/// An immutable vehicle archetype with a mutable spawn weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleType {
    pub class: VehicleClass,
    /// Body width in world units (pixels)
    pub width: f32,
    /// Body length in world units (pixels)
    pub length: f32,
    /// Multiplier applied to the base free-flow speed
    pub speed_multiplier: f32,
    /// Spawn probability weight; selection is proportional to weight
    /// whatever the weights sum to
    pub weight: f64,
}

/// Percentage breakdown of the vehicle mix, expected to total 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleMix {
    pub cars: u32,
    pub trucks: u32,
    pub sports_cars: u32,
    pub buses: u32,
    pub emergency: u32,
}

impl Default for VehicleMix {
    fn default() -> Self {
        Self {
            cars: 65,
            trucks: 15,
            sports_cars: 10,
            buses: 8,
            emergency: 2,
        }
    }
}

/// The fixed list of archetypes with their current spawn weights
#[derive(Debug, Clone)]
pub struct VehicleTypeRegistry {
    types: Vec<VehicleType>,
}

impl Default for VehicleTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleTypeRegistry {
    pub fn new() -> Self {
        Self {
            types: vec![
                VehicleType {
                    class: VehicleClass::Car,
                    width: 15.0,
                    length: 30.0,
                    speed_multiplier: 1.0,
                    weight: 0.65,
                },
                VehicleType {
                    class: VehicleClass::Truck,
                    width: 18.0,
                    length: 45.0,
                    speed_multiplier: 0.8,
                    weight: 0.15,
                },
                VehicleType {
                    class: VehicleClass::SportsCar,
                    width: 14.0,
                    length: 28.0,
                    speed_multiplier: 1.3,
                    weight: 0.1,
                },
                VehicleType {
                    class: VehicleClass::Emergency,
                    width: 16.0,
                    length: 35.0,
                    speed_multiplier: 1.5,
                    weight: 0.02,
                },
                VehicleType {
                    class: VehicleClass::Bus,
                    width: 20.0,
                    length: 50.0,
                    speed_multiplier: 0.7,
                    weight: 0.08,
                },
            ],
        }
    }

    pub fn types(&self) -> &[VehicleType] {
        &self.types
    }

    /// Draw an archetype proportionally to the current weights.
    ///
    /// Walks the cumulative weight partition with one uniform sample. If
    /// floating-point rounding leaves the sample unclaimed, the first
    /// archetype is the defined fallback.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> &VehicleType {
        let total: f64 = self.types.iter().map(|t| t.weight).sum();
        let r = rng.random_range(0.0..1.0) * total;
        let mut acc = 0.0;
        for vtype in &self.types {
            acc += vtype.weight;
            if r < acc {
                return vtype;
            }
        }
        &self.types[0]
    }

    /// Rewrite the spawn weights from a percentage breakdown. The caller is
    /// expected to supply percentages totaling 100; no renormalization is
    /// performed if they do not.
    pub fn apply_mix(&mut self, mix: &VehicleMix) {
        self.types[0].weight = mix.cars as f64 / 100.0;
        self.types[1].weight = mix.trucks as f64 / 100.0;
        self.types[2].weight = mix.sports_cars as f64 / 100.0;
        self.types[3].weight = mix.emergency as f64 / 100.0;
        self.types[4].weight = mix.buses as f64 / 100.0;
    }
}
