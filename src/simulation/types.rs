//! Core types shared across the simulation
//!
//! These are standalone types with no dependency on the driver or any
//! rendering layer.

use std::fmt;

/// A unique identifier for simulation vehicles
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub usize);

/// A direction of travel entering the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Approach {
    North,
    South,
    East,
    West,
}

impl Approach {
    /// All four approaches, in N/S/E/W order
    pub const ALL: [Approach; 4] = [
        Approach::North,
        Approach::South,
        Approach::East,
        Approach::West,
    ];

    /// Single-letter code used by configuration and labels
    pub fn letter(&self) -> char {
        match self {
            Approach::North => 'N',
            Approach::South => 'S',
            Approach::East => 'E',
            Approach::West => 'W',
        }
    }

    /// Lowercase name used in configuration tables and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Approach::North => "north",
            Approach::South => "south",
            Approach::East => "east",
            Approach::West => "west",
        }
    }

    /// Capitalized name used in phase labels
    pub fn title(&self) -> &'static str {
        match self {
            Approach::North => "North",
            Approach::South => "South",
            Approach::East => "East",
            Approach::West => "West",
        }
    }

    /// Index into per-approach arrays (same order as [`Approach::ALL`])
    pub fn index(&self) -> usize {
        match self {
            Approach::North => 0,
            Approach::South => 1,
            Approach::East => 2,
            Approach::West => 3,
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Approach::North | Approach::South => Axis::NorthSouth,
            Approach::East | Approach::West => Axis::EastWest,
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the two crossing streets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    pub fn opposing(&self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest => Axis::NorthSouth,
        }
    }
}

/// The turn a vehicle makes at the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Left,
    Thru,
    Right,
}

impl Movement {
    pub fn name(&self) -> &'static str {
        match self {
            Movement::Left => "left",
            Movement::Thru => "thru",
            Movement::Right => "right",
        }
    }
}
