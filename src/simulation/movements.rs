//! Turn-split configuration and movement selection
//!
//! Each approach carries a left/thru/right percentage breakdown that must
//! total exactly 100. Validation happens before a table is committed;
//! the picker itself trusts its input and performs no bounds correction.

use anyhow::{bail, Result};
use rand::Rng;

use super::types::{Approach, Movement};

/// Percentage breakdown of movements for one approach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSplit {
    pub left: u32,
    pub thru: u32,
    pub right: u32,
}

impl TurnSplit {
    pub fn new(left: u32, thru: u32, right: u32) -> Self {
        Self { left, thru, right }
    }

    pub fn sum(&self) -> u32 {
        self.left + self.thru + self.right
    }
}

/// Per-approach turn-split table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSplits {
    pub north: TurnSplit,
    pub south: TurnSplit,
    pub east: TurnSplit,
    pub west: TurnSplit,
}

impl Default for TurnSplits {
    fn default() -> Self {
        Self {
            north: TurnSplit::new(20, 60, 20),
            south: TurnSplit::new(10, 80, 10),
            east: TurnSplit::new(30, 60, 10),
            west: TurnSplit::new(10, 80, 10),
        }
    }
}

impl TurnSplits {
    pub fn get(&self, approach: Approach) -> &TurnSplit {
        match approach {
            Approach::North => &self.north,
            Approach::South => &self.south,
            Approach::East => &self.east,
            Approach::West => &self.west,
        }
    }

    pub fn set(&mut self, approach: Approach, split: TurnSplit) {
        match approach {
            Approach::North => self.north = split,
            Approach::South => self.south = split,
            Approach::East => self.east = split,
            Approach::West => self.west = split,
        }
    }

    /// Reject any approach whose percentages do not total exactly 100.
    /// The table is never normalized silently.
    pub fn validate(&self) -> Result<()> {
        for approach in Approach::ALL {
            let sum = self.get(approach).sum();
            if sum != 100 {
                bail!(
                    "turn splits for {} must total 100% (now {}%)",
                    approach,
                    sum
                );
            }
        }
        Ok(())
    }
}

/// Draw a movement for `approach` from the configured turn splits.
///
/// Partitions a uniform draw in [0, 100) against the cumulative
/// {left, left+thru, 100} boundaries. An approach without a configured
/// split defaults to thru rather than erroring.
pub fn pick_movement<R: Rng>(
    approach: Approach,
    splits: Option<&TurnSplits>,
    rng: &mut R,
) -> Movement {
    let split = match splits {
        Some(table) => table.get(approach),
        None => return Movement::Thru,
    };
    let r = rng.random_range(0.0..100.0);
    if r < split.left as f64 {
        Movement::Left
    } else if r < (split.left + split.thru) as f64 {
        Movement::Thru
    } else {
        Movement::Right
    }
}
