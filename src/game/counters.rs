//! Player-level counters: mana pool and dice.

use serde::{Deserialize, Serialize};

/// The six mana types tracked in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManaColor {
    W,
    U,
    B,
    R,
    G,
    C,
}

impl ManaColor {
    pub const ALL: [ManaColor; 6] = [
        ManaColor::W,
        ManaColor::U,
        ManaColor::B,
        ManaColor::R,
        ManaColor::G,
        ManaColor::C,
    ];
}

/// Floating mana, one non-negative amount per color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManaPool {
    #[serde(rename = "W", default)]
    pub white: u32,
    #[serde(rename = "U", default)]
    pub blue: u32,
    #[serde(rename = "B", default)]
    pub black: u32,
    #[serde(rename = "R", default)]
    pub red: u32,
    #[serde(rename = "G", default)]
    pub green: u32,
    #[serde(rename = "C", default)]
    pub colorless: u32,
}

impl ManaPool {
    #[must_use]
    pub fn get(&self, color: ManaColor) -> u32 {
        match color {
            ManaColor::W => self.white,
            ManaColor::U => self.blue,
            ManaColor::B => self.black,
            ManaColor::R => self.red,
            ManaColor::G => self.green,
            ManaColor::C => self.colorless,
        }
    }

    fn slot(&mut self, color: ManaColor) -> &mut u32 {
        match color {
            ManaColor::W => &mut self.white,
            ManaColor::U => &mut self.blue,
            ManaColor::B => &mut self.black,
            ManaColor::R => &mut self.red,
            ManaColor::G => &mut self.green,
            ManaColor::C => &mut self.colorless,
        }
    }

    /// Add (or remove) mana, never going below zero. Returns the new amount.
    pub fn change(&mut self, color: ManaColor, delta: i32) -> u32 {
        let slot = self.slot(color);
        *slot = slot.saturating_add_signed(delta);
        *slot
    }

    /// Empty the pool.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sum of all colors, capped at `u32::MAX`.
    #[must_use]
    pub fn total(&self) -> u32 {
        ManaColor::ALL.iter().map(|&c| self.get(c)).fold(0, u32::saturating_add)
    }
}

/// Dice the playtest can roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Die {
    D6,
    D20,
}

impl Die {
    #[must_use]
    pub const fn sides(self) -> u32 {
        match self {
            Die::D6 => 6,
            Die::D20 => 20,
        }
    }
}

/// Most recent result per die.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LastRolls {
    #[serde(default)]
    pub d6: Option<u32>,
    #[serde(default)]
    pub d20: Option<u32>,
}

impl LastRolls {
    pub fn record(&mut self, die: Die, result: u32) {
        match die {
            Die::D6 => self.d6 = Some(result),
            Die::D20 => self.d20 = Some(result),
        }
    }

    #[must_use]
    pub fn get(&self, die: Die) -> Option<u32> {
        match die {
            Die::D6 => self.d6,
            Die::D20 => self.d20,
        }
    }
}
