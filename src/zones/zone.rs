//! The six playtest zones.

use serde::{Deserialize, Serialize};

/// Named card location in a playtest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// Draw stack. The last element is the top.
    Library,
    Hand,
    Battlefield,
    /// Most recent card first.
    Graveyard,
    Exile,
    Command,
}

impl Zone {
    /// All zones, in display order.
    pub const ALL: [Zone; 6] = [
        Zone::Library,
        Zone::Hand,
        Zone::Battlefield,
        Zone::Graveyard,
        Zone::Exile,
        Zone::Command,
    ];

    /// Dense index for per-zone storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Zone::Library => 0,
            Zone::Hand => 1,
            Zone::Battlefield => 2,
            Zone::Graveyard => 3,
            Zone::Exile => 4,
            Zone::Command => 5,
        }
    }

    /// Where a card lands when no position is given.
    #[must_use]
    pub const fn default_position(self) -> ZonePosition {
        match self {
            Zone::Graveyard => ZonePosition::Head,
            _ => ZonePosition::Tail,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Zone::Library => "library",
            Zone::Hand => "hand",
            Zone::Battlefield => "battlefield",
            Zone::Graveyard => "graveyard",
            Zone::Exile => "exile",
            Zone::Command => "command",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Position for inserting a card into a zone's sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Index 0 (graveyard top, library bottom).
    Head,
    /// After the last element (library top).
    Tail,
    /// Insert at specific index, clamped to the zone length.
    Index(usize),
}
