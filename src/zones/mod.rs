//! Zone system for card locations.
//!
//! ## Key Types
//!
//! - `Zone`: library, hand, battlefield, graveyard, exile, command zone
//! - `ZonePosition`: Position specifier for a zone's sequence
//! - `ZoneManager`: Card location tracking and movement

pub mod manager;
pub mod zone;

pub use manager::ZoneManager;
pub use zone::{Zone, ZonePosition};
