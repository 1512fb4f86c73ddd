//! The solitaire game engine.
//!
//! ## Key Types
//!
//! - `GameSession`: zones plus life, poison, mana, dice and commander tax
//! - `MulliganState`: the opening-hand protocol
//! - `MoveOutcome`: result of a zone move, including the commander choice
//! - `shuffle` / `draw`: library primitives over an injected `RandomSource`

pub mod counters;
pub mod error;
pub mod mulligan;
pub mod session;
pub mod setup;
pub mod shuffle;

pub use counters::{Die, LastRolls, ManaColor, ManaPool};
pub use error::GameError;
pub use mulligan::{MulliganPhase, MulliganPlacement, MulliganState};
pub use session::{GameSession, MoveOutcome};
pub use setup::{expand_deck, find_commander};
pub use shuffle::{draw, shuffle};
