//! Session persistence.
//!
//! ## Key Types
//!
//! - `GameSnapshot`: zones as instance-id lists plus counters and mulligan progress
//! - `ViewState`: which screen was open, for restoring navigation on reload
//! - `SessionPersistence`: save, load, age/deck checks and restore
//! - `spawn_autosave`: periodic save task (`spawn_configured_autosave` uses the session config)

pub mod autosave;
pub mod session_store;
pub mod snapshot;

pub use autosave::{spawn_autosave, spawn_configured_autosave, AutosaveHandle};
pub use session_store::{RestoredGame, SessionPersistence};
pub use snapshot::{BattlefieldEntry, GameSnapshot, SnapshotRejection, View, ViewState};
