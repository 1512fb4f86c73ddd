//! # deck-playtest
//!
//! Card-data caching and a solitaire playtest engine for commander decks.
//!
//! ## Design Principles
//!
//! 1. **Explicit Services**: Caches, persistence and the application context
//!    are constructed and passed by reference. There are no globals.
//!
//! 2. **Instances Reference Records**: A `CardInstance` holds a `CardId` and
//!    its own tapped/counter/position state, never a copy of card metadata.
//!
//! 3. **Failures Stay Local**: Storage quota, missing cards and stale
//!    snapshots are recovered where they happen. Protocol violations return
//!    a `GameError` and leave state unchanged.
//!
//! ## Architecture
//!
//! - **Injected Time and Randomness**: Every TTL goes through a `Clock` and
//!   every shuffle, roll and token placement through a `RandomSource`, so
//!   tests control both.
//!
//! - **Persistent Data Structures**: Zones are `im::Vector`s, so cloning a
//!   session is cheap.
//!
//! ## Modules
//!
//! - `core`: Clock, RNG, configuration
//! - `storage`: String key/value storage seam
//! - `cards`: Card records, instances, lookup
//! - `cache`: Bounded, expiring record and image caches
//! - `resolver`: Card API seam, deck loading, search
//! - `deck`: Deck lists and composition
//! - `zones`: The six zones and card movement
//! - `game`: Shuffle/draw, setup, the game session, mulligans
//! - `persistence`: Snapshots, view state, auto-save
//! - `app`: The application context

pub mod core;
pub mod storage;
pub mod cards;
pub mod cache;
pub mod resolver;
pub mod deck;
pub mod zones;
pub mod game;
pub mod persistence;
pub mod app;

// Re-export commonly used types
pub use crate::core::{
    Clock, ManualClock, SystemClock,
    GameRng, RandomSource,
    PlaytestConfig, GameRules,
};

pub use crate::storage::{KeyValueStorage, MemoryStorage, StorageError};

pub use crate::cards::{CardId, CardInstance, CardLookup, CardRecord, CardRegistry, InstanceId, Position};

pub use crate::cache::{CacheStats, CardImageStore, CardRecordStore, ImageCacheStats};

pub use crate::resolver::{CardLoader, CardResolver, CardSearch, ImageProbe, LoadReport, ResolveError};

pub use crate::deck::{Deck, DeckComposition, DeckEntry};

pub use crate::zones::{Zone, ZoneManager, ZonePosition};

pub use crate::game::{
    GameError, GameSession, MoveOutcome,
    MulliganPhase, MulliganPlacement, MulliganState,
    ManaColor, Die,
};

pub use crate::persistence::{GameSnapshot, SessionPersistence, SnapshotRejection, View, spawn_autosave, spawn_configured_autosave};

pub use crate::app::{AppServices, PlaytestApp, StartOutcome};
