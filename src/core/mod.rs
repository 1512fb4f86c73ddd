//! Core building blocks: clock, deterministic RNG, configuration.

pub mod clock;
pub mod config;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    FetchConfig, GameRules, ImageCacheConfig, PlaytestConfig, RecordCacheConfig, SessionConfig,
    SpawnArea,
};
pub use rng::{GameRng, RandomSource};
