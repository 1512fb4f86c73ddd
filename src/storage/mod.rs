//! String key/value storage.
//!
//! Both the durable store (card and image caches) and the session-scoped
//! store (game snapshots) have the same shape: synchronous string get/set/
//! remove with a finite quota. Each component writes under its own key.

pub mod error;
pub mod memory;

pub use error::{Result, StorageError};
pub use memory::MemoryStorage;

/// Key under which the card record cache is persisted.
pub const CARD_CACHE_KEY: &str = "mtg_card_cache";
/// Key under which the image cache is persisted.
pub const IMAGE_CACHE_KEY: &str = "mtg_image_cache";
/// Key under which the game snapshot is persisted.
pub const GAME_STATE_KEY: &str = "mtg_game_state";
/// Key under which the lightweight view state is persisted.
pub const VIEW_STATE_KEY: &str = "mtg_view_state";

/// Synchronous string key/value storage with a finite quota.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value. Fails with `StorageError::QuotaExceeded` when the
    /// backend is full.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Missing keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
