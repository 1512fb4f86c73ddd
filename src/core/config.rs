//! Playtest configuration.
//!
//! Every limit, window and pacing delay used by the caches, the loader and
//! the game engine lives here. All sections have defaults, so a JSON
//! override only needs to name the values it changes:
//!
//! ```
//! use deck_playtest::core::PlaytestConfig;
//!
//! let config = PlaytestConfig::from_json(r#"{ "records": { "capacity": 50 } }"#).unwrap();
//! assert_eq!(config.records.capacity, 50);
//! assert_eq!(config.images.capacity, 500);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

const HOUR_MS: u64 = 60 * 60 * 1000;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Card record cache limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordCacheConfig {
    /// Maximum cached records.
    pub capacity: usize,
    /// Age after which a record is treated as missing.
    pub ttl_ms: u64,
    /// Share of entries dropped when the cache is full (at least one).
    pub eviction_fraction: f64,
}

impl Default for RecordCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl_ms: 7 * DAY_MS,
            eviction_fraction: 0.1,
        }
    }
}

impl RecordCacheConfig {
    /// TTL as a `Duration`.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Image URL cache limits and resolution pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCacheConfig {
    /// Maximum cached image entries.
    pub capacity: usize,
    /// Age after which an entry (positive or negative) is re-resolved.
    pub ttl_ms: u64,
    /// Share of entries dropped when the cache is full (at least one).
    pub eviction_fraction: f64,
    /// How long an image load check may take before it counts as failed.
    pub probe_timeout_ms: u64,
    /// How long a caller waits on someone else's in-flight resolution.
    pub inflight_wait_ms: u64,
    /// Default number of images resolved concurrently by `preload`.
    pub preload_concurrency: usize,
    /// Pause between preload batches.
    pub preload_batch_delay_ms: u64,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            ttl_ms: DAY_MS,
            eviction_fraction: 0.1,
            probe_timeout_ms: 5_000,
            inflight_wait_ms: 10_000,
            preload_concurrency: 2,
            preload_batch_delay_ms: 500,
        }
    }
}

impl ImageCacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    #[must_use]
    pub fn inflight_wait(&self) -> Duration {
        Duration::from_millis(self.inflight_wait_ms)
    }

    #[must_use]
    pub fn preload_batch_delay(&self) -> Duration {
        Duration::from_millis(self.preload_batch_delay_ms)
    }
}

/// Remote card fetching limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Ids per collection request (the card API caps this at 75).
    pub chunk_size: usize,
    /// Pause between chunks and between per-item fallback fetches.
    pub pause_ms: u64,
    /// Maximum results kept from a text search.
    pub search_limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 75,
            pause_ms: 100,
            search_limit: 20,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Session snapshot windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Oldest game snapshot accepted by `restore`.
    pub game_max_age_ms: u64,
    /// Oldest view-state record accepted on startup.
    pub view_max_age_ms: u64,
    /// Auto-save period while a game view is active.
    pub autosave_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game_max_age_ms: 30 * 60 * 1000,
            view_max_age_ms: HOUR_MS,
            autosave_interval_ms: 10_000,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_millis(self.autosave_interval_ms)
    }
}

/// Rectangle on the battlefield where new tokens are dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Game rules for a commander playtest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub starting_life: i32,
    pub opening_hand_size: usize,
    pub max_mulligans: u32,
    pub min_hand_size: usize,
    /// Poison total at which the player loses.
    pub lethal_poison: u32,
    pub token_spawn: SpawnArea,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            starting_life: 40,
            opening_hand_size: 7,
            max_mulligans: 7,
            min_hand_size: 1,
            lethal_poison: 10,
            token_spawn: SpawnArea {
                x: 100.0,
                y: 100.0,
                width: 300.0,
                height: 200.0,
            },
        }
    }
}

impl GameRules {
    /// Hand size after `mulligans` redraws.
    #[must_use]
    pub fn hand_size_after(&self, mulligans: u32) -> usize {
        self.opening_hand_size
            .saturating_sub(mulligans as usize)
            .max(self.min_hand_size)
    }
}

/// Complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaytestConfig {
    pub records: RecordCacheConfig,
    pub images: ImageCacheConfig,
    pub fetch: FetchConfig,
    pub session: SessionConfig,
    pub rules: GameRules,
}

impl PlaytestConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Set the record cache capacity.
    #[must_use]
    pub fn with_record_capacity(mut self, capacity: usize) -> Self {
        self.records.capacity = capacity;
        self
    }

    /// Set the image cache capacity.
    #[must_use]
    pub fn with_image_capacity(mut self, capacity: usize) -> Self {
        self.images.capacity = capacity;
        self
    }

    /// Set the collection chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.fetch.chunk_size = chunk_size;
        self
    }

    /// Replace the game rules.
    #[must_use]
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlaytestConfig::default();
        assert_eq!(config.records.capacity, 1000);
        assert_eq!(config.records.ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.images.capacity, 500);
        assert_eq!(config.images.ttl_ms, 24 * 3600 * 1000);
        assert_eq!(config.images.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.images.inflight_wait(), Duration::from_secs(10));
        assert_eq!(config.fetch.chunk_size, 75);
        assert_eq!(config.session.game_max_age_ms, 30 * 60 * 1000);
        assert_eq!(config.session.view_max_age_ms, 60 * 60 * 1000);
        assert_eq!(config.session.autosave_interval(), Duration::from_secs(10));
        assert_eq!(config.rules.starting_life, 40);
    }

    #[test]
    fn test_hand_size_after() {
        let rules = GameRules::default();
        let sizes: Vec<_> = (0..=8).map(|k| rules.hand_size_after(k)).collect();
        assert_eq!(sizes, vec![7, 6, 5, 4, 3, 2, 1, 1, 1]);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PlaytestConfig::default()
            .with_record_capacity(10)
            .with_image_capacity(4)
            .with_chunk_size(3);

        assert_eq!(config.records.capacity, 10);
        assert_eq!(config.images.capacity, 4);
        assert_eq!(config.fetch.chunk_size, 3);
    }

    #[test]
    fn test_partial_json_override() {
        let config = PlaytestConfig::from_json(
            r#"{ "session": { "autosave_interval_ms": 2000 }, "rules": { "starting_life": 20 } }"#,
        )
        .unwrap();

        assert_eq!(config.session.autosave_interval_ms, 2000);
        assert_eq!(config.session.game_max_age_ms, 30 * 60 * 1000);
        assert_eq!(config.rules.starting_life, 20);
        assert_eq!(config.rules.opening_hand_size, 7);
    }

    #[test]
    fn test_serialization() {
        let config = PlaytestConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PlaytestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
