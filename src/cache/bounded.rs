//! Bounded, time-expiring entry map shared by the card and image caches.
//!
//! Entries carry their own insertion timestamp. When an insert would exceed
//! capacity, the oldest fraction of entries (at least one) is evicted first.
//! Expiry is lazy: stale entries are dropped when looked up, or in bulk via
//! `purge_expired` when a cache is loaded.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cards::{CardId, CardRecord};
use crate::core::clock::duration_ms;
use crate::storage::{KeyValueStorage, Result, StorageError};

/// A value stamped with the time it was cached.
pub trait Timestamped {
    fn cached_at(&self) -> i64;
}

impl Timestamped for CardRecord {
    fn cached_at(&self) -> i64 {
        self.cached_at
    }
}

/// Capacity- and age-bounded map keyed by card id.
#[derive(Clone, Debug)]
pub struct BoundedCache<V> {
    entries: FxHashMap<CardId, V>,
    capacity: usize,
    ttl_ms: i64,
    eviction_fraction: f64,
}

impl<V: Timestamped> BoundedCache<V> {
    /// Create an empty cache.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration, eviction_fraction: f64) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity: capacity.max(1),
            ttl_ms: duration_ms(ttl),
            eviction_fraction,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether an entry stamped `cached_at` has outlived the TTL at `now`.
    #[must_use]
    pub fn is_expired(&self, cached_at: i64, now: i64) -> bool {
        now.saturating_sub(cached_at) > self.ttl_ms
    }

    /// Look up an entry without checking its age.
    #[must_use]
    pub fn peek(&self, id: &CardId) -> Option<&V> {
        self.entries.get(id)
    }

    /// Look up a fresh entry.
    ///
    /// A stale entry is removed and reported as `Lookup::Expired`.
    pub fn get(&mut self, id: &CardId, now: i64) -> Lookup<&V> {
        let stale = match self.entries.get(id) {
            None => return Lookup::Miss,
            Some(entry) => self.is_expired(entry.cached_at(), now),
        };
        if stale {
            self.entries.remove(id);
            return Lookup::Expired;
        }
        match self.entries.get(id) {
            Some(entry) => Lookup::Hit(entry),
            None => Lookup::Miss,
        }
    }

    /// Insert or replace an entry, evicting first if a new key would exceed
    /// capacity. Returns the number of entries evicted.
    pub fn insert(&mut self, id: CardId, value: V) -> usize {
        let evicted = if !self.entries.contains_key(&id) && self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            0
        };
        self.entries.insert(id, value);
        evicted
    }

    pub fn remove(&mut self, id: &CardId) -> Option<V> {
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        let ttl_ms = self.ttl_ms;
        self.entries.retain(|_, v| now.saturating_sub(v.cached_at()) <= ttl_ms);
        before - self.entries.len()
    }

    /// Evict the oldest `eviction_fraction` of entries, at least one.
    fn evict_oldest(&mut self) -> usize {
        let count = ((self.entries.len() as f64 * self.eviction_fraction).floor() as usize).max(1);

        let mut by_age: Vec<(i64, CardId)> = self
            .entries
            .iter()
            .map(|(id, v)| (v.cached_at(), id.clone()))
            .collect();
        by_age.sort_unstable();

        for (_, id) in by_age.into_iter().take(count) {
            self.entries.remove(&id);
        }
        debug!(evicted = count, remaining = self.entries.len(), "cache eviction");
        count
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Oldest and newest insertion timestamps.
    #[must_use]
    pub fn timestamp_range(&self) -> Option<(i64, i64)> {
        let mut stamps = self.entries.values().map(Timestamped::cached_at);
        let first = stamps.next()?;
        Some(stamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

impl<V: Timestamped + Serialize + DeserializeOwned> BoundedCache<V> {
    /// Serialized form, as written to storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.entries).map_err(|e| StorageError::Backend(e.to_string()))
    }

    /// Replace the contents with whatever is stored under `key`.
    ///
    /// Unreadable or corrupt data leaves the cache empty.
    pub fn load_from(&mut self, storage: &dyn KeyValueStorage, key: &str) {
        self.entries.clear();
        let raw = match storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(key, error = %e, "cache load failed, starting empty");
                return;
            }
        };
        match serde_json::from_str::<FxHashMap<CardId, V>>(&raw) {
            Ok(entries) => self.entries = entries,
            Err(e) => warn!(key, error = %e, "corrupt cache data, starting empty"),
        }
    }

    /// Write the full entry set under `key`.
    ///
    /// On quota exhaustion the cache is emptied and the write retried once;
    /// an empty cache always fits.
    pub fn save_to(&mut self, storage: &dyn KeyValueStorage, key: &str) -> Result<()> {
        match storage.set(key, &self.to_json()?) {
            Err(e) if e.is_quota_exceeded() => {
                warn!(key, entries = self.entries.len(), "storage quota exceeded, clearing cache");
                self.entries.clear();
                storage.set(key, &self.to_json()?)
            }
            other => other,
        }
    }
}

/// Outcome of a cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
    /// The entry was stale and has been removed.
    Expired,
}

impl<T> Lookup<T> {
    pub fn hit(self) -> Option<T> {
        match self {
            Lookup::Hit(v) => Some(v),
            _ => None,
        }
    }
}
