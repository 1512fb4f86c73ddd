//! Card metadata cache backed by durable storage.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use deck_playtest::cache::CardRecordStore;
//! use deck_playtest::cards::{CardId, CardRecord};
//! use deck_playtest::core::{ManualClock, RecordCacheConfig};
//! use deck_playtest::storage::MemoryStorage;
//!
//! let store = CardRecordStore::new(
//!     &RecordCacheConfig::default(),
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(ManualClock::new(0)),
//! );
//! store.put(CardRecord::new("bolt", "Lightning Bolt", "Instant"));
//! assert_eq!(store.get(&CardId::new("bolt")).unwrap().name, "Lightning Bolt");
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::bounded::{BoundedCache, Lookup};
use super::stats::CacheStats;
use crate::cards::{CardId, CardLookup, CardRecord};
use crate::core::{Clock, RecordCacheConfig};
use crate::storage::{KeyValueStorage, CARD_CACHE_KEY};

/// Result of a multi-id lookup.
#[derive(Clone, Debug, Default)]
pub struct CachedRecords {
    pub found: FxHashMap<CardId, CardRecord>,
    /// Requested ids with no fresh entry, in request order.
    pub missing: Vec<CardId>,
}

/// Bounded, expiring card record cache.
///
/// Every mutating call writes the full entry set back to durable storage.
pub struct CardRecordStore {
    cache: Mutex<BoundedCache<CardRecord>>,
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl CardRecordStore {
    /// Load the store from durable storage, dropping expired entries.
    pub fn new(config: &RecordCacheConfig, storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        let mut cache = BoundedCache::new(config.capacity, config.ttl(), config.eviction_fraction);
        cache.load_from(storage.as_ref(), CARD_CACHE_KEY);

        let purged = cache.purge_expired(clock.now_ms());
        debug!(entries = cache.len(), purged, "card cache loaded");

        let store = Self {
            cache: Mutex::new(cache),
            storage,
            clock,
        };
        if purged > 0 {
            store.persist(&mut store.lock());
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, BoundedCache<CardRecord>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, cache: &mut BoundedCache<CardRecord>) {
        if let Err(e) = cache.save_to(self.storage.as_ref(), CARD_CACHE_KEY) {
            warn!(error = %e, "card cache write failed");
        }
    }

    fn insert(&self, cache: &mut BoundedCache<CardRecord>, mut record: CardRecord, now: i64) {
        record.cached_at = now;
        cache.insert(record.id.clone(), record);
    }

    /// Cache a record, stamping it with the current time.
    pub fn put(&self, record: CardRecord) {
        let now = self.clock.now_ms();
        let mut cache = self.lock();
        self.insert(&mut cache, record, now);
        self.persist(&mut cache);
    }

    /// Cache several records with a single storage write.
    pub fn put_many(&self, records: impl IntoIterator<Item = CardRecord>) {
        let now = self.clock.now_ms();
        let mut cache = self.lock();
        for record in records {
            self.insert(&mut cache, record, now);
        }
        self.persist(&mut cache);
    }

    /// Fresh record for `id`, if cached. Expired entries are deleted.
    pub fn get(&self, id: &CardId) -> Option<CardRecord> {
        let now = self.clock.now_ms();
        let mut cache = self.lock();
        match cache.get(id, now) {
            Lookup::Hit(record) => Some(record.clone()),
            Lookup::Miss => None,
            Lookup::Expired => {
                debug!(card = %id, "card cache entry expired");
                self.persist(&mut cache);
                None
            }
        }
    }

    /// Split `ids` into cached records and missing ids.
    pub fn get_many<'a>(&self, ids: impl IntoIterator<Item = &'a CardId>) -> CachedRecords {
        let now = self.clock.now_ms();
        let mut cache = self.lock();
        let mut result = CachedRecords::default();
        let mut expired = false;

        for id in ids {
            match cache.get(id, now) {
                Lookup::Hit(record) => {
                    result.found.insert(id.clone(), record.clone());
                }
                Lookup::Expired => {
                    expired = true;
                    result.missing.push(id.clone());
                }
                Lookup::Miss => result.missing.push(id.clone()),
            }
        }

        if expired {
            self.persist(&mut cache);
        }
        result
    }

    /// Delete one record. Returns whether it was present.
    pub fn delete(&self, id: &CardId) -> bool {
        let mut cache = self.lock();
        let removed = cache.remove(id).is_some();
        if removed {
            self.persist(&mut cache);
        }
        removed
    }

    /// Drop every record, in memory and in durable storage.
    pub fn clear(&self) {
        self.lock().clear();
        if let Err(e) = self.storage.remove(CARD_CACHE_KEY) {
            warn!(error = %e, "card cache removal failed");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Entry count, footprint and age range.
    pub fn stats(&self) -> CacheStats {
        let cache = self.lock();
        CacheStats::collect(&cache, self.clock.now_ms())
    }
}

impl CardLookup for CardRecordStore {
    fn lookup(&self, id: &CardId) -> Option<CardRecord> {
        self.get(id)
    }
}

impl std::fmt::Debug for CardRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardRecordStore")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
