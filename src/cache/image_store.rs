//! Resolved image URL cache.
//!
//! One entry per card id, remembering either the URL that loaded or the fact
//! that nothing did. Failed resolutions are cached too, so a broken card does
//! not hit the network again until its entry expires.
//!
//! Concurrent requests for the same card share one resolution: the first
//! caller resolves and publishes the outcome on a `watch` channel, later
//! callers wait on it (bounded by the in-flight wait timeout).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::bounded::{BoundedCache, Lookup, Timestamped};
use super::stats::{CacheStats, ImageCacheStats};
use crate::cards::{CardId, CardRecord};
use crate::core::{Clock, ImageCacheConfig};
use crate::resolver::ImageProbe;
use crate::storage::{KeyValueStorage, IMAGE_CACHE_KEY};

/// Cached outcome of resolving one card's image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCacheEntry {
    pub card_id: CardId,
    /// `None` when resolution failed.
    pub image_url: Option<String>,
    pub cached_at: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Timestamped for ImageCacheEntry {
    fn cached_at(&self) -> i64 {
        self.cached_at
    }
}

/// Outcome slot published to waiters. `None` until resolved.
type Outcome = Option<Option<String>>;

/// Bounded, expiring cache of resolved image URLs.
pub struct CardImageStore {
    cache: Mutex<BoundedCache<ImageCacheEntry>>,
    in_flight: Mutex<FxHashMap<CardId, watch::Receiver<Outcome>>>,
    probe: Arc<dyn ImageProbe>,
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    config: ImageCacheConfig,
}

/// Removes a card's in-flight marker when its resolution ends, however it
/// ends.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<FxHashMap<CardId, watch::Receiver<Outcome>>>,
    id: CardId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl CardImageStore {
    /// Load the store from durable storage, dropping expired entries.
    pub fn new(
        config: ImageCacheConfig,
        probe: Arc<dyn ImageProbe>,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut cache = BoundedCache::new(config.capacity, config.ttl(), config.eviction_fraction);
        cache.load_from(storage.as_ref(), IMAGE_CACHE_KEY);
        let purged = cache.purge_expired(clock.now_ms());
        debug!(entries = cache.len(), purged, "image cache loaded");

        let store = Self {
            cache: Mutex::new(cache),
            in_flight: Mutex::new(FxHashMap::default()),
            probe,
            storage,
            clock,
            config,
        };
        if purged > 0 {
            store.persist(&mut store.lock_cache());
        }
        store
    }

    fn lock_cache(&self) -> MutexGuard<'_, BoundedCache<ImageCacheEntry>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, FxHashMap<CardId, watch::Receiver<Outcome>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, cache: &mut BoundedCache<ImageCacheEntry>) {
        if let Err(e) = cache.save_to(self.storage.as_ref(), IMAGE_CACHE_KEY) {
            warn!(error = %e, "image cache write failed");
        }
    }

    /// Fresh cached outcome for a card, if any.
    fn cached(&self, id: &CardId) -> Outcome {
        let now = self.clock.now_ms();
        let mut cache = self.lock_cache();
        match cache.get(id, now) {
            Lookup::Hit(entry) => Some(entry.image_url.clone()),
            Lookup::Miss => None,
            Lookup::Expired => {
                debug!(card = %id, "image cache entry expired");
                self.persist(&mut cache);
                None
            }
        }
    }

    /// Whether a resolution for this card is running.
    #[must_use]
    pub fn is_in_flight(&self, id: &CardId) -> bool {
        self.lock_in_flight().contains_key(id)
    }

    /// Image URL for a card, resolving it if needed.
    ///
    /// Returns `None` for cards without a loadable image. Never fails.
    pub async fn get_image_url(&self, card: &CardRecord) -> Option<String> {
        if let Some(outcome) = self.cached(&card.id) {
            return outcome;
        }

        let pending = {
            let mut in_flight = self.lock_in_flight();
            match in_flight.get(&card.id) {
                Some(rx) => Err(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(card.id.clone(), rx);
                    Ok(tx)
                }
            }
        };

        let tx = match pending {
            Ok(tx) => tx,
            Err(rx) => return self.wait_for_in_flight(&card.id, rx).await,
        };
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            id: card.id.clone(),
        };

        let url = self.resolve(card).await;
        tx.send_replace(Some(url.clone()));
        url
    }

    async fn wait_for_in_flight(&self, id: &CardId, mut rx: watch::Receiver<Outcome>) -> Option<String> {
        match timeout(self.config.inflight_wait(), rx.wait_for(Option::is_some)).await {
            Ok(Ok(outcome)) => outcome.clone().flatten(),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(card = %id, "gave up waiting on in-flight image resolution");
                None
            }
        }
    }

    /// Probe the best-ranked candidate and cache the outcome.
    async fn resolve(&self, card: &CardRecord) -> Option<String> {
        let candidate = card.image_candidates().first().map(|url| url.to_string());

        let url = match candidate {
            None => {
                debug!(card = %card.id, "card has no image candidates");
                None
            }
            Some(url) => match timeout(self.config.probe_timeout(), self.probe.probe(&url)).await {
                Ok(true) => Some(url),
                Ok(false) => {
                    debug!(card = %card.id, url, "image failed to load");
                    None
                }
                Err(_) => {
                    warn!(card = %card.id, url, "image load timed out");
                    None
                }
            },
        };

        let entry = ImageCacheEntry {
            card_id: card.id.clone(),
            error: url.is_none(),
            image_url: url.clone(),
            cached_at: self.clock.now_ms(),
        };
        let mut cache = self.lock_cache();
        cache.insert(card.id.clone(), entry);
        self.persist(&mut cache);
        url
    }

    /// Resolve images ahead of time, `max_concurrent` at a time.
    ///
    /// Cards already cached or being resolved are skipped. Batches are
    /// separated by the configured delay.
    pub async fn preload(self: &Arc<Self>, cards: &[CardRecord], max_concurrent: usize) {
        let mut seen = FxHashSet::default();
        let pending: Vec<CardRecord> = cards
            .iter()
            .filter(|c| seen.insert(c.id.clone()))
            .filter(|c| self.cached(&c.id).is_none() && !self.is_in_flight(&c.id))
            .cloned()
            .collect();
        if pending.is_empty() {
            return;
        }
        debug!(cards = pending.len(), max_concurrent, "preloading images");

        for (i, batch) in pending.chunks(max_concurrent.max(1)).enumerate() {
            if i > 0 {
                sleep(self.config.preload_batch_delay()).await;
            }
            let mut tasks = JoinSet::new();
            for card in batch {
                let store = Arc::clone(self);
                let card = card.clone();
                tasks.spawn(async move { store.get_image_url(&card).await });
            }
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    warn!(error = %e, "image preload task failed");
                }
            }
        }
    }

    /// Preload with the configured concurrency.
    pub async fn preload_default(self: &Arc<Self>, cards: &[CardRecord]) {
        self.preload(cards, self.config.preload_concurrency).await;
    }

    /// Drop every entry, in memory and in durable storage.
    pub fn clear(&self) {
        self.lock_cache().clear();
        if let Err(e) = self.storage.remove(IMAGE_CACHE_KEY) {
            warn!(error = %e, "image cache removal failed");
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_cache().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_cache().is_empty()
    }

    pub fn stats(&self) -> ImageCacheStats {
        let cache = self.lock_cache();
        ImageCacheStats {
            cache: CacheStats::collect(&cache, self.clock.now_ms()),
            failed: cache.values().filter(|e| e.error).count(),
            in_flight: self.lock_in_flight().len(),
        }
    }
}

impl std::fmt::Debug for CardImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardImageStore")
            .field("entries", &self.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cards::{CardFace, ImageUris};
    use crate::core::ManualClock;
    use crate::resolver::mock::MockImageProbe;
    use crate::storage::MemoryStorage;

    struct Fixture {
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
        probe: Arc<MockImageProbe>,
        store: Arc<CardImageStore>,
    }

    fn fixture_with(probe: MockImageProbe, config: ImageCacheConfig) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(5_000_000));
        let probe = Arc::new(probe);
        let store = Arc::new(CardImageStore::new(config, probe.clone(), storage.clone(), clock.clone()));
        Fixture {
            storage,
            clock,
            probe,
            store,
        }
    }

    fn fixture(probe: MockImageProbe) -> Fixture {
        fixture_with(probe, ImageCacheConfig::default())
    }

    fn card(id: &str) -> CardRecord {
        CardRecord::new(id, id, "Creature").with_images(ImageUris {
            small: Some(format!("https://img/{}/small.jpg", id)),
            normal: Some(format!("https://img/{}/normal.jpg", id)),
            large: Some(format!("https://img/{}/large.jpg", id)),
        })
    }

    #[tokio::test]
    async fn test_resolves_normal_first_and_caches() {
        let f = fixture(MockImageProbe::new());

        let url = f.store.get_image_url(&card("elf")).await;
        assert_eq!(url.as_deref(), Some("https://img/elf/normal.jpg"));

        f.store.get_image_url(&card("elf")).await;
        assert_eq!(f.probe.calls(), 1);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_multi_faced_uses_first_face() {
        let f = fixture(MockImageProbe::new());
        let dfc = CardRecord::new("dfc", "Front // Back", "Creature").with_face(CardFace {
            name: "Front".into(),
            image_uris: Some(ImageUris {
                large: Some("https://img/dfc/front-large.jpg".into()),
                ..ImageUris::default()
            }),
        });

        assert_eq!(
            f.store.get_image_url(&dfc).await.as_deref(),
            Some("https://img/dfc/front-large.jpg")
        );
    }

    #[tokio::test]
    async fn test_failure_cached_as_negative() {
        let f = fixture(MockImageProbe::new().with_broken("https://img/bad/normal.jpg"));

        assert!(f.store.get_image_url(&card("bad")).await.is_none());
        assert!(f.store.get_image_url(&card("bad")).await.is_none());

        assert_eq!(f.probe.calls(), 1);
        let stats = f.store.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.cache.count, 1);

        let raw = f.storage.get(IMAGE_CACHE_KEY).unwrap().unwrap();
        assert!(raw.contains("\"imageUrl\":null"));
        assert!(raw.contains("\"error\":true"));
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let f = fixture(MockImageProbe::new());
        let bare = CardRecord::new("bare", "Bare", "Land");

        assert!(f.store.get_image_url(&bare).await.is_none());
        assert_eq!(f.probe.calls(), 0);
        assert_eq!(f.store.stats().failed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_negative() {
        let f = fixture(MockImageProbe::new().with_delay(Duration::from_secs(6)));

        assert!(f.store.get_image_url(&card("slow")).await.is_none());
        assert_eq!(f.store.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry_re_resolves() {
        let f = fixture(MockImageProbe::new());
        f.store.get_image_url(&card("elf")).await;

        f.clock.advance(Duration::from_secs(24 * 60 * 60));
        f.store.get_image_url(&card("elf")).await;
        assert_eq!(f.probe.calls(), 1);

        f.clock.advance(Duration::from_millis(1));
        f.store.get_image_url(&card("elf")).await;
        assert_eq!(f.probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_coalesce() {
        let f = fixture(MockImageProbe::new().with_delay(Duration::from_secs(1)));
        let elf = card("elf");

        let (a, b, c) = tokio::join!(
            f.store.get_image_url(&elf),
            f.store.get_image_url(&elf),
            f.store.get_image_url(&elf),
        );

        assert_eq!(f.probe.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(a.is_some());
        assert!(!f.store.is_in_flight(&elf.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_wait_times_out() {
        let config = ImageCacheConfig {
            probe_timeout_ms: 60_000,
            ..ImageCacheConfig::default()
        };
        let f = fixture_with(MockImageProbe::new().with_delay(Duration::from_secs(20)), config);
        let elf = card("elf");

        let (first, second) = tokio::join!(f.store.get_image_url(&elf), f.store.get_image_url(&elf));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(f.probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_batches() {
        let f = fixture(MockImageProbe::new());
        let cards: Vec<_> = (0..5).map(|i| card(&format!("c{}", i))).collect();

        let started = tokio::time::Instant::now();
        f.store.preload(&cards, 2).await;

        assert_eq!(f.probe.calls(), 5);
        assert_eq!(f.store.len(), 5);
        // Three batches, two pauses
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert!(started.elapsed() < Duration::from_millis(1500));

        f.store.preload_default(&cards).await;
        assert_eq!(f.probe.calls(), 5);
    }

    #[tokio::test]
    async fn test_reload_and_clear() {
        let f = fixture(MockImageProbe::new());
        f.store.get_image_url(&card("elf")).await;

        let reloaded = CardImageStore::new(
            ImageCacheConfig::default(),
            f.probe.clone(),
            f.storage.clone(),
            f.clock.clone(),
        );
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.get_image_url(&card("elf")).await.as_deref(),
            Some("https://img/elf/normal.jpg")
        );
        assert_eq!(f.probe.calls(), 1);

        reloaded.clear();
        assert!(reloaded.is_empty());
        assert!(!f.storage.contains(IMAGE_CACHE_KEY));
    }

    #[tokio::test]
    async fn test_capacity_bound() {
        let config = ImageCacheConfig {
            capacity: 3,
            ..ImageCacheConfig::default()
        };
        let f = fixture_with(MockImageProbe::new(), config);
        for i in 0..4 {
            f.store.get_image_url(&card(&format!("c{}", i))).await;
            f.clock.advance(Duration::from_secs(1));
        }

        assert_eq!(f.store.len(), 3);
        assert_eq!(f.store.stats().cache.max_size, 3);
    }
}
