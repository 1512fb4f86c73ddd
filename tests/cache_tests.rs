//! Card data cache tests.
//!
//! Record and image caches against a manual clock and quota-limited
//! storage, plus deck loading through the mock resolver.

use std::sync::Arc;
use std::time::Duration;

use deck_playtest::cache::{CardImageStore, CardRecordStore};
use deck_playtest::cards::{CardId, CardRecord, ImageUris};
use deck_playtest::core::{FetchConfig, ImageCacheConfig, ManualClock, RecordCacheConfig};
use deck_playtest::deck::Deck;
use deck_playtest::resolver::mock::{MockCardResolver, MockImageProbe};
use deck_playtest::resolver::CardLoader;
use deck_playtest::storage::{KeyValueStorage, MemoryStorage, CARD_CACHE_KEY};

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn record_store(storage: Arc<MemoryStorage>, clock: Arc<ManualClock>, capacity: usize) -> CardRecordStore {
    let config = RecordCacheConfig {
        capacity,
        ..RecordCacheConfig::default()
    };
    CardRecordStore::new(&config, storage, clock)
}

fn with_image(id: &str) -> CardRecord {
    CardRecord::new(id, id.to_uppercase(), "Creature").with_images(ImageUris {
        normal: Some(format!("https://img.test/{id}/normal.jpg")),
        ..ImageUris::default()
    })
}

// =============================================================================
// Record cache
// =============================================================================

/// Records survive six days and are gone after seven days and a minute.
#[test]
fn test_record_ttl() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = record_store(Arc::new(MemoryStorage::new()), clock.clone(), 100);

    store.put(CardRecord::new("bolt", "Lightning Bolt", "Instant"));

    clock.advance(6 * DAY);
    assert!(store.get(&CardId::new("bolt")).is_some());

    clock.advance(DAY + Duration::from_secs(60));
    assert!(store.get(&CardId::new("bolt")).is_none());
    assert!(store.is_empty());
}

/// A full cache evicts the oldest tenth before admitting a new record.
#[test]
fn test_record_eviction_bound() {
    let clock = Arc::new(ManualClock::new(0));
    let store = record_store(Arc::new(MemoryStorage::new()), clock.clone(), 20);

    for i in 0..20 {
        store.put(CardRecord::new(format!("card-{i}"), "C", "Land"));
        clock.advance(Duration::from_secs(1));
    }
    assert_eq!(store.len(), 20);

    store.put(CardRecord::new("newcomer", "N", "Land"));

    assert_eq!(store.len(), 19);
    assert!(store.get(&CardId::new("card-0")).is_none());
    assert!(store.get(&CardId::new("card-1")).is_none());
    assert!(store.get(&CardId::new("card-2")).is_some());
    assert!(store.get(&CardId::new("newcomer")).is_some());
}

/// Replacing a cached key never evicts.
#[test]
fn test_record_replace_at_capacity() {
    let clock = Arc::new(ManualClock::new(0));
    let store = record_store(Arc::new(MemoryStorage::new()), clock, 3);
    for id in ["a", "b", "c"] {
        store.put(CardRecord::new(id, id, "Land"));
    }

    store.put(CardRecord::new("b", "B again", "Land"));

    assert_eq!(store.len(), 3);
    assert_eq!(store.get(&CardId::new("b")).unwrap().name, "B again");
}

/// A fresh store picks up what an earlier one persisted.
#[test]
fn test_record_store_reload() {
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(0));

    let first = record_store(storage.clone(), clock.clone(), 100);
    first.put_many([
        CardRecord::new("forest", "Forest", "Basic Land — Forest"),
        CardRecord::new("bolt", "Lightning Bolt", "Instant"),
    ]);

    let second = record_store(storage, clock, 100);
    let cached = second.get_many([&CardId::new("forest"), &CardId::new("elf")]);

    assert_eq!(cached.found.len(), 1);
    assert_eq!(cached.missing, vec![CardId::new("elf")]);
}

/// Hitting the storage quota clears the cache instead of failing the write.
#[test]
fn test_record_quota_exceeded() {
    let storage = Arc::new(MemoryStorage::with_quota(600));
    let clock = Arc::new(ManualClock::new(0));
    let store = record_store(storage.clone(), clock, 100);

    for i in 0..20 {
        store.put(CardRecord::new(format!("card-{i}"), "Some Card", "Creature — Elf"));
    }

    assert!(store.len() < 20);
    assert!(storage.used_bytes() <= 600);
    // Whatever is in memory is what storage holds.
    let persisted = storage.get(CARD_CACHE_KEY).unwrap().unwrap_or_default();
    assert_eq!(persisted.matches("\"id\"").count(), store.len());
}

/// A corrupt persisted cache loads as empty.
#[test]
fn test_record_store_corrupt_storage() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(CARD_CACHE_KEY, "{not json").unwrap();

    let store = record_store(storage, Arc::new(ManualClock::new(0)), 100);

    assert!(store.is_empty());
    assert_eq!(store.stats().count, 0);
}

// =============================================================================
// Image cache
// =============================================================================

fn image_store(probe: Arc<MockImageProbe>, clock: Arc<ManualClock>) -> Arc<CardImageStore> {
    Arc::new(CardImageStore::new(
        ImageCacheConfig::default(),
        probe,
        Arc::new(MemoryStorage::new()),
        clock,
    ))
}

/// Resolved URLs are reused for a day and re-probed after.
#[tokio::test(start_paused = true)]
async fn test_image_ttl() {
    let probe = Arc::new(MockImageProbe::new());
    let clock = Arc::new(ManualClock::new(0));
    let store = image_store(probe.clone(), clock.clone());
    let card = with_image("elf");

    let url = store.get_image_url(&card).await;
    assert_eq!(url.as_deref(), Some("https://img.test/elf/normal.jpg"));

    clock.advance(23 * HOUR);
    assert_eq!(store.get_image_url(&card).await, url);
    assert_eq!(probe.calls(), 1);

    clock.advance(2 * HOUR);
    assert_eq!(store.get_image_url(&card).await, url);
    assert_eq!(probe.calls(), 2);
}

/// A broken image is remembered as a failure and not probed again.
#[tokio::test(start_paused = true)]
async fn test_image_negative_cache() {
    let probe = Arc::new(MockImageProbe::new().with_broken("https://img.test/elf/normal.jpg"));
    let store = image_store(probe.clone(), Arc::new(ManualClock::new(0)));
    let card = with_image("elf");

    assert!(store.get_image_url(&card).await.is_none());
    assert!(store.get_image_url(&card).await.is_none());

    assert_eq!(probe.calls(), 1);
    assert_eq!(store.stats().failed, 1);
}

/// Concurrent requests for one card share a single probe.
#[tokio::test(start_paused = true)]
async fn test_image_requests_deduplicated() {
    let probe = Arc::new(MockImageProbe::new().with_delay(Duration::from_millis(200)));
    let store = image_store(probe.clone(), Arc::new(ManualClock::new(0)));
    let card = with_image("elf");

    let (a, b, c) = tokio::join!(
        store.get_image_url(&card),
        store.get_image_url(&card),
        store.get_image_url(&card),
    );

    assert_eq!(probe.calls(), 1);
    assert!(a.is_some());
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(!store.is_in_flight(&card.id));
}

/// Preloading resolves each distinct card once.
#[tokio::test(start_paused = true)]
async fn test_image_preload() {
    let probe = Arc::new(MockImageProbe::new());
    let store = image_store(probe.clone(), Arc::new(ManualClock::new(0)));
    let cards: Vec<_> = ["a", "b", "c", "a", "d"].iter().map(|id| with_image(id)).collect();

    store.preload(&cards, 2).await;
    assert_eq!(store.len(), 4);
    assert_eq!(probe.calls(), 4);

    store.preload_default(&cards).await;
    assert_eq!(probe.calls(), 4);
}

// =============================================================================
// Deck loading
// =============================================================================

/// Loading a deck fetches only uncached ids and caches placeholders for the rest.
#[tokio::test(start_paused = true)]
async fn test_deck_loading() {
    let clock = Arc::new(ManualClock::new(0));
    let store = Arc::new(record_store(Arc::new(MemoryStorage::new()), clock, 100));
    store.put(CardRecord::new("forest", "Forest", "Basic Land — Forest"));

    let resolver = Arc::new(MockCardResolver::new([
        CardRecord::new("bolt", "Lightning Bolt", "Instant"),
        CardRecord::new("elf", "Llanowar Elves", "Creature — Elf Druid"),
    ]));
    let loader = CardLoader::new(store.clone(), resolver.clone(), FetchConfig::default());
    let deck = Deck::from_counts("d", "D", [("forest", 30), ("bolt", 4), ("elf", 4), ("ghost", 1)]);

    let report = loader.load_deck_cards(&deck).await;

    assert_eq!(report.from_cache, 1);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.not_found, vec![CardId::new("ghost")]);
    assert_eq!(report.placeholders().count(), 1);
    assert_eq!(store.len(), 4);

    let again = loader.load_deck_cards(&deck).await;
    assert_eq!(again.from_cache, 4);
    assert_eq!(resolver.collection_calls(), 1);
}
