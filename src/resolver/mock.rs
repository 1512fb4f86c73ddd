//! In-memory resolver and probe for testing without network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{CardResolver, CollectionResponse, ImageProbe, ResolveError};
use crate::cards::{CardId, CardRecord};

/// Card resolver over a fixed card pool.
///
/// Collection fetches can be made to fail wholesale, and single-card fetches
/// can fail per id, to exercise the loader's fallback path.
#[derive(Debug, Default)]
pub struct MockCardResolver {
    cards: FxHashMap<CardId, CardRecord>,
    fail_collections: AtomicBool,
    failing_ids: Mutex<FxHashSet<CardId>>,
    search_delays: FxHashMap<String, Duration>,
    collection_calls: AtomicUsize,
    card_calls: AtomicUsize,
}

impl MockCardResolver {
    pub fn new(cards: impl IntoIterator<Item = CardRecord>) -> Self {
        Self {
            cards: cards.into_iter().map(|c| (c.id.clone(), c)).collect(),
            ..Self::default()
        }
    }

    /// Make every collection fetch fail.
    pub fn fail_collections(&self, fail: bool) {
        self.fail_collections.store(fail, Ordering::SeqCst);
    }

    /// Make single fetches of `id` fail with a request error.
    pub fn fail_card(&self, id: impl Into<CardId>) {
        self.failing_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into());
    }

    /// Delay responses to one search query.
    #[must_use]
    pub fn with_search_delay(mut self, query: impl Into<String>, delay: Duration) -> Self {
        self.search_delays.insert(query.into(), delay);
        self
    }

    pub fn collection_calls(&self) -> usize {
        self.collection_calls.load(Ordering::SeqCst)
    }

    pub fn card_calls(&self) -> usize {
        self.card_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardResolver for MockCardResolver {
    async fn fetch_collection(&self, ids: &[CardId]) -> Result<CollectionResponse, ResolveError> {
        self.collection_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_collections.load(Ordering::SeqCst) {
            return Err(ResolveError::Request("collection endpoint unavailable".into()));
        }

        let mut response = CollectionResponse::default();
        for id in ids {
            match self.cards.get(id) {
                Some(card) => response.data.push(card.clone()),
                None => response.not_found.push(id.clone()),
            }
        }
        Ok(response)
    }

    async fn fetch_card(&self, id: &CardId) -> Result<CardRecord, ResolveError> {
        self.card_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id);
        if failing {
            return Err(ResolveError::Request(format!("fetch of {} failed", id)));
        }
        self.cards
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(id.clone()))
    }

    async fn search(&self, query: &str) -> Result<Vec<CardRecord>, ResolveError> {
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        let needle = query.to_lowercase();
        let mut hits: Vec<CardRecord> = self
            .cards
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(hits)
    }
}

/// Image probe that accepts every URL except the ones marked broken.
#[derive(Debug, Default)]
pub struct MockImageProbe {
    broken: FxHashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockImageProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a URL as failing to load.
    #[must_use]
    pub fn with_broken(mut self, url: impl Into<String>) -> Self {
        self.broken.insert(url.into());
        self
    }

    /// Delay every probe.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of probes started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProbe for MockImageProbe {
    async fn probe(&self, url: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        !self.broken.contains(url)
    }
}
