//! Deck card loading through the record store.
//!
//! Only ids the record store cannot answer are fetched. Missing ids go out
//! in chunks with a pause between requests. A failed chunk falls back to one
//! request per card with the same pacing. Ids the API does not know, and
//! ids whose single fetch fails, are cached as "card not found" placeholders
//! so the deck still renders.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use super::{CardResolver, ResolveError};
use crate::cache::CardRecordStore;
use crate::cards::{CardId, CardRecord};
use crate::core::FetchConfig;
use crate::deck::Deck;

/// What a load did.
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    /// Every requested card, placeholders included.
    pub records: FxHashMap<CardId, CardRecord>,
    /// Ids answered from the record store.
    pub from_cache: usize,
    /// Ids fetched successfully.
    pub fetched: usize,
    /// Ids the API reported as unknown.
    pub not_found: Vec<CardId>,
    /// Collection requests that failed and fell back to single fetches.
    pub failed_chunks: usize,
    /// Ids whose single fetch also failed.
    pub failed: Vec<CardId>,
}

impl LoadReport {
    /// Ids that ended up as placeholders.
    pub fn placeholders(&self) -> impl Iterator<Item = &CardId> {
        self.not_found.iter().chain(&self.failed)
    }

    /// Whether any chunk had to fall back.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.failed_chunks > 0
    }
}

/// Loads card metadata for decks.
pub struct CardLoader {
    store: Arc<CardRecordStore>,
    resolver: Arc<dyn CardResolver>,
    config: FetchConfig,
}

impl CardLoader {
    pub fn new(store: Arc<CardRecordStore>, resolver: Arc<dyn CardResolver>, config: FetchConfig) -> Self {
        Self { store, resolver, config }
    }

    /// Make sure every card of `deck` is in the record store.
    pub async fn load_deck_cards(&self, deck: &Deck) -> LoadReport {
        let ids: Vec<CardId> = deck.card_ids().cloned().collect();
        self.load_cards(&ids).await
    }

    /// Make sure every id is in the record store.
    pub async fn load_cards(&self, ids: &[CardId]) -> LoadReport {
        let mut seen = FxHashSet::default();
        let unique: Vec<&CardId> = ids.iter().filter(|id| seen.insert(*id)).collect();

        let cached = self.store.get_many(unique.iter().copied());
        let mut report = LoadReport {
            from_cache: cached.found.len(),
            records: cached.found,
            ..LoadReport::default()
        };
        if cached.missing.is_empty() {
            return report;
        }

        info!(
            cached = report.from_cache,
            missing = cached.missing.len(),
            "fetching missing cards"
        );

        let chunk_size = self.config.chunk_size.max(1);
        for (i, chunk) in cached.missing.chunks(chunk_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.pause()).await;
            }
            match self.resolver.fetch_collection(chunk).await {
                Ok(response) => {
                    let returned: FxHashSet<CardId> = response.data.iter().map(|c| c.id.clone()).collect();
                    report.fetched += response.data.len();
                    self.accept(&mut report, response.data);

                    // Anything neither returned nor reported is unknown too.
                    let unknown = response
                        .not_found
                        .into_iter()
                        .chain(chunk.iter().filter(|id| !returned.contains(*id)).cloned())
                        .collect::<FxHashSet<_>>();
                    let mut unknown: Vec<CardId> = unknown.into_iter().collect();
                    unknown.sort();
                    self.placeholder(&mut report, &unknown);
                    report.not_found.extend(unknown);
                }
                Err(e) => {
                    warn!(error = %e, chunk = i, size = chunk.len(), "collection fetch failed, falling back to single fetches");
                    report.failed_chunks += 1;
                    self.fetch_one_by_one(&mut report, chunk).await;
                }
            }
        }

        debug!(
            fetched = report.fetched,
            not_found = report.not_found.len(),
            failed = report.failed.len(),
            "card load finished"
        );
        report
    }

    async fn fetch_one_by_one(&self, report: &mut LoadReport, ids: &[CardId]) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.pause()).await;
            }
            match self.resolver.fetch_card(id).await {
                Ok(card) => {
                    report.fetched += 1;
                    self.accept(report, vec![card]);
                }
                Err(ResolveError::NotFound(id)) => {
                    self.placeholder(report, std::slice::from_ref(&id));
                    report.not_found.push(id);
                }
                Err(e) => {
                    warn!(card = %id, error = %e, "card fetch failed");
                    self.placeholder(report, std::slice::from_ref(id));
                    report.failed.push(id.clone());
                }
            }
        }
    }

    fn accept(&self, report: &mut LoadReport, cards: Vec<CardRecord>) {
        if cards.is_empty() {
            return;
        }
        for card in &cards {
            report.records.insert(card.id.clone(), card.clone());
        }
        self.store.put_many(cards);
    }

    fn placeholder(&self, report: &mut LoadReport, ids: &[CardId]) {
        let placeholders: Vec<CardRecord> = ids.iter().cloned().map(CardRecord::not_found).collect();
        self.accept(report, placeholders);
    }
}
