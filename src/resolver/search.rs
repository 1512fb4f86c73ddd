//! Free-text card search sharing the record store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::{CardResolver, ResolveError};
use crate::cache::CardRecordStore;
use crate::cards::CardRecord;
use crate::core::FetchConfig;

/// Result of a search call.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<CardRecord>),
    /// A newer search started while this one was running; its results were
    /// dropped.
    Superseded,
}

/// Card search with result capping, caching and staleness detection.
///
/// There is no cancellation. Each call takes a generation number, and a
/// result is only returned if no newer call has started since.
pub struct CardSearch {
    resolver: Arc<dyn CardResolver>,
    store: Arc<CardRecordStore>,
    limit: usize,
    generation: AtomicU64,
}

impl CardSearch {
    pub fn new(resolver: Arc<dyn CardResolver>, store: Arc<CardRecordStore>, config: &FetchConfig) -> Self {
        Self {
            resolver,
            store,
            limit: config.search_limit,
            generation: AtomicU64::new(0),
        }
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome, ResolveError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome::Results(Vec::new()));
        }

        let mut results = self.resolver.search(query).await?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(query, "search superseded");
            return Ok(SearchOutcome::Superseded);
        }

        results.truncate(self.limit);
        self.store.put_many(results.iter().cloned());
        Ok(SearchOutcome::Results(results))
    }
}
