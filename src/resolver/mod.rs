//! Seams to the external card API.
//!
//! The crate does not talk HTTP itself. An embedding application supplies a
//! `CardResolver` (card data) and an `ImageProbe` (does this image URL
//! load?). The loader and search types here add chunking, pacing, caching
//! and staleness handling on top.
//!
//! ## Key Types
//!
//! - `CardResolver`: batched and single card fetches plus free-text search
//! - `ImageProbe`: image load validation
//! - `CardLoader`: deck loading through the record store with per-item fallback
//! - `CardSearch`: cached search that drops superseded results
//! - `mock`: in-memory implementations for tests and offline use

pub mod loader;
pub mod mock;
pub mod search;

use async_trait::async_trait;
use thiserror::Error;

use crate::cards::{CardId, CardRecord};

pub use loader::{CardLoader, LoadReport};
pub use search::{CardSearch, SearchOutcome};

/// Errors returned by a card resolver.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("card not found: {0}")]
    NotFound(CardId),

    #[error("card API request failed: {0}")]
    Request(String),

    #[error("invalid card API response: {0}")]
    InvalidResponse(String),
}

/// Response to a batched collection fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionResponse {
    pub data: Vec<CardRecord>,
    /// Requested ids the API does not know.
    pub not_found: Vec<CardId>,
}

/// Remote source of card data.
#[async_trait]
pub trait CardResolver: Send + Sync {
    /// Fetch up to one chunk of cards (75 for the public card API).
    async fn fetch_collection(&self, ids: &[CardId]) -> Result<CollectionResponse, ResolveError>;

    /// Fetch a single card.
    async fn fetch_card(&self, id: &CardId) -> Result<CardRecord, ResolveError>;

    /// Ranked free-text search.
    async fn search(&self, query: &str) -> Result<Vec<CardRecord>, ResolveError>;
}

/// Checks that an image URL actually loads.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> bool;
}
