//! Card lookup.
//!
//! Game code resolves `CardId -> CardRecord` through the `CardLookup` trait.
//! The record store implements it for live play; `CardRegistry` is a plain
//! in-memory implementation for fixed card pools.

use rustc_hash::FxHashMap;

use super::record::{CardId, CardRecord};

/// Resolve card metadata by id.
pub trait CardLookup {
    /// Get the record for a card, if known.
    fn lookup(&self, id: &CardId) -> Option<CardRecord>;
}

/// Registry of card records.
///
/// ## Example
///
/// ```
/// use deck_playtest::cards::{CardId, CardLookup, CardRecord, CardRegistry};
///
/// let mut registry = CardRegistry::new();
/// registry.register(CardRecord::new("bolt", "Lightning Bolt", "Instant"));
///
/// let found = registry.lookup(&CardId::new("bolt")).unwrap();
/// assert_eq!(found.name, "Lightning Bolt");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardRecord>,
}

impl CardRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from records.
    pub fn from_records(records: impl IntoIterator<Item = CardRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.register(record);
        }
        registry
    }

    /// Register a record, replacing any previous record with the same id.
    pub fn register(&mut self, card: CardRecord) {
        self.cards.insert(card.id.clone(), card);
    }

    /// Get a record by id.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&CardRecord> {
        self.cards.get(id)
    }

    /// Check if a card id is registered.
    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.cards.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all records.
    pub fn iter(&self) -> impl Iterator<Item = &CardRecord> {
        self.cards.values()
    }
}

impl CardLookup for CardRegistry {
    fn lookup(&self, id: &CardId) -> Option<CardRecord> {
        self.cards.get(id).cloned()
    }
}

impl<T: CardLookup + ?Sized> CardLookup for &T {
    fn lookup(&self, id: &CardId) -> Option<CardRecord> {
        (**self).lookup(id)
    }
}
