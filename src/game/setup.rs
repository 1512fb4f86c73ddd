//! Deck expansion and commander identification.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::cards::{CardId, CardInstance, CardLookup};
use crate::deck::DeckEntry;

/// Expand a deck list into one instance per copy.
///
/// Walks entries in deck order and names copies `{card_id}_{copy_index}`,
/// so the same deck always yields the same ids. Cards the lookup cannot
/// resolve are left out.
pub fn expand_deck(cards: &[DeckEntry], lookup: &impl CardLookup) -> Vec<CardInstance> {
    let mut instances = Vec::with_capacity(cards.iter().map(|e| e.quantity as usize).sum());
    for entry in cards {
        if lookup.lookup(&entry.card_id).is_none() {
            debug!(card = %entry.card_id, "card metadata unavailable, skipped during expansion");
            continue;
        }
        for copy in 0..entry.quantity {
            instances.push(CardInstance::new(entry.card_id.clone(), copy));
        }
    }
    instances
}

/// Index of the first legendary creature or planeswalker, in expansion order.
pub fn find_commander(instances: &[CardInstance], lookup: &impl CardLookup) -> Option<usize> {
    let mut checked: FxHashMap<&CardId, bool> = FxHashMap::default();
    instances.iter().position(|instance| {
        *checked.entry(&instance.card_id).or_insert_with(|| {
            lookup
                .lookup(&instance.card_id)
                .is_some_and(|record| record.is_commander_candidate())
        })
    })
}
