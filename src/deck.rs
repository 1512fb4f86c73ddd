//! Deck lists.
//!
//! A deck is owned by the external deck service; the playtest only reads its
//! id and its card counts. Entries keep insertion order, which is the order
//! deck expansion walks (and therefore the commander tie-break).

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, CardLookup};

/// One line of a deck list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card_id: CardId,
    pub quantity: u32,
}

/// A named deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<DeckEntry>,
}

/// Card counts by broad type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeckComposition {
    pub total: u32,
    pub creatures: u32,
    pub lands: u32,
    /// Instants and sorceries.
    pub spells: u32,
}

impl Deck {
    /// Create an empty deck.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cards: Vec::new(),
        }
    }

    /// Build a deck from `(card_id, quantity)` pairs, in order.
    pub fn from_counts<I, K>(id: impl Into<String>, name: impl Into<String>, counts: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<CardId>,
    {
        let mut deck = Self::new(id, name);
        for (card_id, quantity) in counts {
            deck.add_card(card_id, quantity);
        }
        deck
    }

    /// Add copies of a card (builder pattern).
    #[must_use]
    pub fn with_card(mut self, card_id: impl Into<CardId>, quantity: u32) -> Self {
        self.add_card(card_id, quantity);
        self
    }

    /// Add copies of a card, merging with an existing entry.
    pub fn add_card(&mut self, card_id: impl Into<CardId>, quantity: u32) {
        let card_id = card_id.into();
        match self.cards.iter_mut().find(|e| e.card_id == card_id) {
            Some(entry) => entry.quantity += quantity,
            None if quantity > 0 => self.cards.push(DeckEntry { card_id, quantity }),
            None => {}
        }
    }

    /// Set a card's quantity. Zero removes the entry.
    pub fn set_quantity(&mut self, card_id: &CardId, quantity: u32) {
        if quantity == 0 {
            self.cards.retain(|e| &e.card_id != card_id);
            return;
        }
        match self.cards.iter_mut().find(|e| &e.card_id == card_id) {
            Some(entry) => entry.quantity = quantity,
            None => self.cards.push(DeckEntry {
                card_id: card_id.clone(),
                quantity,
            }),
        }
    }

    /// Copies of a card in the deck.
    #[must_use]
    pub fn quantity(&self, card_id: &CardId) -> u32 {
        self.cards
            .iter()
            .find(|e| &e.card_id == card_id)
            .map_or(0, |e| e.quantity)
    }

    /// Distinct card ids, in deck order.
    pub fn card_ids(&self) -> impl Iterator<Item = &CardId> {
        self.cards.iter().map(|e| &e.card_id)
    }

    /// Total number of cards.
    #[must_use]
    pub fn total_cards(&self) -> u32 {
        self.cards.iter().map(|e| e.quantity).sum()
    }

    /// Count cards by type using cached metadata. Unknown cards only count
    /// towards the total.
    pub fn composition(&self, lookup: &impl CardLookup) -> DeckComposition {
        let mut counts = DeckComposition::default();
        for entry in &self.cards {
            counts.total += entry.quantity;
            let Some(record) = lookup.lookup(&entry.card_id) else {
                continue;
            };
            if record.is_creature() {
                counts.creatures += entry.quantity;
            }
            if record.is_land() {
                counts.lands += entry.quantity;
            }
            if record.is_spell() {
                counts.spells += entry.quantity;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardRecord, CardRegistry};

    #[test]
    fn test_from_counts_keeps_order() {
        let deck = Deck::from_counts("d1", "Elves", [("b", 1), ("a", 2), ("c", 3)]);
        let ids: Vec<_> = deck.card_ids().map(CardId::as_str).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(deck.total_cards(), 6);
    }

    #[test]
    fn test_add_merges() {
        let deck = Deck::new("d", "D").with_card("a", 1).with_card("a", 2).with_card("z", 0);
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.quantity(&CardId::new("a")), 3);
        assert_eq!(deck.quantity(&CardId::new("z")), 0);
    }

    #[test]
    fn test_set_quantity() {
        let mut deck = Deck::new("d", "D").with_card("a", 1);
        deck.set_quantity(&CardId::new("a"), 4);
        deck.set_quantity(&CardId::new("b"), 2);
        assert_eq!(deck.total_cards(), 6);

        deck.set_quantity(&CardId::new("a"), 0);
        assert_eq!(deck.quantity(&CardId::new("a")), 0);
        assert_eq!(deck.cards.len(), 1);
    }

    #[test]
    fn test_composition() {
        let registry = CardRegistry::from_records([
            CardRecord::new("elf", "Elf", "Creature — Elf"),
            CardRecord::new("forest", "Forest", "Basic Land — Forest"),
            CardRecord::new("bolt", "Bolt", "Instant"),
            CardRecord::new("dryad", "Dryad Arbor", "Land Creature — Forest Dryad"),
        ]);
        let deck = Deck::from_counts(
            "d",
            "D",
            [("elf", 4), ("forest", 10), ("bolt", 3), ("dryad", 1), ("unknown", 2)],
        );

        let counts = deck.composition(&registry);
        assert_eq!(counts.total, 20);
        assert_eq!(counts.creatures, 5);
        assert_eq!(counts.lands, 11);
        assert_eq!(counts.spells, 3);
    }
}
