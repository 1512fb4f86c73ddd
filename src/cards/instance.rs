//! Card instances - one physical copy of a card in a playtest.
//!
//! `CardInstance` refers to its `CardRecord` by id only. Shared metadata is
//! never copied into an instance; the only mutable fields are the ones a
//! player changes during a game (tapped, counters, position).
//!
//! ## Instance IDs
//!
//! Deck copies are named `{card_id}_{copy_index}`, so expanding the same deck
//! twice yields the same ids. That is what lets a saved session refer to
//! instances by id alone. Tokens get fresh `token_*` ids that never collide
//! with deck copies.

use serde::{Deserialize, Serialize};

use super::record::CardId;

/// Unique id of a card instance within one game session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl InstanceId {
    /// Id of the `copy_index`-th copy of `card_id` in a deck.
    #[must_use]
    pub fn for_copy(card_id: &CardId, copy_index: u32) -> Self {
        Self(format!("{}_{}", card_id, copy_index))
    }

    /// Id for a freshly minted token.
    #[must_use]
    pub fn token(sequence: u64, salt: u32) -> Self {
        Self(format!("token_{}_{:08x}", sequence, salt))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_token(&self) -> bool {
        self.0.starts_with("token_")
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form battlefield coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A card instance in a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardInstance {
    pub instance_id: InstanceId,

    /// Lookup key into the record store. Never owned.
    pub card_id: CardId,

    pub tapped: bool,

    pub counters: u32,

    /// Only meaningful on the battlefield.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(default)]
    pub is_token: bool,

    /// Display name chosen when the token was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
}

impl CardInstance {
    /// Create the `copy_index`-th copy of a deck card.
    #[must_use]
    pub fn new(card_id: CardId, copy_index: u32) -> Self {
        Self {
            instance_id: InstanceId::for_copy(&card_id, copy_index),
            card_id,
            tapped: false,
            counters: 0,
            position: None,
            is_token: false,
            token_name: None,
        }
    }

    /// Create a token copying `template`'s card reference.
    #[must_use]
    pub fn token(
        template: &CardInstance,
        instance_id: InstanceId,
        name: Option<String>,
        position: Position,
    ) -> Self {
        Self {
            instance_id,
            card_id: template.card_id.clone(),
            tapped: false,
            counters: 0,
            position: Some(position),
            is_token: true,
            token_name: name,
        }
    }

    /// Flip the tapped flag.
    pub fn toggle_tap(&mut self) {
        self.tapped = !self.tapped;
    }

    pub fn add_counter(&mut self) {
        self.counters = self.counters.saturating_add(1);
    }

    /// Remove one counter, never going below zero.
    pub fn remove_counter(&mut self) {
        self.counters = self.counters.saturating_sub(1);
    }

    /// Drop everything the card picked up while in play.
    pub fn clear_transient(&mut self) {
        self.tapped = false;
        self.counters = 0;
        self.position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_ids() {
        let bolt = CardId::new("bolt");
        assert_eq!(CardInstance::new(bolt.clone(), 0).instance_id.as_str(), "bolt_0");
        assert_eq!(CardInstance::new(bolt, 19).instance_id.as_str(), "bolt_19");
    }

    #[test]
    fn test_new_instance_defaults() {
        let instance = CardInstance::new(CardId::new("forest"), 3);
        assert!(!instance.tapped);
        assert_eq!(instance.counters, 0);
        assert!(instance.position.is_none());
        assert!(!instance.is_token);
    }

    #[test]
    fn test_counters_floor_at_zero() {
        let mut instance = CardInstance::new(CardId::new("c"), 0);
        instance.remove_counter();
        assert_eq!(instance.counters, 0);

        instance.add_counter();
        instance.add_counter();
        instance.remove_counter();
        assert_eq!(instance.counters, 1);
    }

    #[test]
    fn test_token_copies_card_reference() {
        let mut template = CardInstance::new(CardId::new("elf"), 0);
        template.tapped = true;
        template.counters = 4;

        let token = CardInstance::token(
            &template,
            InstanceId::token(1, 0xabc),
            Some("Elf Token".into()),
            Position::new(150.0, 120.0),
        );

        assert_eq!(token.card_id, template.card_id);
        assert!(token.is_token);
        assert!(token.instance_id.is_token());
        assert!(!token.tapped);
        assert_eq!(token.counters, 0);
        assert_eq!(token.position, Some(Position::new(150.0, 120.0)));
        assert_eq!(token.instance_id.as_str(), "token_1_00000abc");
    }

    #[test]
    fn test_clear_transient() {
        let mut instance = CardInstance::new(CardId::new("c"), 0);
        instance.tapped = true;
        instance.counters = 2;
        instance.position = Some(Position::new(1.0, 2.0));

        instance.clear_transient();
        assert!(!instance.tapped);
        assert_eq!(instance.counters, 0);
        assert!(instance.position.is_none());
    }

    #[test]
    fn test_card_instance_serialization() {
        let mut instance = CardInstance::new(CardId::new("c"), 0);
        instance.counters = 3;

        let json = serde_json::to_string(&instance).unwrap();
        let deserialized: CardInstance = serde_json::from_str(&json).unwrap();

        assert_eq!(instance, deserialized);
    }
}
