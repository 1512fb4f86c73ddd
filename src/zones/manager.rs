//! Zone manager for card locations and movement.
//!
//! The `ZoneManager` owns every in-zone `CardInstance` and tracks which zone
//! each instance id is in. It guarantees:
//! - An instance id is in at most one zone (adds of a present id are refused)
//! - Moves are remove-then-insert, never copies
//! - Leaving the battlefield clears a card's position
//!
//! Zone sequences are `im::Vector`s so cloning a whole session is cheap.

use im::Vector;
use rustc_hash::FxHashMap;
use tracing::warn;

use super::zone::{Zone, ZonePosition};
use crate::cards::{CardInstance, InstanceId};
use crate::core::RandomSource;
use crate::game::shuffle::shuffle;

/// Manages card locations across the six zones.
///
/// ## Usage
///
/// ```
/// use deck_playtest::cards::{CardId, CardInstance};
/// use deck_playtest::zones::{Zone, ZoneManager};
///
/// let mut manager = ZoneManager::new();
/// let card = CardInstance::new(CardId::new("bolt"), 0);
/// let id = card.instance_id.clone();
///
/// manager.add(card, Zone::Hand, None);
/// assert!(manager.move_card(&id, Zone::Hand, Zone::Graveyard, None));
/// assert_eq!(manager.zone_of(&id), Some(Zone::Graveyard));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    /// Card locations: instance_id -> zone
    locations: FxHashMap<InstanceId, Zone>,

    /// Card sequences, indexed by `Zone::index`.
    zones: [Vector<CardInstance>; 6],
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card to a zone.
    ///
    /// Returns `false` (and leaves everything untouched) if the instance id
    /// is already in some zone.
    pub fn add(&mut self, mut instance: CardInstance, zone: Zone, position: Option<ZonePosition>) -> bool {
        if let Some(existing) = self.locations.get(&instance.instance_id) {
            warn!(instance = %instance.instance_id, zone = %existing, "instance already placed, add refused");
            return false;
        }

        if zone != Zone::Battlefield {
            instance.position = None;
        }

        self.locations.insert(instance.instance_id.clone(), zone);
        let cards = &mut self.zones[zone.index()];
        match position.unwrap_or_else(|| zone.default_position()) {
            ZonePosition::Head => cards.push_front(instance),
            ZonePosition::Tail => cards.push_back(instance),
            ZonePosition::Index(i) => {
                let idx = i.min(cards.len());
                cards.insert(idx, instance);
            }
        }
        true
    }

    /// Remove a card from `zone` only.
    ///
    /// Returns `None` if the card is not in that zone.
    pub fn take(&mut self, id: &InstanceId, zone: Zone) -> Option<CardInstance> {
        if self.locations.get(id) != Some(&zone) {
            return None;
        }
        let cards = &mut self.zones[zone.index()];
        let idx = cards.iter().position(|c| &c.instance_id == id)?;
        self.locations.remove(id);
        Some(cards.remove(idx))
    }

    /// Remove a card from whichever zone holds it.
    pub fn remove(&mut self, id: &InstanceId) -> Option<(Zone, CardInstance)> {
        let zone = self.zone_of(id)?;
        self.take(id, zone).map(|card| (zone, card))
    }

    /// Move a card from one zone to another.
    ///
    /// No-op returning `false` if the card isn't in `from`. Moving a card to
    /// the zone it is already in leaves it where it is.
    pub fn move_card(
        &mut self,
        id: &InstanceId,
        from: Zone,
        to: Zone,
        position: Option<ZonePosition>,
    ) -> bool {
        if self.locations.get(id) != Some(&from) {
            return false;
        }
        if from == to {
            return true;
        }
        match self.take(id, from) {
            Some(card) => self.add(card, to, position),
            None => false,
        }
    }

    /// Get the zone a card is in.
    #[must_use]
    pub fn zone_of(&self, id: &InstanceId) -> Option<Zone> {
        self.locations.get(id).copied()
    }

    /// Check if a card is in a specific zone.
    #[must_use]
    pub fn is_in_zone(&self, id: &InstanceId, zone: Zone) -> bool {
        self.locations.get(id) == Some(&zone)
    }

    /// Look up an in-zone card.
    #[must_use]
    pub fn get(&self, id: &InstanceId) -> Option<&CardInstance> {
        let zone = self.zone_of(id)?;
        self.zones[zone.index()].iter().find(|c| &c.instance_id == id)
    }

    /// Mutable access to an in-zone card.
    pub fn get_mut(&mut self, id: &InstanceId) -> Option<&mut CardInstance> {
        let zone = self.zone_of(id)?;
        self.zones[zone.index()]
            .iter_mut()
            .find(|c| &c.instance_id == id)
    }

    /// Cards in a zone, in order.
    #[must_use]
    pub fn cards(&self, zone: Zone) -> &Vector<CardInstance> {
        &self.zones[zone.index()]
    }

    /// Mutable iteration over a zone.
    pub fn cards_mut(&mut self, zone: Zone) -> impl Iterator<Item = &mut CardInstance> + '_ {
        self.zones[zone.index()].iter_mut()
    }

    /// Instance ids in a zone, in order.
    #[must_use]
    pub fn ids(&self, zone: Zone) -> Vec<InstanceId> {
        self.zones[zone.index()]
            .iter()
            .map(|c| c.instance_id.clone())
            .collect()
    }

    /// Get the number of cards in a zone.
    #[must_use]
    pub fn zone_size(&self, zone: Zone) -> usize {
        self.zones[zone.index()].len()
    }

    /// Get the top card of a zone (last element).
    #[must_use]
    pub fn top_card(&self, zone: Zone) -> Option<&CardInstance> {
        self.zones[zone.index()].last()
    }

    /// Remove and return the top card of a zone.
    pub fn pop_top(&mut self, zone: Zone) -> Option<CardInstance> {
        let card = self.zones[zone.index()].pop_back()?;
        self.locations.remove(&card.instance_id);
        Some(card)
    }

    /// Replace a zone's contents.
    ///
    /// Returns the cards that were refused because their id already sits in
    /// another zone.
    pub fn replace_zone(&mut self, zone: Zone, cards: impl IntoIterator<Item = CardInstance>) -> Vec<CardInstance> {
        for old in std::mem::take(&mut self.zones[zone.index()]) {
            self.locations.remove(&old.instance_id);
        }

        let mut refused = Vec::new();
        for card in cards {
            if self.locations.contains_key(&card.instance_id) {
                refused.push(card);
            } else {
                self.add(card, zone, Some(ZonePosition::Tail));
            }
        }
        refused
    }

    /// Shuffle a zone.
    pub fn shuffle_zone<R: RandomSource + ?Sized>(&mut self, zone: Zone, rng: &mut R) {
        let cards: Vec<_> = self.zones[zone.index()].iter().cloned().collect();
        self.zones[zone.index()] = shuffle(&cards, rng).into_iter().collect();
    }

    /// Get total number of cards tracked.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.locations.len()
    }

    /// Check if the manager contains an instance.
    #[must_use]
    pub fn contains(&self, id: &InstanceId) -> bool {
        self.locations.contains_key(id)
    }

    /// Empty every zone.
    pub fn clear(&mut self) {
        self.locations.clear();
        for zone in &mut self.zones {
            zone.clear();
        }
    }

    /// Verify the location index agrees with the zone sequences and no id
    /// appears twice.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut seen = 0;
        for zone in Zone::ALL {
            for card in &self.zones[zone.index()] {
                if self.locations.get(&card.instance_id) != Some(&zone) {
                    return false;
                }
                seen += 1;
            }
        }
        seen == self.locations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, Position};
    use crate::core::GameRng;

    fn card(id: &str, copy: u32) -> CardInstance {
        CardInstance::new(CardId::new(id), copy)
    }

    fn iid(s: &str) -> InstanceId {
        InstanceId::from(s)
    }

    #[test]
    fn test_add_and_get() {
        let mut manager = ZoneManager::new();

        manager.add(card("a", 0), Zone::Hand, None);
        manager.add(card("a", 1), Zone::Hand, None);

        assert_eq!(manager.zone_of(&iid("a_0")), Some(Zone::Hand));
        assert_eq!(manager.zone_of(&iid("a_1")), Some(Zone::Hand));
        assert_eq!(manager.zone_of(&iid("zz_0")), None);
        assert!(manager.is_in_zone(&iid("a_0"), Zone::Hand));
        assert_eq!(manager.get(&iid("a_1")).unwrap().counters, 0);
    }

    #[test]
    fn test_library_order() {
        let mut manager = ZoneManager::new();

        manager.add(card("x", 0), Zone::Library, Some(ZonePosition::Tail));
        manager.add(card("x", 1), Zone::Library, Some(ZonePosition::Head));
        manager.add(card("x", 2), Zone::Library, Some(ZonePosition::Tail));

        // Bottom to top
        assert_eq!(manager.ids(Zone::Library), vec![iid("x_1"), iid("x_0"), iid("x_2")]);
        assert_eq!(manager.top_card(Zone::Library).unwrap().instance_id, iid("x_2"));
    }

    #[test]
    fn test_graveyard_newest_first() {
        let mut manager = ZoneManager::new();

        manager.add(card("g", 0), Zone::Graveyard, None);
        manager.add(card("g", 1), Zone::Graveyard, None);

        assert_eq!(manager.ids(Zone::Graveyard), vec![iid("g_1"), iid("g_0")]);
    }

    #[test]
    fn test_move_between_zones() {
        let mut manager = ZoneManager::new();
        manager.add(card("a", 0), Zone::Hand, None);

        assert!(manager.move_card(&iid("a_0"), Zone::Hand, Zone::Battlefield, None));

        assert_eq!(manager.zone_of(&iid("a_0")), Some(Zone::Battlefield));
        assert_eq!(manager.zone_size(Zone::Hand), 0);
        assert_eq!(manager.zone_size(Zone::Battlefield), 1);
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_move_from_wrong_zone_is_noop() {
        let mut manager = ZoneManager::new();
        manager.add(card("a", 0), Zone::Hand, None);

        assert!(!manager.move_card(&iid("a_0"), Zone::Exile, Zone::Graveyard, None));
        assert!(!manager.move_card(&iid("nope"), Zone::Hand, Zone::Graveyard, None));
        assert_eq!(manager.zone_of(&iid("a_0")), Some(Zone::Hand));
    }

    #[test]
    fn test_leaving_battlefield_clears_position() {
        let mut manager = ZoneManager::new();
        let mut c = card("a", 0);
        c.position = Some(Position::new(10.0, 20.0));
        manager.add(c, Zone::Battlefield, None);
        assert!(manager.get(&iid("a_0")).unwrap().position.is_some());

        manager.move_card(&iid("a_0"), Zone::Battlefield, Zone::Hand, None);
        assert!(manager.get(&iid("a_0")).unwrap().position.is_none());
    }

    #[test]
    fn test_duplicate_add_refused() {
        let mut manager = ZoneManager::new();

        assert!(manager.add(card("a", 0), Zone::Hand, None));
        assert!(!manager.add(card("a", 0), Zone::Exile, None));

        assert_eq!(manager.total_cards(), 1);
        assert_eq!(manager.zone_of(&iid("a_0")), Some(Zone::Hand));
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_pop_top() {
        let mut manager = ZoneManager::new();
        manager.add(card("l", 0), Zone::Library, None);
        manager.add(card("l", 1), Zone::Library, None);

        assert_eq!(manager.pop_top(Zone::Library).unwrap().instance_id, iid("l_1"));
        assert!(!manager.contains(&iid("l_1")));
        assert_eq!(manager.pop_top(Zone::Library).unwrap().instance_id, iid("l_0"));
        assert!(manager.pop_top(Zone::Library).is_none());
    }

    #[test]
    fn test_replace_zone_refuses_duplicates() {
        let mut manager = ZoneManager::new();
        manager.add(card("a", 0), Zone::Hand, None);
        manager.add(card("b", 0), Zone::Library, None);

        let refused = manager.replace_zone(Zone::Library, vec![card("a", 0), card("c", 0)]);

        assert_eq!(refused.len(), 1);
        assert_eq!(refused[0].instance_id, iid("a_0"));
        assert_eq!(manager.ids(Zone::Library), vec![iid("c_0")]);
        assert!(!manager.contains(&iid("b_0")));
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_shuffle() {
        let mut manager = ZoneManager::new();
        for i in 0..20 {
            manager.add(card("l", i), Zone::Library, None);
        }

        let before = manager.ids(Zone::Library);
        let mut rng = GameRng::new(42);
        manager.shuffle_zone(Zone::Library, &mut rng);
        let after = manager.ids(Zone::Library);

        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
        assert!(manager.is_consistent());
    }

    #[test]
    fn test_get_mut_and_cards_mut() {
        let mut manager = ZoneManager::new();
        manager.add(card("a", 0), Zone::Battlefield, None);
        manager.add(card("a", 1), Zone::Battlefield, None);

        manager.get_mut(&iid("a_0")).unwrap().counters = 5;
        for c in manager.cards_mut(Zone::Battlefield) {
            c.tapped = true;
        }

        assert_eq!(manager.get(&iid("a_0")).unwrap().counters, 5);
        assert!(manager.cards(Zone::Battlefield).iter().all(|c| c.tapped));
    }

    #[test]
    fn test_clear() {
        let mut manager = ZoneManager::new();
        manager.add(card("a", 0), Zone::Hand, None);
        manager.add(card("b", 0), Zone::Exile, None);

        manager.clear();
        assert_eq!(manager.total_cards(), 0);
        assert!(manager.cards(Zone::Exile).is_empty());
    }
}
