//! Live playtest state.
//!
//! `GameSession` is the single owner of a game's zones and counters. All
//! changes go through its methods; nothing else mutates it directly.
//!
//! ## Commander to graveyard
//!
//! Sending the commander to the graveyard does not decide anything on the
//! player's behalf: the card goes to the graveyard and the move returns
//! `MoveOutcome::AskCommanderReturn`. The caller asks the player and, if they
//! want it back, calls `return_commander_to_command_zone`.

use tracing::{debug, info};

use super::counters::{Die, LastRolls, ManaColor, ManaPool};
use super::setup::{expand_deck, find_commander};
use crate::cards::{CardInstance, CardLookup, InstanceId, Position};
use crate::core::{GameRng, GameRules, RandomSource};
use crate::deck::DeckEntry;
use crate::zones::{Zone, ZoneManager, ZonePosition};

/// Result of a move request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The card was not in the source zone. Nothing changed.
    NotFound,
    Moved,
    /// The commander was put into the graveyard; the player may return it to
    /// the command zone instead.
    AskCommanderReturn(InstanceId),
}

/// A commander playtest in progress.
#[derive(Clone, Debug)]
pub struct GameSession {
    zones: ZoneManager,
    commander: Option<InstanceId>,
    commander_tax: u32,
    turn: u32,
    life_total: i32,
    poison_counters: u32,
    mana_pool: ManaPool,
    last_rolls: LastRolls,
    rules: GameRules,
    rng: GameRng,
    token_sequence: u64,
}

impl GameSession {
    /// Create an empty session with initial counters.
    #[must_use]
    pub fn new(rules: GameRules, rng: GameRng) -> Self {
        Self {
            zones: ZoneManager::new(),
            commander: None,
            commander_tax: 0,
            turn: 1,
            life_total: rules.starting_life,
            poison_counters: 0,
            mana_pool: ManaPool::default(),
            last_rolls: LastRolls::default(),
            rules,
            rng,
            token_sequence: 0,
        }
    }

    /// Deal a fresh game from a deck list.
    ///
    /// The first legendary creature or planeswalker (in deck order) goes
    /// alone into the command zone; everything else is shuffled into the
    /// library.
    pub fn setup(cards: &[DeckEntry], lookup: &impl CardLookup, rules: GameRules, rng: GameRng) -> Self {
        let mut session = Self::new(rules, rng);
        session.deal(cards, lookup);
        session
    }

    /// Reset counters and re-deal the same deck.
    pub fn redeal(&mut self, cards: &[DeckEntry], lookup: &impl CardLookup) {
        self.reset();
        self.deal(cards, lookup);
    }

    fn deal(&mut self, cards: &[DeckEntry], lookup: &impl CardLookup) {
        let mut pool = expand_deck(cards, lookup);

        if let Some(idx) = find_commander(&pool, lookup) {
            let commander = pool.remove(idx);
            info!(commander = %commander.instance_id, "commander identified");
            self.commander = Some(commander.instance_id.clone());
            self.zones.add(commander, Zone::Command, None);
        }

        self.zones.replace_zone(Zone::Library, pool);
        self.zones.shuffle_zone(Zone::Library, &mut self.rng);
        debug!(library = self.zones.zone_size(Zone::Library), "deck dealt");
    }

    /// Back to initial values with empty zones.
    pub fn reset(&mut self) {
        self.zones.clear();
        self.commander = None;
        self.commander_tax = 0;
        self.turn = 1;
        self.life_total = self.rules.starting_life;
        self.poison_counters = 0;
        self.mana_pool.clear();
        self.last_rolls = LastRolls::default();
        self.token_sequence = 0;
    }

    // === Accessors ===

    #[must_use]
    pub fn zones(&self) -> &ZoneManager {
        &self.zones
    }

    #[must_use]
    pub fn commander(&self) -> Option<&InstanceId> {
        self.commander.as_ref()
    }

    #[must_use]
    pub fn commander_tax(&self) -> u32 {
        self.commander_tax
    }

    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn life_total(&self) -> i32 {
        self.life_total
    }

    #[must_use]
    pub fn poison_counters(&self) -> u32 {
        self.poison_counters
    }

    #[must_use]
    pub fn mana_pool(&self) -> &ManaPool {
        &self.mana_pool
    }

    #[must_use]
    pub fn last_rolls(&self) -> &LastRolls {
        &self.last_rolls
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Find which zone holds a card.
    #[must_use]
    pub fn find_zone_of(&self, id: &InstanceId) -> Option<Zone> {
        self.zones.zone_of(id)
    }

    // === Zone moves ===

    /// Move a card to a zone's default position.
    pub fn move_card(&mut self, id: &InstanceId, from: Zone, to: Zone) -> MoveOutcome {
        self.move_card_to(id, from, to, None)
    }

    /// Move a card to a specific position in the target zone.
    pub fn move_card_to(
        &mut self,
        id: &InstanceId,
        from: Zone,
        to: Zone,
        position: Option<ZonePosition>,
    ) -> MoveOutcome {
        if !self.zones.move_card(id, from, to, position) {
            return MoveOutcome::NotFound;
        }
        if to == Zone::Graveyard && from != to && self.commander.as_ref() == Some(id) {
            return MoveOutcome::AskCommanderReturn(id.clone());
        }
        MoveOutcome::Moved
    }

    /// Put a card onto the battlefield at a position, or reposition it if it
    /// is already there.
    pub fn place_on_battlefield(&mut self, id: &InstanceId, from: Zone, at: Position) -> MoveOutcome {
        if !self.zones.move_card(id, from, Zone::Battlefield, None) {
            return MoveOutcome::NotFound;
        }
        if let Some(card) = self.zones.get_mut(id) {
            card.position = Some(at);
        }
        MoveOutcome::Moved
    }

    /// Reposition a card that is already on the battlefield.
    pub fn set_position(&mut self, id: &InstanceId, at: Position) -> bool {
        if !self.zones.is_in_zone(id, Zone::Battlefield) {
            return false;
        }
        self.place_on_battlefield(id, Zone::Battlefield, at) == MoveOutcome::Moved
    }

    /// Take the commander back out of the graveyard.
    ///
    /// Clears its tapped/counter state, puts it in the command zone and
    /// raises the commander tax. Returns `false` if `id` is not the commander
    /// or is not in the graveyard.
    pub fn return_commander_to_command_zone(&mut self, id: &InstanceId) -> bool {
        if self.commander.as_ref() != Some(id) {
            return false;
        }
        let Some(mut card) = self.zones.take(id, Zone::Graveyard) else {
            return false;
        };
        card.clear_transient();
        self.zones.add(card, Zone::Command, None);
        self.commander_tax += 1;
        info!(tax = self.commander_tax, "commander returned to command zone");
        true
    }

    /// Copy a card as a token onto the battlefield at a random spot.
    ///
    /// Returns the new token's id, or `None` if the template card is not in
    /// any zone.
    pub fn create_token(&mut self, template: &InstanceId, name: Option<String>) -> Option<InstanceId> {
        let template = self.zones.get(template)?.clone();

        self.token_sequence += 1;
        let salt = self.rng.next_below(u32::MAX as usize) as u32;
        let id = InstanceId::token(self.token_sequence, salt);

        let area = &self.rules.token_spawn;
        let at = Position::new(
            area.x + self.rng.next_unit() as f32 * area.width,
            area.y + self.rng.next_unit() as f32 * area.height,
        );

        let token = CardInstance::token(&template, id.clone(), name, at);
        self.zones.add(token, Zone::Battlefield, None);
        debug!(token = %id, "token created");
        Some(id)
    }

    // === Library ===

    /// Draw the top card into the hand. No-op on an empty library.
    pub fn draw_card(&mut self) -> Option<InstanceId> {
        let card = self.zones.pop_top(Zone::Library)?;
        let id = card.instance_id.clone();
        self.zones.add(card, Zone::Hand, None);
        Some(id)
    }

    /// Shuffle the library.
    pub fn shuffle_library(&mut self) {
        self.zones.shuffle_zone(Zone::Library, &mut self.rng);
    }

    /// Remove up to `count` cards from the top of the library, top first.
    pub(crate) fn take_from_library(&mut self, count: usize) -> Vec<CardInstance> {
        std::iter::from_fn(|| self.zones.pop_top(Zone::Library))
            .take(count)
            .collect()
    }

    /// Put cards back on the library at the given end.
    pub(crate) fn put_into_library(&mut self, cards: impl IntoIterator<Item = CardInstance>, at: ZonePosition) {
        for card in cards {
            self.zones.add(card, Zone::Library, Some(at));
        }
    }

    /// Put cards into a zone in order.
    pub(crate) fn put_into_zone(&mut self, cards: impl IntoIterator<Item = CardInstance>, zone: Zone) {
        for card in cards {
            self.zones.add(card, zone, Some(ZonePosition::Tail));
        }
    }

    // === Turn actions ===

    /// Advance the turn: untap the battlefield and draw.
    pub fn next_turn(&mut self) -> Option<InstanceId> {
        self.turn += 1;
        for card in self.zones.cards_mut(Zone::Battlefield) {
            card.tapped = false;
        }
        self.draw_card()
    }

    /// Toggle a card's tapped flag.
    pub fn toggle_tap(&mut self, id: &InstanceId) -> bool {
        match self.zones.get_mut(id) {
            Some(card) => {
                card.toggle_tap();
                true
            }
            None => false,
        }
    }

    pub fn add_counter(&mut self, id: &InstanceId) -> bool {
        match self.zones.get_mut(id) {
            Some(card) => {
                card.add_counter();
                true
            }
            None => false,
        }
    }

    pub fn remove_counter(&mut self, id: &InstanceId) -> bool {
        match self.zones.get_mut(id) {
            Some(card) => {
                card.remove_counter();
                true
            }
            None => false,
        }
    }

    /// Adjust life, never below zero. Returns the new total.
    pub fn change_life(&mut self, delta: i32) -> i32 {
        self.life_total = self.life_total.saturating_add(delta).max(0);
        self.life_total
    }

    /// Adjust poison counters, never below zero. Returns `true` once the
    /// total is lethal.
    pub fn change_poison(&mut self, delta: i32) -> bool {
        self.poison_counters = self.poison_counters.saturating_add_signed(delta);
        self.is_poisoned_out()
    }

    #[must_use]
    pub fn is_poisoned_out(&self) -> bool {
        self.poison_counters >= self.rules.lethal_poison
    }

    /// Adjust one color of floating mana. Returns the new amount.
    pub fn change_mana(&mut self, color: ManaColor, delta: i32) -> u32 {
        self.mana_pool.change(color, delta)
    }

    pub fn clear_mana_pool(&mut self) {
        self.mana_pool.clear();
    }

    /// Roll a die and remember the result.
    pub fn roll_die(&mut self, die: Die) -> u32 {
        let result = self.rng.next_below(die.sides() as usize) as u32 + 1;
        self.last_rolls.record(die, result);
        result
    }

    // === Restore ===

    /// Rebuild a session from saved parts.
    pub(crate) fn from_parts(parts: SessionParts) -> Self {
        Self {
            zones: parts.zones,
            commander: parts.commander,
            commander_tax: parts.commander_tax,
            turn: parts.turn.max(1),
            life_total: parts.life_total,
            poison_counters: parts.poison_counters,
            mana_pool: parts.mana_pool,
            last_rolls: parts.last_rolls,
            rules: parts.rules,
            rng: parts.rng,
            token_sequence: 0,
        }
    }
}

/// Everything needed to rebuild a session.
pub(crate) struct SessionParts {
    pub zones: ZoneManager,
    pub commander: Option<InstanceId>,
    pub commander_tax: u32,
    pub turn: u32,
    pub life_total: i32,
    pub poison_counters: u32,
    pub mana_pool: ManaPool,
    pub last_rolls: LastRolls,
    pub rules: GameRules,
    pub rng: GameRng,
}
