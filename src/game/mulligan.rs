//! Opening-hand mulligan protocol.
//!
//! The opening hand is held here, outside every zone, until the player keeps
//! it. Cards set aside during a round (to the bottom of the library or to
//! exile) are held here too. Taking a mulligan shuffles the hand and the
//! bottomed cards back and sends the round's exiled cards to exile; keeping
//! the hand places everything.
//!
//! ```text
//! NotStarted -> Drawing(7) -> AwaitingDecision -+-> take_mulligan -> Drawing(n - 1) -> ...
//!                                               +-> keep_hand     -> Finished
//! ```
//!
//! ## Usage
//!
//! ```
//! use deck_playtest::cards::{CardRecord, CardRegistry};
//! use deck_playtest::core::{GameRng, GameRules};
//! use deck_playtest::deck::Deck;
//! use deck_playtest::game::{GameSession, MulliganState};
//! use deck_playtest::zones::Zone;
//!
//! let registry = CardRegistry::from_records([CardRecord::new("forest", "Forest", "Basic Land")]);
//! let deck = Deck::new("d", "Lands").with_card("forest", 20);
//! let mut session = GameSession::setup(&deck.cards, &registry, GameRules::default(), GameRng::new(7));
//!
//! let mut mulligan = MulliganState::new();
//! mulligan.begin(&mut session).unwrap();
//! assert_eq!(mulligan.take_mulligan(&mut session).unwrap(), 6);
//!
//! mulligan.keep_hand(&mut session).unwrap();
//! assert_eq!(session.zones().zone_size(Zone::Hand), 6);
//! ```

use std::fmt;

use tracing::{debug, warn};

use super::error::GameError;
use super::session::GameSession;
use crate::cards::{CardInstance, InstanceId};
use crate::zones::{Zone, ZonePosition};

/// Where the protocol is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MulliganPhase {
    NotStarted,
    /// A hand of this size is being drawn.
    Drawing(usize),
    AwaitingDecision,
    /// The hand was kept.
    Finished,
}

impl fmt::Display for MulliganPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MulliganPhase::NotStarted => f.write_str("not started"),
            MulliganPhase::Drawing(n) => write!(f, "drawing {} cards", n),
            MulliganPhase::AwaitingDecision => f.write_str("awaiting a decision"),
            MulliganPhase::Finished => f.write_str("finished"),
        }
    }
}

/// Where a card set aside from the opening hand goes when the hand is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MulliganPlacement {
    BottomOfLibrary,
    Exile,
}

/// Mulligan progress for one game.
#[derive(Clone, Debug)]
pub struct MulliganState {
    phase: MulliganPhase,
    opening_hand: Vec<CardInstance>,
    mulligans_taken: u32,
    /// In placement order.
    bottom_of_library: Vec<CardInstance>,
    /// In placement order.
    exiled_from_mulligan: Vec<CardInstance>,
}

impl Default for MulliganState {
    fn default() -> Self {
        Self::new()
    }
}

impl MulliganState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: MulliganPhase::NotStarted,
            opening_hand: Vec::new(),
            mulligans_taken: 0,
            bottom_of_library: Vec::new(),
            exiled_from_mulligan: Vec::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> MulliganPhase {
        self.phase
    }

    #[must_use]
    pub fn opening_hand(&self) -> &[CardInstance] {
        &self.opening_hand
    }

    #[must_use]
    pub fn mulligans_taken(&self) -> u32 {
        self.mulligans_taken
    }

    #[must_use]
    pub fn bottom_of_library(&self) -> &[CardInstance] {
        &self.bottom_of_library
    }

    #[must_use]
    pub fn exiled_from_mulligan(&self) -> &[CardInstance] {
        &self.exiled_from_mulligan
    }

    /// Whether the player still has a decision to make.
    #[must_use]
    pub fn is_awaiting_decision(&self) -> bool {
        self.phase == MulliganPhase::AwaitingDecision
    }

    /// Draw the first opening hand.
    pub fn begin(&mut self, session: &mut GameSession) -> Result<usize, GameError> {
        if self.phase != MulliganPhase::NotStarted {
            return Err(self.invalid("draw an opening hand"));
        }
        let size = session.rules().opening_hand_size;
        Ok(self.draw_hand(session, size))
    }

    /// Shuffle the hand and bottomed cards back and draw a hand one card
    /// smaller. Cards exiled this round go to the exile zone.
    ///
    /// Rejected with `GameError::MulliganLimit` once the limit is reached;
    /// the current hand stays as it is. Returns the new hand size.
    pub fn take_mulligan(&mut self, session: &mut GameSession) -> Result<usize, GameError> {
        if !self.is_awaiting_decision() {
            return Err(self.invalid("take a mulligan"));
        }
        let max = session.rules().max_mulligans;
        if self.mulligans_taken >= max {
            warn!(taken = self.mulligans_taken, max, "mulligan limit reached");
            return Err(GameError::MulliganLimit { max });
        }

        let returning = self.opening_hand.drain(..).chain(self.bottom_of_library.drain(..));
        session.put_into_library(returning, ZonePosition::Tail);
        // Exiled cards stay out of the library for the rest of the game.
        session.put_into_zone(self.exiled_from_mulligan.drain(..), Zone::Exile);
        session.shuffle_library();

        self.mulligans_taken += 1;
        let size = session.rules().hand_size_after(self.mulligans_taken);
        debug!(taken = self.mulligans_taken, size, "mulligan taken");
        Ok(self.draw_hand(session, size))
    }

    /// Set a card from the opening hand aside.
    pub fn place_card(&mut self, id: &InstanceId, placement: MulliganPlacement) -> Result<(), GameError> {
        if !self.is_awaiting_decision() {
            return Err(self.invalid("set a card aside"));
        }
        let idx = self
            .opening_hand
            .iter()
            .position(|c| &c.instance_id == id)
            .ok_or_else(|| GameError::CardNotInOpeningHand(id.clone()))?;

        let card = self.opening_hand.remove(idx);
        match placement {
            MulliganPlacement::BottomOfLibrary => self.bottom_of_library.push(card),
            MulliganPlacement::Exile => self.exiled_from_mulligan.push(card),
        }
        Ok(())
    }

    /// Commit the opening hand.
    ///
    /// The hand goes into the hand zone in order. Cards set to the bottom
    /// end up under the library with the last-placed one nearest the top.
    /// Exiled cards go to exile. Everything mulligan-scoped is reset.
    pub fn keep_hand(&mut self, session: &mut GameSession) -> Result<(), GameError> {
        if !self.is_awaiting_decision() {
            return Err(self.invalid("keep the hand"));
        }

        let kept = self.opening_hand.len();
        session.put_into_zone(self.opening_hand.drain(..), Zone::Hand);
        session.put_into_library(self.bottom_of_library.drain(..).rev(), ZonePosition::Head);
        session.put_into_zone(self.exiled_from_mulligan.drain(..), Zone::Exile);

        debug!(kept, mulligans = self.mulligans_taken, "hand kept");
        self.mulligans_taken = 0;
        self.phase = MulliganPhase::Finished;
        Ok(())
    }

    /// Tear the protocol down, returning any held cards to the library.
    pub fn abort(&mut self, session: &mut GameSession) {
        let held = self
            .opening_hand
            .drain(..)
            .chain(self.bottom_of_library.drain(..))
            .chain(self.exiled_from_mulligan.drain(..));
        session.put_into_library(held, ZonePosition::Tail);
        *self = Self::new();
    }

    fn draw_hand(&mut self, session: &mut GameSession, size: usize) -> usize {
        self.phase = MulliganPhase::Drawing(size);
        self.opening_hand = session.take_from_library(size);
        self.phase = MulliganPhase::AwaitingDecision;
        self.opening_hand.len()
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }

    /// Rebuild an in-progress decision from saved parts.
    pub(crate) fn resume(
        opening_hand: Vec<CardInstance>,
        mulligans_taken: u32,
        bottom_of_library: Vec<CardInstance>,
        exiled_from_mulligan: Vec<CardInstance>,
    ) -> Self {
        Self {
            phase: MulliganPhase::AwaitingDecision,
            opening_hand,
            mulligans_taken,
            bottom_of_library,
            exiled_from_mulligan,
        }
    }

    /// State for a game whose hand was already kept.
    pub(crate) fn finished() -> Self {
        Self {
            phase: MulliganPhase::Finished,
            ..Self::new()
        }
    }
}
