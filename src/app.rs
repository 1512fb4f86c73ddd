//! Application context.
//!
//! `PlaytestApp` owns the card caches, the live game and the mulligan
//! protocol, and drives the save points around them. It is constructed
//! explicitly and passed by reference; nothing here is global.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use deck_playtest::app::{AppServices, PlaytestApp};
//! use deck_playtest::cards::CardRecord;
//! use deck_playtest::core::{ManualClock, PlaytestConfig};
//! use deck_playtest::deck::Deck;
//! use deck_playtest::persistence::View;
//! use deck_playtest::resolver::mock::{MockCardResolver, MockImageProbe};
//! use deck_playtest::storage::MemoryStorage;
//!
//! let services = AppServices {
//!     durable: Arc::new(MemoryStorage::new()),
//!     session: Arc::new(MemoryStorage::new()),
//!     resolver: Arc::new(MockCardResolver::new([])),
//!     probe: Arc::new(MockImageProbe::new()),
//!     clock: Arc::new(ManualClock::new(0)),
//! };
//! let mut app = PlaytestApp::new(PlaytestConfig::default(), services).with_seed(1);
//! app.records().put(CardRecord::new("forest", "Forest", "Basic Land"));
//!
//! app.start_playtest(Deck::new("d", "Lands").with_card("forest", 30));
//! assert_eq!(app.view(), View::Mulligan);
//! assert_eq!(app.mulligan().opening_hand().len(), 7);
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CardImageStore, CardRecordStore};
use crate::cards::InstanceId;
use crate::core::{Clock, GameRng, PlaytestConfig};
use crate::deck::Deck;
use crate::game::{GameError, GameSession, MulliganPhase, MulliganPlacement, MulliganState};
use crate::persistence::{SessionPersistence, View};
use crate::resolver::{CardLoader, CardResolver, CardSearch, ImageProbe, LoadReport};
use crate::storage::KeyValueStorage;

/// External collaborators the application needs.
#[derive(Clone)]
pub struct AppServices {
    /// Survives browser restarts. Holds the card and image caches.
    pub durable: Arc<dyn KeyValueStorage>,
    /// Cleared at the end of a browser session. Holds game snapshots.
    pub session: Arc<dyn KeyValueStorage>,
    pub resolver: Arc<dyn CardResolver>,
    pub probe: Arc<dyn ImageProbe>,
    pub clock: Arc<dyn Clock>,
}

/// How a playtest started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A saved game for this deck was picked up.
    Restored,
    /// A new game was dealt.
    Fresh,
}

/// The playtest application.
pub struct PlaytestApp {
    config: PlaytestConfig,
    records: Arc<CardRecordStore>,
    images: Arc<CardImageStore>,
    loader: CardLoader,
    search: CardSearch,
    persistence: SessionPersistence,
    view: View,
    deck: Option<Deck>,
    game: Option<GameSession>,
    mulligan: MulliganState,
    seed: Option<u64>,
    games_dealt: u64,
}

impl PlaytestApp {
    pub fn new(config: PlaytestConfig, services: AppServices) -> Self {
        let records = Arc::new(CardRecordStore::new(
            &config.records,
            services.durable.clone(),
            services.clock.clone(),
        ));
        let images = Arc::new(CardImageStore::new(
            config.images.clone(),
            services.probe,
            services.durable,
            services.clock.clone(),
        ));
        let loader = CardLoader::new(records.clone(), services.resolver.clone(), config.fetch.clone());
        let search = CardSearch::new(services.resolver, records.clone(), &config.fetch);
        let persistence = SessionPersistence::new(services.session, services.clock, config.session.clone());

        Self {
            config,
            records,
            images,
            loader,
            search,
            persistence,
            view: View::Decks,
            deck: None,
            game: None,
            mulligan: MulliganState::new(),
            seed: None,
            games_dealt: 0,
        }
    }

    /// Deal games from a fixed seed instead of system entropy.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn next_rng(&mut self) -> GameRng {
        self.games_dealt += 1;
        let rng = match self.seed {
            Some(seed) => GameRng::new(seed.wrapping_add(self.games_dealt)),
            None => GameRng::from_entropy(),
        };
        debug!(seed = rng.seed(), game = self.games_dealt, "game rng seeded");
        rng
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &PlaytestConfig {
        &self.config
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    #[must_use]
    pub fn game(&self) -> Option<&GameSession> {
        self.game.as_ref()
    }

    /// The live game, for turn actions.
    pub fn game_mut(&mut self) -> Option<&mut GameSession> {
        self.game.as_mut()
    }

    #[must_use]
    pub fn mulligan(&self) -> &MulliganState {
        &self.mulligan
    }

    #[must_use]
    pub fn records(&self) -> &Arc<CardRecordStore> {
        &self.records
    }

    #[must_use]
    pub fn images(&self) -> &Arc<CardImageStore> {
        &self.images
    }

    #[must_use]
    pub fn search(&self) -> &CardSearch {
        &self.search
    }

    #[must_use]
    pub fn persistence(&self) -> &SessionPersistence {
        &self.persistence
    }

    // === Navigation ===

    /// Switch screens and remember the choice.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.save_view();
    }

    /// Open a deck in the editor.
    pub fn open_deck(&mut self, deck: Deck) {
        self.deck = Some(deck);
        self.set_view(View::DeckEditor);
    }

    fn save_view(&self) {
        let turn = self.game.as_ref().map_or(1, GameSession::turn);
        self.persistence.save_view(
            self.view,
            self.deck.as_ref().map(|d| d.id.as_str()),
            self.mulligan.mulligans_taken(),
            turn,
        );
    }

    /// Make sure every card of the current deck is cached.
    pub async fn load_deck_cards(&self) -> Option<LoadReport> {
        let deck = self.deck.as_ref()?;
        Some(self.loader.load_deck_cards(deck).await)
    }

    // === Playtest lifecycle ===

    /// Start playtesting a deck.
    ///
    /// A recent saved game for the same deck is resumed; otherwise a new
    /// game is dealt and the first opening hand drawn.
    pub fn start_playtest(&mut self, deck: Deck) -> StartOutcome {
        if let Ok(snapshot) = self.persistence.load_game(&deck.id) {
            let rng = self.next_rng();
            let restored = self.persistence.restore(
                &snapshot,
                &deck,
                self.records.as_ref(),
                self.config.rules.clone(),
                rng,
            );
            if let Some(restored) = restored {
                info!(deck = %deck.id, view = %restored.view, "resuming saved game");
                self.deck = Some(deck);
                self.game = Some(restored.session);
                self.mulligan = restored.mulligan;
                self.view = restored.view;
                self.save_view();
                return StartOutcome::Restored;
            }
        }

        let rng = self.next_rng();
        let session = GameSession::setup(&deck.cards, self.records.as_ref(), self.config.rules.clone(), rng);
        info!(deck = %deck.id, cards = session.zones().total_cards(), "new game dealt");
        self.deck = Some(deck);
        self.game = Some(session);
        self.deal_opening_hand();
        StartOutcome::Fresh
    }

    fn deal_opening_hand(&mut self) {
        self.mulligan = MulliganState::new();
        if let Some(game) = self.game.as_mut() {
            if let Err(e) = self.mulligan.begin(game) {
                warn!(error = %e, "could not draw opening hand");
            }
        }
        self.view = View::Mulligan;
        self.save_view();
        self.save_game();
    }

    fn no_game(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: MulliganPhase::NotStarted,
        }
    }

    /// Redraw the opening hand one card smaller.
    pub fn take_mulligan(&mut self) -> Result<usize, GameError> {
        let Some(game) = self.game.as_mut() else {
            return Err(self.no_game("take a mulligan"));
        };
        let size = self.mulligan.take_mulligan(game)?;
        self.save_game();
        Ok(size)
    }

    /// Set a card from the opening hand aside.
    pub fn place_mulligan_card(&mut self, id: &InstanceId, placement: MulliganPlacement) -> Result<(), GameError> {
        self.mulligan.place_card(id, placement)?;
        self.save_game();
        Ok(())
    }

    /// Keep the opening hand and move to the playtester.
    pub fn keep_hand(&mut self) -> Result<(), GameError> {
        let Some(game) = self.game.as_mut() else {
            return Err(self.no_game("keep the hand"));
        };
        self.mulligan.keep_hand(game)?;
        self.view = View::Playtester;
        self.save_view();
        self.save_game();
        Ok(())
    }

    /// Re-deal the current deck from scratch.
    pub fn reset_game(&mut self) {
        let Some(deck) = self.deck.take() else {
            return;
        };
        let rng = self.next_rng();
        let session = GameSession::setup(&deck.cards, self.records.as_ref(), self.config.rules.clone(), rng);
        debug!(deck = %deck.id, "game reset");
        self.deck = Some(deck);
        self.game = Some(session);
        self.deal_opening_hand();
    }

    /// Leave the playtest for the deck editor and forget the saved game.
    pub fn exit_playtest(&mut self) {
        if let Some(game) = self.game.as_mut() {
            self.mulligan.abort(game);
        }
        self.game = None;
        self.mulligan = MulliganState::new();
        self.persistence.clear_game();
        self.set_view(View::DeckEditor);
    }

    // === Save points ===

    /// Snapshot the game if a game view is open. Returns whether anything
    /// was written.
    pub fn save_game(&self) -> bool {
        match (&self.game, &self.deck) {
            (Some(game), Some(deck)) => self.persistence.save(self.view, &deck.id, game, &self.mulligan),
            _ => false,
        }
    }

    /// The page is being hidden or unloaded.
    pub fn on_page_hidden(&self) -> bool {
        self.save_game()
    }

    /// Periodic save, run by the auto-save task.
    pub fn autosave_tick(&self) -> bool {
        self.view.is_game_view() && self.save_game()
    }

    /// Restore the last screen after a reload.
    ///
    /// Game views are only restored if their deck is still in `decks`; the
    /// game itself comes back through `start_playtest`. Anything else falls
    /// back to the deck list.
    pub fn restore_view_on_startup(&mut self, decks: &[Deck]) -> View {
        let state = match self.persistence.load_view() {
            Ok(state) => state,
            Err(reason) => {
                debug!(%reason, "no view state to restore");
                self.view = View::Decks;
                return self.view;
            }
        };

        let deck = state
            .current_deck_id
            .as_deref()
            .and_then(|id| decks.iter().find(|d| d.id == id))
            .cloned();

        match (state.current_view, deck) {
            (view, Some(deck)) if view.is_game_view() => {
                self.start_playtest(deck);
            }
            (View::DeckEditor, Some(deck)) => {
                self.deck = Some(deck);
                self.view = View::DeckEditor;
            }
            (view, None) if view != View::Decks => {
                info!(view = %view, "saved deck no longer exists");
                self.view = View::Decks;
            }
            _ => self.view = View::Decks,
        }
        self.view
    }
}

impl std::fmt::Debug for PlaytestApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaytestApp")
            .field("view", &self.view)
            .field("deck", &self.deck.as_ref().map(|d| &d.id))
            .field("mulligan", &self.mulligan.phase())
            .finish_non_exhaustive()
    }
}
