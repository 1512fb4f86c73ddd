//! Game snapshot and view-state persistence.
//!
//! Both records live in session-scoped storage under their own keys. A
//! game snapshot is honored for 30 minutes and only for the deck it was
//! taken from; a view state is honored for 60 minutes.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::snapshot::{BattlefieldEntry, GameSnapshot, SnapshotRejection, View, ViewState};
use crate::cards::{CardInstance, CardLookup, InstanceId};
use crate::core::{Clock, GameRng, GameRules, SessionConfig};
use crate::deck::Deck;
use crate::game::session::SessionParts;
use crate::game::{expand_deck, GameSession, MulliganState};
use crate::storage::{self, KeyValueStorage, GAME_STATE_KEY, VIEW_STATE_KEY};
use crate::zones::{Zone, ZoneManager, ZonePosition};

/// A game rebuilt from a snapshot.
#[derive(Clone, Debug)]
pub struct RestoredGame {
    pub view: View,
    pub session: GameSession,
    pub mulligan: MulliganState,
}

/// Saves and restores live games.
pub struct SessionPersistence {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self { storage, clock, config }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Capture the game, if `view` is a game view.
    #[must_use]
    pub fn snapshot(
        &self,
        view: View,
        deck_id: &str,
        session: &GameSession,
        mulligan: &MulliganState,
    ) -> Option<GameSnapshot> {
        view.is_game_view()
            .then(|| GameSnapshot::capture(view, deck_id, session, mulligan, self.clock.now_ms()))
    }

    /// Write a snapshot.
    pub fn save_game(&self, snapshot: &GameSnapshot) -> storage::Result<()> {
        let json = serde_json::to_string(snapshot).map_err(|e| storage::StorageError::Backend(e.to_string()))?;
        self.storage.set(GAME_STATE_KEY, &json)?;
        debug!(view = %snapshot.current_view, turn = snapshot.current_turn, "game state saved");
        Ok(())
    }

    /// Capture and write in one step. Returns whether anything was saved.
    pub fn save(&self, view: View, deck_id: &str, session: &GameSession, mulligan: &MulliganState) -> bool {
        let Some(snapshot) = self.snapshot(view, deck_id, session, mulligan) else {
            return false;
        };
        match self.save_game(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "could not save game state");
                false
            }
        }
    }

    /// Read the stored snapshot without judging it.
    pub fn read_game(&self) -> Result<GameSnapshot, SnapshotRejection> {
        let raw = self
            .storage
            .get(GAME_STATE_KEY)
            .map_err(|e| SnapshotRejection::Corrupt(e.to_string()))?
            .ok_or(SnapshotRejection::Missing)?;
        serde_json::from_str(&raw).map_err(|e| SnapshotRejection::Corrupt(e.to_string()))
    }

    /// Check a snapshot's age and deck.
    pub fn check(&self, snapshot: &GameSnapshot, deck_id: &str) -> Result<(), SnapshotRejection> {
        self.check_age(snapshot.saved_at, self.config.game_max_age_ms)?;
        if snapshot.current_deck_id != deck_id {
            return Err(SnapshotRejection::DeckMismatch {
                saved: snapshot.current_deck_id.clone(),
                current: deck_id.to_string(),
            });
        }
        if !snapshot.current_view.is_game_view() {
            return Err(SnapshotRejection::InactiveView(snapshot.current_view));
        }
        Ok(())
    }

    fn check_age(&self, saved_at: i64, max_age_ms: u64) -> Result<(), SnapshotRejection> {
        let age_ms = self.clock.now_ms().saturating_sub(saved_at);
        let max_age_ms = i64::try_from(max_age_ms).unwrap_or(i64::MAX);
        if age_ms > max_age_ms {
            return Err(SnapshotRejection::Expired { age_ms, max_age_ms });
        }
        Ok(())
    }

    /// Load the stored snapshot if it is usable for `deck_id`.
    ///
    /// An expired or mismatched snapshot is removed from storage.
    pub fn load_game(&self, deck_id: &str) -> Result<GameSnapshot, SnapshotRejection> {
        let snapshot = self.read_game()?;
        if let Err(rejection) = self.check(&snapshot, deck_id) {
            info!(reason = %rejection, "discarding saved game");
            self.clear_game();
            return Err(rejection);
        }
        Ok(snapshot)
    }

    /// Rebuild a game from a snapshot and the deck it was taken from.
    ///
    /// Returns `None` if the snapshot is stale or belongs to another deck.
    /// Saved ids that no longer match a deck card are dropped.
    pub fn restore(
        &self,
        snapshot: &GameSnapshot,
        deck: &Deck,
        lookup: &impl CardLookup,
        rules: GameRules,
        rng: GameRng,
    ) -> Option<RestoredGame> {
        if let Err(rejection) = self.check(snapshot, &deck.id) {
            info!(reason = %rejection, "snapshot rejected");
            return None;
        }

        let mut pool: FxHashMap<InstanceId, CardInstance> = expand_deck(&deck.cards, lookup)
            .into_iter()
            .map(|c| (c.instance_id.clone(), c))
            .collect();
        let mut take_all = |ids: &[InstanceId]| -> Vec<CardInstance> {
            ids.iter().filter_map(|id| pool.remove(id)).collect()
        };

        let mut zones = ZoneManager::new();
        for (zone, ids) in [
            (Zone::Command, &snapshot.command_zone_ids),
            (Zone::Library, &snapshot.library_ids),
            (Zone::Hand, &snapshot.player_hand_ids),
            (Zone::Graveyard, &snapshot.graveyard_ids),
            (Zone::Exile, &snapshot.exile_ids),
        ] {
            for card in take_all(ids) {
                zones.add(card, zone, Some(ZonePosition::Tail));
            }
        }

        let battlefield_ids: Vec<InstanceId> = snapshot
            .player_battlefield_ids
            .iter()
            .map(|e| e.instance_id.clone())
            .collect();
        let saved: FxHashMap<&InstanceId, &BattlefieldEntry> = snapshot
            .player_battlefield_ids
            .iter()
            .map(|e| (&e.instance_id, e))
            .collect();
        for mut card in take_all(&battlefield_ids) {
            if let Some(entry) = saved.get(&card.instance_id) {
                card.tapped = entry.tapped;
                card.counters = entry.counters;
                card.position = entry.position;
            }
            zones.add(card, Zone::Battlefield, Some(ZonePosition::Tail));
        }

        let opening = take_all(&snapshot.opening_hand_ids);
        let bottom = take_all(&snapshot.bottom_of_library_ids);
        let exiled = take_all(&snapshot.exiled_from_mulligan_ids);

        let commander = snapshot
            .commander_id
            .clone()
            .or_else(|| snapshot.command_zone_ids.first().cloned())
            .filter(|id| {
                zones.contains(id) || [&opening, &bottom, &exiled].iter().any(|held| held.iter().any(|c| &c.instance_id == id))
            });

        let mulligan = match snapshot.current_view {
            View::Mulligan => MulliganState::resume(opening, snapshot.mulligan_count, bottom, exiled),
            _ => MulliganState::finished(),
        };

        info!(
            view = %snapshot.current_view,
            cards = zones.total_cards(),
            dropped = pool.len(),
            "game restored"
        );

        let session = GameSession::from_parts(SessionParts {
            zones,
            commander,
            commander_tax: snapshot.commander_tax,
            turn: snapshot.current_turn,
            life_total: snapshot.player_life,
            poison_counters: snapshot.poison_counters,
            mana_pool: snapshot.mana_pool,
            last_rolls: snapshot.last_roll,
            rules,
            rng,
        });

        Some(RestoredGame {
            view: snapshot.current_view,
            session,
            mulligan,
        })
    }

    /// Forget the saved game.
    pub fn clear_game(&self) {
        if let Err(e) = self.storage.remove(GAME_STATE_KEY) {
            warn!(error = %e, "could not clear saved game");
        }
    }

    /// Record which screen is open.
    pub fn save_view(&self, view: View, deck_id: Option<&str>, mulligan_count: u32, turn: u32) {
        let state = ViewState {
            current_view: view,
            current_deck_id: deck_id.map(str::to_string),
            mulligan_count,
            current_turn: turn,
            saved_at: self.clock.now_ms(),
        };
        let result = serde_json::to_string(&state)
            .map_err(|e| storage::StorageError::Backend(e.to_string()))
            .and_then(|json| self.storage.set(VIEW_STATE_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "could not save view state");
        }
    }

    /// Load the view state if it is recent enough.
    pub fn load_view(&self) -> Result<ViewState, SnapshotRejection> {
        let raw = self
            .storage
            .get(VIEW_STATE_KEY)
            .map_err(|e| SnapshotRejection::Corrupt(e.to_string()))?
            .ok_or(SnapshotRejection::Missing)?;
        let state: ViewState = serde_json::from_str(&raw).map_err(|e| SnapshotRejection::Corrupt(e.to_string()))?;
        if let Err(rejection) = self.check_age(state.saved_at, self.config.view_max_age_ms) {
            self.clear_view();
            return Err(rejection);
        }
        Ok(state)
    }

    pub fn clear_view(&self) {
        if let Err(e) = self.storage.remove(VIEW_STATE_KEY) {
            warn!(error = %e, "could not clear view state");
        }
    }
}

impl std::fmt::Debug for SessionPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPersistence")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
