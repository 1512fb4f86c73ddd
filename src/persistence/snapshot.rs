//! Persisted session records.
//!
//! Zones are stored as instance-id lists, never as card payloads. Restoring
//! re-expands the deck and looks the ids up again, so a snapshot stays small
//! and card data always comes from the record store.
//!
//! Fields added after the first layout carry serde defaults, so records
//! written without them still load.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::{CardInstance, InstanceId, Position};
use crate::game::{GameSession, LastRolls, ManaPool, MulliganState};
use crate::zones::Zone;

/// Top-level screens of the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum View {
    #[default]
    Decks,
    DeckEditor,
    Mulligan,
    Playtester,
}

impl View {
    /// Views with a live game worth saving.
    #[must_use]
    pub const fn is_game_view(self) -> bool {
        matches!(self, View::Mulligan | View::Playtester)
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            View::Decks => "decks",
            View::DeckEditor => "deckEditor",
            View::Mulligan => "mulligan",
            View::Playtester => "playtester",
        })
    }
}

/// A battlefield card with its in-play state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattlefieldEntry {
    pub instance_id: InstanceId,
    #[serde(default)]
    pub tapped: bool,
    #[serde(default)]
    pub counters: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl From<&CardInstance> for BattlefieldEntry {
    fn from(card: &CardInstance) -> Self {
        Self {
            instance_id: card.instance_id.clone(),
            tapped: card.tapped,
            counters: card.counters,
            position: card.position,
        }
    }
}

/// Full game snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub current_view: View,
    pub current_deck_id: String,
    pub player_life: i32,
    pub current_turn: u32,
    pub commander_tax: u32,
    pub mulligan_count: u32,
    pub player_hand_ids: Vec<InstanceId>,
    pub player_battlefield_ids: Vec<BattlefieldEntry>,
    /// Most recent first.
    #[serde(rename = "playerGraveyardIds", alias = "graveyardIds")]
    pub graveyard_ids: Vec<InstanceId>,
    #[serde(rename = "playerExileIds", alias = "exileIds")]
    pub exile_ids: Vec<InstanceId>,
    /// Bottom to top.
    #[serde(rename = "playerLibraryIds", alias = "libraryIds")]
    pub library_ids: Vec<InstanceId>,
    pub command_zone_ids: Vec<InstanceId>,
    pub mana_pool: ManaPool,
    pub last_roll: LastRolls,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commander_id: Option<InstanceId>,
    #[serde(default)]
    pub poison_counters: u32,
    #[serde(default)]
    pub opening_hand_ids: Vec<InstanceId>,
    #[serde(default)]
    pub bottom_of_library_ids: Vec<InstanceId>,
    #[serde(default)]
    pub exiled_from_mulligan_ids: Vec<InstanceId>,

    /// Milliseconds since the Unix epoch.
    pub saved_at: i64,
}

fn ids(cards: &[CardInstance]) -> Vec<InstanceId> {
    cards.iter().map(|c| c.instance_id.clone()).collect()
}

impl GameSnapshot {
    /// Capture a live game.
    #[must_use]
    pub fn capture(
        view: View,
        deck_id: &str,
        session: &GameSession,
        mulligan: &MulliganState,
        saved_at: i64,
    ) -> Self {
        let zones = session.zones();
        Self {
            current_view: view,
            current_deck_id: deck_id.to_string(),
            player_life: session.life_total(),
            current_turn: session.turn(),
            commander_tax: session.commander_tax(),
            mulligan_count: mulligan.mulligans_taken(),
            player_hand_ids: zones.ids(Zone::Hand),
            player_battlefield_ids: zones
                .cards(Zone::Battlefield)
                .iter()
                .map(BattlefieldEntry::from)
                .collect(),
            graveyard_ids: zones.ids(Zone::Graveyard),
            exile_ids: zones.ids(Zone::Exile),
            library_ids: zones.ids(Zone::Library),
            command_zone_ids: zones.ids(Zone::Command),
            mana_pool: *session.mana_pool(),
            last_roll: *session.last_rolls(),
            commander_id: session.commander().cloned(),
            poison_counters: session.poison_counters(),
            opening_hand_ids: ids(mulligan.opening_hand()),
            bottom_of_library_ids: ids(mulligan.bottom_of_library()),
            exiled_from_mulligan_ids: ids(mulligan.exiled_from_mulligan()),
            saved_at,
        }
    }
}

/// Lightweight record of which screen was open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ViewState {
    pub current_view: View,
    #[serde(default)]
    pub current_deck_id: Option<String>,
    #[serde(default)]
    pub mulligan_count: u32,
    #[serde(default = "first_turn")]
    pub current_turn: u32,
    pub saved_at: i64,
}

fn first_turn() -> u32 {
    1
}

/// Why a saved record was not used.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SnapshotRejection {
    #[error("no saved record")]
    Missing,

    #[error("saved record is {age_ms} ms old, limit is {max_age_ms} ms")]
    Expired { age_ms: i64, max_age_ms: i64 },

    #[error("saved record belongs to deck {saved}, current deck is {current}")]
    DeckMismatch { saved: String, current: String },

    #[error("saved view {0} has no game to restore")]
    InactiveView(View),

    #[error("saved deck {0} no longer exists")]
    DeckGone(String),

    #[error("saved record is unreadable: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names() {
        assert_eq!(serde_json::to_string(&View::DeckEditor).unwrap(), "\"deckEditor\"");
        assert!(View::Mulligan.is_game_view());
        assert!(View::Playtester.is_game_view());
        assert!(!View::DeckEditor.is_game_view());
    }

    #[test]
    fn test_minimal_snapshot_parses() {
        let json = r#"{
            "currentView": "playtester",
            "currentDeckId": "deck-1",
            "playerLife": 37,
            "currentTurn": 4,
            "commanderTax": 1,
            "mulliganCount": 2,
            "playerHandIds": ["bolt_0"],
            "playerBattlefieldIds": [{"instanceId": "forest_3", "tapped": true, "counters": 2}],
            "graveyardIds": [],
            "exileIds": [],
            "libraryIds": ["forest_0"],
            "commandZoneIds": ["legend_0"],
            "manaPool": {"W": 0, "U": 0, "B": 0, "R": 1, "G": 2, "C": 0},
            "lastRoll": {"d6": 4, "d20": null},
            "savedAt": 1700000000000
        }"#;

        let snapshot: GameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.player_life, 37);
        assert!(snapshot.player_battlefield_ids[0].tapped);
        assert_eq!(snapshot.mana_pool.green, 2);
        assert_eq!(snapshot.last_roll.d6, Some(4));
        assert!(snapshot.commander_id.is_none());
        assert_eq!(snapshot.poison_counters, 0);
        assert!(snapshot.opening_hand_ids.is_empty());
    }

    #[test]
    fn test_player_zone_keys() {
        let json = r#"{
            "currentView": "mulligan",
            "currentDeckId": "deck-1",
            "playerLife": 40,
            "currentTurn": 1,
            "commanderTax": 0,
            "mulliganCount": 0,
            "playerHandIds": [],
            "playerBattlefieldIds": [],
            "playerGraveyardIds": ["bolt_1"],
            "playerExileIds": ["bolt_2"],
            "playerLibraryIds": ["forest_0", "forest_1"],
            "commandZoneIds": [],
            "manaPool": {"W": 0, "U": 0, "B": 0, "R": 0, "G": 0, "C": 0},
            "lastRoll": {"d6": null, "d20": null},
            "savedAt": 1700000000000
        }"#;

        let snapshot: GameSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.graveyard_ids, vec![InstanceId::from("bolt_1")]);
        assert_eq!(snapshot.exile_ids, vec![InstanceId::from("bolt_2")]);
        assert_eq!(snapshot.library_ids.len(), 2);

        let written = serde_json::to_string(&snapshot).unwrap();
        assert!(written.contains("\"playerGraveyardIds\""));
        assert!(written.contains("\"playerExileIds\""));
        assert!(written.contains("\"playerLibraryIds\""));
        assert!(!written.contains("\"libraryIds\""));
    }

    #[test]
    fn test_view_state_rejects_unknown_keys() {
        let ok = r#"{"currentView":"deckEditor","currentDeckId":"d","savedAt":5}"#;
        let state: ViewState = serde_json::from_str(ok).unwrap();
        assert_eq!(state.current_turn, 1);

        let bad = r#"{"currentView":"decks","savedAt":5,"sidebarOpen":true}"#;
        assert!(serde_json::from_str::<ViewState>(bad).is_err());
    }
}
