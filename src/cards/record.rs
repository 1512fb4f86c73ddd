//! Card records - static card metadata fetched from the card API.
//!
//! A `CardRecord` is never mutated once cached, except that the store
//! refreshes `cached_at` when it is fetched again. Per-game state (tapped,
//! counters, position) lives in `CardInstance`.
//!
//! Field names follow the card API's JSON so responses deserialize directly.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Opaque card identifier (the card API's id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image URLs at the sizes the card API provides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUris {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
}

impl ImageUris {
    /// Candidates in preference order: normal, large, small.
    fn ranked(&self) -> impl Iterator<Item = &str> {
        [&self.normal, &self.large, &self.small]
            .into_iter()
            .filter_map(|uri| uri.as_deref())
    }
}

/// One face of a multi-faced card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

/// Cached card metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,

    #[serde(default)]
    pub name: String,

    /// Free-text type classification ("Legendary Creature — Elf Druid").
    #[serde(default)]
    pub type_line: String,

    #[serde(default)]
    pub mana_cost: String,

    #[serde(default)]
    pub image_uris: Option<ImageUris>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_faces: Vec<CardFace>,

    /// Placeholder for a card the API could not resolve.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,

    /// Insertion time in the record cache (ms since epoch). Zero until cached.
    #[serde(rename = "cachedAt", default)]
    pub cached_at: i64,
}

impl CardRecord {
    /// Create a record with a name and type line.
    #[must_use]
    pub fn new(id: impl Into<CardId>, name: impl Into<String>, type_line: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            type_line: type_line.into(),
            mana_cost: String::new(),
            image_uris: None,
            card_faces: Vec::new(),
            error: false,
            cached_at: 0,
        }
    }

    /// Placeholder recorded for an id the card API did not resolve.
    #[must_use]
    pub fn not_found(id: impl Into<CardId>) -> Self {
        Self {
            error: true,
            ..Self::new(id, "Card not found", "Error")
        }
    }

    /// Set the mana cost (builder pattern).
    #[must_use]
    pub fn with_mana_cost(mut self, cost: impl Into<String>) -> Self {
        self.mana_cost = cost.into();
        self
    }

    /// Set the single-faced image URLs (builder pattern).
    #[must_use]
    pub fn with_images(mut self, images: ImageUris) -> Self {
        self.image_uris = Some(images);
        self
    }

    /// Add a face (builder pattern).
    #[must_use]
    pub fn with_face(mut self, face: CardFace) -> Self {
        self.card_faces.push(face);
        self
    }

    /// Image URL candidates, best first.
    ///
    /// Uses the card's own images when present, otherwise the first face's.
    #[must_use]
    pub fn image_candidates(&self) -> SmallVec<[&str; 3]> {
        if let Some(uris) = &self.image_uris {
            return uris.ranked().collect();
        }
        self.card_faces
            .first()
            .and_then(|face| face.image_uris.as_ref())
            .map(|uris| uris.ranked().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_creature(&self) -> bool {
        self.type_line.contains("Creature")
    }

    #[must_use]
    pub fn is_land(&self) -> bool {
        self.type_line.contains("Land")
    }

    /// Instants and sorceries.
    #[must_use]
    pub fn is_spell(&self) -> bool {
        self.type_line.contains("Instant") || self.type_line.contains("Sorcery")
    }

    /// Legendary creatures and legendary planeswalkers can lead a deck.
    #[must_use]
    pub fn is_commander_candidate(&self) -> bool {
        self.type_line.contains("Legendary Creature")
            || self.type_line.contains("Legendary Planeswalker")
    }
}
