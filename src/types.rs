//! Common types used throughout the ranking engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for ranked entities (the capitalized Pokémon name)
pub type EntityId = String;

/// Default rating assigned to newly imported entities
pub const DEFAULT_RATING: f64 = 1200.0;

/// Descriptive metadata set at import time and never touched by the ranking engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default)]
    pub pokedex_number: u32,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sprite_url: Option<String>,
    #[serde(default)]
    pub generation: String,
    #[serde(default)]
    pub region: String,
    /// Height in meters
    #[serde(default)]
    pub height: f64,
    /// Weight in kilograms
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Base stats keyed by stat name
    #[serde(default)]
    pub stats: BTreeMap<String, u32>,
}

impl EntityMetadata {
    /// Minimal metadata carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One ranked entity: immutable metadata plus the standing the engine maintains.
///
/// `rating`, `wins` and `losses` are only writable inside the crate; outside
/// code reads them through accessors and changes them by recording matches.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub metadata: EntityMetadata,
    pub(crate) rating: f64,
    pub(crate) wins: u32,
    pub(crate) losses: u32,
}

impl EntityRecord {
    /// Create a record for a freshly imported entity
    pub fn new(metadata: EntityMetadata, initial_rating: f64) -> Self {
        Self::with_standing(metadata, initial_rating, 0, 0)
    }

    /// Create a record with an existing standing, as read back from a snapshot
    pub fn with_standing(metadata: EntityMetadata, rating: f64, wins: u32, losses: u32) -> Self {
        Self {
            id: metadata.name.clone(),
            metadata,
            rating,
            wins,
            losses,
        }
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    /// Number of matches this entity has taken part in
    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Position of an entity in the presented pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Rating change for one side of a recorded match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingChange {
    pub entity_id: EntityId,
    pub old_rating: f64,
    pub new_rating: f64,
}

impl RatingChange {
    pub fn delta(&self) -> f64 {
        self.new_rating - self.old_rating
    }
}

/// Result of recording a single pairwise comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: RatingChange,
    pub loser: RatingChange,
    /// Expected score of the winner before the match
    pub winner_expected: f64,
    pub recorded_at: DateTime<Utc>,
}
