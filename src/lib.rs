//! Pokémon Ranker - Pairwise Elo ranking of Pokémon
//!
//! This crate presents two Pokémon at a time, records which one the operator
//! prefers, updates Elo ratings and persists the standings to a JSON snapshot.

pub mod config;
pub mod display;
pub mod error;
pub mod matchmaking;
pub mod rating;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankerError, Result};
pub use types::*;

// Re-export key components
pub use matchmaking::{select_pair, Matchmaker, MatchmakingConfig};
pub use rating::{expected_score, record_match, RatingEngine};
pub use session::SessionController;
pub use store::{EntityStore, JsonSnapshotStore, SnapshotStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
