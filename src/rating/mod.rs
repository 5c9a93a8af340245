//! Pairwise rating using the Elo system
//!
//! This module provides the rating calculator interface, its Elo
//! implementation on top of the skillratings crate, and the engine that
//! writes match results into the entity store.

pub mod calculator;
pub mod elo;
pub mod engine;

// Re-export commonly used types
pub use calculator::{RatingCalculator, RatingUpdate};
pub use elo::{expected_score, EloRatingCalculator, EloSettings, DEFAULT_K_FACTOR};
pub use engine::{record_match, RatingEngine};
