//! Rating calculator trait
//!
//! This module defines the interface for pairwise rating calculations. The
//! engine only ever asks a calculator for numbers; writing them back into the
//! store is the engine's job.

use serde::{Deserialize, Serialize};

/// New ratings for both sides of a decided match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingUpdate {
    pub winner_rating: f64,
    pub loser_rating: f64,
    /// Expected score of the winner before the match (0.0 to 1.0)
    pub winner_expected: f64,
}

/// Trait for calculating rating changes after a pairwise comparison
pub trait RatingCalculator: Send + Sync + std::fmt::Debug {
    /// Expected score of a player rated `rating` against one rated `opponent`
    fn expected_score(&self, rating: f64, opponent: f64) -> f64;

    /// Calculate post-match ratings given the current winner and loser ratings
    fn rate_match(&self, winner_rating: f64, loser_rating: f64) -> RatingUpdate;

    /// Get the initial rating for new entities
    fn initial_rating(&self) -> f64;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}
