//! Elo rating system implementation
//!
//! This module provides the concrete rating calculator using the Elo
//! implementation from the skillratings crate.

use crate::error::{RankerError, Result};
use crate::rating::calculator::{RatingCalculator, RatingUpdate};
use crate::types::DEFAULT_RATING;
use serde::{Deserialize, Serialize};
use skillratings::elo::{elo, EloConfig, EloRating};
use skillratings::Outcomes;

/// Default K-factor
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Elo parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloSettings {
    /// Rating volatility per match: higher moves faster, lower gives a more
    /// stable long-run ranking
    pub k_factor: f64,
    /// Rating assigned to newly imported entities
    pub initial_rating: f64,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            initial_rating: DEFAULT_RATING,
        }
    }
}

impl EloSettings {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(RankerError::ConfigurationError {
                message: format!("K-factor must be positive, got {}", self.k_factor),
            }
            .into());
        }

        if !self.initial_rating.is_finite() {
            return Err(RankerError::ConfigurationError {
                message: "Initial rating must be a finite number".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Logistic expectation of `rating_a` scoring against `rating_b`:
/// `1 / (1 + 10^((rating_b - rating_a) / 400))`
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    let (expected_a, _) = skillratings::elo::expected_score(
        &EloRating { rating: rating_a },
        &EloRating { rating: rating_b },
    );
    expected_a
}

/// Elo rating calculator implementation
#[derive(Debug, Clone)]
pub struct EloRatingCalculator {
    settings: EloSettings,
    elo_config: EloConfig,
}

impl EloRatingCalculator {
    /// Create a new Elo rating calculator
    pub fn new(settings: EloSettings) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            elo_config: EloConfig {
                k: settings.k_factor,
            },
            settings,
        })
    }

    pub fn k_factor(&self) -> f64 {
        self.settings.k_factor
    }

    pub fn settings(&self) -> &EloSettings {
        &self.settings
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn expected_score(&self, rating: f64, opponent: f64) -> f64 {
        expected_score(rating, opponent)
    }

    fn rate_match(&self, winner_rating: f64, loser_rating: f64) -> RatingUpdate {
        let winner = EloRating {
            rating: winner_rating,
        };
        let loser = EloRating {
            rating: loser_rating,
        };

        let (new_winner, new_loser) = elo(&winner, &loser, &Outcomes::WIN, &self.elo_config);

        RatingUpdate {
            winner_rating: new_winner.rating,
            loser_rating: new_loser.rating,
            winner_expected: expected_score(winner_rating, loser_rating),
        }
    }

    fn initial_rating(&self) -> f64 {
        self.settings.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.settings).unwrap_or(serde_json::Value::Null)
    }
}
