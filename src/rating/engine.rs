//! Rating engine
//!
//! The single entry point that mutates entity standings. A match reads the
//! two current ratings, asks the calculator for the new ones and writes them
//! back together with the win/loss counters. No other record is touched.

use crate::error::{RankerError, Result};
use crate::rating::calculator::RatingCalculator;
use crate::rating::elo::{EloRatingCalculator, EloSettings};
use crate::store::EntityStore;
use crate::types::{MatchOutcome, RatingChange};
use crate::utils::current_timestamp;
use tracing::debug;

/// Applies pairwise results to an entity store
#[derive(Debug)]
pub struct RatingEngine {
    calculator: Box<dyn RatingCalculator>,
}

impl RatingEngine {
    pub fn new(calculator: Box<dyn RatingCalculator>) -> Self {
        Self { calculator }
    }

    /// Engine backed by the Elo calculator
    pub fn elo(settings: EloSettings) -> Result<Self> {
        Ok(Self::new(Box::new(EloRatingCalculator::new(settings)?)))
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Record that `winner_id` beat `loser_id`.
    ///
    /// Fails with `InvalidMatch` when both ids are the same or either one is
    /// not in the store; the store is left untouched in that case.
    pub fn record_match(
        &self,
        store: &mut EntityStore,
        winner_id: &str,
        loser_id: &str,
    ) -> Result<MatchOutcome> {
        if winner_id == loser_id {
            return Err(RankerError::InvalidMatch {
                reason: format!("{} cannot play against itself", winner_id),
            }
            .into());
        }

        let winner_rating = rating_of(store, winner_id)?;
        let loser_rating = rating_of(store, loser_id)?;

        let update = self.calculator.rate_match(winner_rating, loser_rating);

        if let Some(winner) = store.get_mut(winner_id) {
            winner.rating = update.winner_rating;
            winner.wins += 1;
        }
        if let Some(loser) = store.get_mut(loser_id) {
            loser.rating = update.loser_rating;
            loser.losses += 1;
        }

        let outcome = MatchOutcome {
            winner: RatingChange {
                entity_id: winner_id.to_string(),
                old_rating: winner_rating,
                new_rating: update.winner_rating,
            },
            loser: RatingChange {
                entity_id: loser_id.to_string(),
                old_rating: loser_rating,
                new_rating: update.loser_rating,
            },
            winner_expected: update.winner_expected,
            recorded_at: current_timestamp(),
        };

        debug!(
            "Recorded {} over {} - {:.1} -> {:.1} ({:+.2}), {:.1} -> {:.1} ({:+.2}), expected {:.3}",
            winner_id,
            loser_id,
            outcome.winner.old_rating,
            outcome.winner.new_rating,
            outcome.winner.delta(),
            outcome.loser.old_rating,
            outcome.loser.new_rating,
            outcome.loser.delta(),
            outcome.winner_expected
        );

        Ok(outcome)
    }
}

/// Record a match with a one-off Elo engine using the given K-factor
pub fn record_match(
    store: &mut EntityStore,
    winner_id: &str,
    loser_id: &str,
    k_factor: f64,
) -> Result<MatchOutcome> {
    let engine = RatingEngine::elo(EloSettings {
        k_factor,
        ..EloSettings::default()
    })?;
    engine.record_match(store, winner_id, loser_id)
}

fn rating_of(store: &EntityStore, id: &str) -> Result<f64> {
    store.get(id).map(|record| record.rating).ok_or_else(|| {
        RankerError::InvalidMatch {
            reason: format!("unknown entity {}", id),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ranker_error;
    use crate::types::{EntityMetadata, EntityRecord};

    const EPSILON: f64 = 1e-9;

    fn store(entries: &[(&str, f64)]) -> EntityStore {
        EntityStore::from_records(entries.iter().map(|(name, rating)| {
            EntityRecord::with_standing(EntityMetadata::named(*name), *rating, 0, 0)
        }))
    }

    fn engine() -> RatingEngine {
        RatingEngine::elo(EloSettings::default()).unwrap()
    }

    #[test]
    fn test_equal_ratings_scenario() {
        let mut store = store(&[("Bulbasaur", 1200.0), ("Charmander", 1200.0)]);

        let outcome = engine()
            .record_match(&mut store, "Bulbasaur", "Charmander")
            .unwrap();

        let winner = store.get("Bulbasaur").unwrap();
        let loser = store.get("Charmander").unwrap();
        assert!((winner.rating() - 1216.0).abs() < EPSILON);
        assert!((loser.rating() - 1184.0).abs() < EPSILON);
        assert_eq!((winner.wins(), winner.losses()), (1, 0));
        assert_eq!((loser.wins(), loser.losses()), (0, 1));
        assert!((outcome.winner.delta() - 16.0).abs() < EPSILON);
        assert!((outcome.loser.delta() + 16.0).abs() < EPSILON);
    }

    #[test]
    fn test_only_two_records_touched() {
        let mut store = store(&[("Mew", 1400.0), ("Ditto", 1200.0), ("Onix", 1300.0)]);
        let onix_before = store.get("Onix").cloned();

        engine().record_match(&mut store, "Mew", "Ditto").unwrap();

        assert_eq!(store.get("Onix").cloned(), onix_before);
        let mew = store.get("Mew").unwrap();
        assert!((mew.rating() - 1407.69).abs() < 0.01);
    }

    #[test]
    fn test_same_entity_rejected() {
        let mut store = store(&[("Mew", 1400.0), ("Ditto", 1200.0)]);
        let before = store.clone();

        let err = engine().record_match(&mut store, "Mew", "Mew").unwrap_err();
        assert!(matches!(
            ranker_error(&err),
            Some(RankerError::InvalidMatch { .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_unknown_entity_rejected() {
        let mut store = store(&[("Mew", 1400.0)]);
        let before = store.clone();

        for (winner, loser) in [("Mew", "Mewtwo"), ("Mewtwo", "Mew")] {
            let err = engine().record_match(&mut store, winner, loser).unwrap_err();
            assert!(matches!(
                ranker_error(&err),
                Some(RankerError::InvalidMatch { .. })
            ));
        }
        assert_eq!(store, before);
    }

    #[test]
    fn test_free_function_uses_k_factor() {
        let mut store = store(&[("Pichu", 1200.0), ("Raichu", 1200.0)]);
        record_match(&mut store, "Pichu", "Raichu", 10.0).unwrap();
        assert!((store.get("Pichu").unwrap().rating() - 1205.0).abs() < EPSILON);

        assert!(record_match(&mut store, "Pichu", "Raichu", -1.0).is_err());
    }
}
