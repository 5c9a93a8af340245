//! Pair selection for the next comparison
//!
//! A seed entity is drawn uniformly at random. Its partner usually comes from
//! the entities rated within the proximity threshold of the seed, which keeps
//! comparisons informative; with probability `exploration_rate`, or when no
//! entity is close enough, the partner is drawn from everyone else so distant
//! rating clusters keep getting compared.

use crate::error::{RankerError, Result};
use crate::store::EntityStore;
use crate::types::{EntityId, EntityRecord};
use crate::utils::ratings_within_proximity;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for pair selection behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingConfig {
    /// Partners rated strictly closer than this to the seed are candidates
    pub proximity_threshold: f64,
    /// Probability of ignoring proximity and pairing with anyone
    pub exploration_rate: f64,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 200.0,
            exploration_rate: 0.2,
        }
    }
}

impl MatchmakingConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.proximity_threshold.is_finite() || self.proximity_threshold < 0.0 {
            return Err(RankerError::ConfigurationError {
                message: format!(
                    "Proximity threshold must be a non-negative number, got {}",
                    self.proximity_threshold
                ),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(RankerError::ConfigurationError {
                message: format!(
                    "Exploration rate must be within [0, 1], got {}",
                    self.exploration_rate
                ),
            }
            .into());
        }

        Ok(())
    }
}

/// How the partner of a pair was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Drawn from the entities near the seed's rating
    Proximity,
    /// Exploration coin flip came up, drawn from everyone
    Exploration,
    /// Nobody was near the seed's rating, drawn from everyone
    Fallback,
}

/// A selected pair together with how it was found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSelection {
    pub seed: EntityId,
    pub partner: EntityId,
    pub strategy: SelectionStrategy,
    /// Size of the proximity candidate set for the seed
    pub candidate_count: usize,
}

impl PairSelection {
    pub fn ids(&self) -> (&str, &str) {
        (&self.seed, &self.partner)
    }

    pub fn into_pair(self) -> (EntityId, EntityId) {
        (self.seed, self.partner)
    }
}

/// Proximity-biased pair selector with exploration
#[derive(Debug, Clone, Default)]
pub struct Matchmaker {
    config: MatchmakingConfig,
}

impl Matchmaker {
    pub fn new(config: MatchmakingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    /// Select two distinct entities from the store.
    ///
    /// Fails with `InsufficientEntities` when fewer than two entities exist.
    pub fn select_pair<R: Rng + ?Sized>(
        &self,
        store: &EntityStore,
        rng: &mut R,
    ) -> Result<PairSelection> {
        let insufficient = || RankerError::InsufficientEntities { found: store.len() };

        if store.len() < 2 {
            return Err(insufficient().into());
        }

        // Ratings move after every match, so the order is rebuilt per call
        let mut ordered: Vec<&EntityRecord> = store.records().collect();
        ordered.sort_by(|a, b| a.rating.total_cmp(&b.rating).then_with(|| a.id.cmp(&b.id)));

        let seed = *ordered.choose(rng).ok_or_else(insufficient)?;

        let candidates: Vec<&EntityRecord> = ordered
            .iter()
            .copied()
            .filter(|record| {
                record.id != seed.id
                    && ratings_within_proximity(
                        record.rating,
                        seed.rating,
                        self.config.proximity_threshold,
                    )
            })
            .collect();

        let explore = rng.gen_bool(self.config.exploration_rate);

        let (partner, strategy) = if candidates.is_empty() || explore {
            let others: Vec<&EntityRecord> = ordered
                .iter()
                .copied()
                .filter(|record| record.id != seed.id)
                .collect();
            let strategy = if candidates.is_empty() {
                SelectionStrategy::Fallback
            } else {
                SelectionStrategy::Exploration
            };
            (*others.choose(rng).ok_or_else(insufficient)?, strategy)
        } else {
            (
                *candidates.choose(rng).ok_or_else(insufficient)?,
                SelectionStrategy::Proximity,
            )
        };

        debug!(
            "Selected {} ({:.1}) vs {} ({:.1}) via {:?}, {} candidates",
            seed.id,
            seed.rating,
            partner.id,
            partner.rating,
            strategy,
            candidates.len()
        );

        Ok(PairSelection {
            seed: seed.id.clone(),
            partner: partner.id.clone(),
            strategy,
            candidate_count: candidates.len(),
        })
    }
}

/// Select a pair with the given configuration, returning just the two ids
pub fn select_pair<R: Rng + ?Sized>(
    store: &EntityStore,
    config: &MatchmakingConfig,
    rng: &mut R,
) -> Result<(EntityId, EntityId)> {
    let matchmaker = Matchmaker::new(config.clone())?;
    Ok(matchmaker.select_pair(store, rng)?.into_pair())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ranker_error;
    use crate::types::EntityMetadata;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store(entries: &[(&str, f64)]) -> EntityStore {
        EntityStore::from_records(entries.iter().map(|(name, rating)| {
            EntityRecord::with_standing(EntityMetadata::named(*name), *rating, 0, 0)
        }))
    }

    fn matchmaker(proximity_threshold: f64, exploration_rate: f64) -> Matchmaker {
        Matchmaker::new(MatchmakingConfig {
            proximity_threshold,
            exploration_rate,
        })
        .unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(MatchmakingConfig::default().validate().is_ok());

        let negative = MatchmakingConfig {
            proximity_threshold: -1.0,
            ..MatchmakingConfig::default()
        };
        assert!(negative.validate().is_err());

        let too_likely = MatchmakingConfig {
            exploration_rate: 1.5,
            ..MatchmakingConfig::default()
        };
        assert!(too_likely.validate().is_err());
    }

    #[test]
    fn test_insufficient_entities() {
        let mut rng = StdRng::seed_from_u64(1);
        for entries in [&[][..], &[("Solo", 1200.0)][..]] {
            let err = Matchmaker::default()
                .select_pair(&store(entries), &mut rng)
                .unwrap_err();
            assert!(matches!(
                ranker_error(&err),
                Some(RankerError::InsufficientEntities { .. })
            ));
        }
    }

    #[test]
    fn test_two_entities_always_pair_up() {
        let store = store(&[("Plusle", 1200.0), ("Minun", 1900.0)]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let selection = matchmaker(200.0, 0.0).select_pair(&store, &mut rng).unwrap();
            assert_ne!(selection.seed, selection.partner);
            assert_eq!(selection.strategy, SelectionStrategy::Fallback);
            assert_eq!(selection.candidate_count, 0);
        }
    }

    #[test]
    fn test_no_exploration_stays_within_threshold() {
        // Two tight clusters far apart: every seed has a near neighbour
        let store = store(&[
            ("Geodude", 1000.0),
            ("Graveler", 1050.0),
            ("Golem", 1100.0),
            ("Dratini", 1800.0),
            ("Dragonair", 1850.0),
            ("Dragonite", 1900.0),
        ]);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let selection = matchmaker(200.0, 0.0).select_pair(&store, &mut rng).unwrap();
            let seed = store.get(&selection.seed).unwrap();
            let partner = store.get(&selection.partner).unwrap();

            assert_eq!(selection.strategy, SelectionStrategy::Proximity);
            assert_eq!(selection.candidate_count, 2);
            assert!((seed.rating() - partner.rating()).abs() < 200.0);
        }
    }

    #[test]
    fn test_fallback_exactly_when_no_candidates() {
        let store = store(&[
            ("Magikarp", 800.0),
            ("Gyarados", 1500.0),
            ("Feebas", 1550.0),
            ("Milotic", 2300.0),
        ]);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..500 {
            let selection = matchmaker(200.0, 0.2).select_pair(&store, &mut rng).unwrap();
            let isolated = selection.seed == "Magikarp" || selection.seed == "Milotic";

            assert_eq!(selection.candidate_count == 0, isolated);
            assert_eq!(
                selection.strategy == SelectionStrategy::Fallback,
                isolated
            );
        }
    }

    #[test]
    fn test_full_exploration_reaches_distant_entities() {
        let store = store(&[
            ("Caterpie", 1000.0),
            ("Metapod", 1010.0),
            ("Butterfree", 3000.0),
        ]);
        let mut rng = StdRng::seed_from_u64(11);

        let mut crossed_gap = false;
        for _ in 0..200 {
            let selection = matchmaker(200.0, 1.0).select_pair(&store, &mut rng).unwrap();
            assert_ne!(selection.strategy, SelectionStrategy::Proximity);
            if selection.partner == "Butterfree" && selection.seed != "Butterfree" {
                crossed_gap = true;
            }
        }
        assert!(crossed_gap);
    }

    #[test]
    fn test_exploration_rate_is_respected_statistically() {
        let store = store(&[
            ("Pidgey", 1200.0),
            ("Pidgeotto", 1210.0),
            ("Pidgeot", 1220.0),
            ("Spearow", 1230.0),
        ]);
        let mut rng = StdRng::seed_from_u64(2024);

        let trials = 5000;
        let explored = (0..trials)
            .filter(|_| {
                matchmaker(200.0, 0.2)
                    .select_pair(&store, &mut rng)
                    .unwrap()
                    .strategy
                    == SelectionStrategy::Exploration
            })
            .count();

        let rate = explored as f64 / trials as f64;
        assert!((0.16..0.24).contains(&rate), "exploration rate {}", rate);
    }

    #[test]
    fn test_seed_choice_is_spread_out() {
        let store = store(&[("Oddish", 1200.0), ("Gloom", 1200.0), ("Vileplume", 1200.0)]);
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..300 {
            let (seed, partner) =
                select_pair(&store, &MatchmakingConfig::default(), &mut rng).unwrap();
            assert_ne!(seed, partner);
            assert!(store.contains(&seed) && store.contains(&partner));
            seen.insert(seed);
        }
        assert_eq!(seen.len(), 3);
    }
}
