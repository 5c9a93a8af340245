//! Matchmaking: choosing which two entities to compare next
//!
//! Selection is a probabilistic policy that balances rating proximity against
//! exploration across the whole population.

pub mod selector;

pub use selector::{select_pair, Matchmaker, MatchmakingConfig, PairSelection, SelectionStrategy};
