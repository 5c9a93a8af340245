//! Session controller
//!
//! Drives the rating loop: present the current pair, take the operator's
//! choice, record it, persist the store and line up the next pair. The
//! controller owns the entity store outright, so every record-and-save
//! sequence runs to completion before the next one starts.

use crate::error::{ranker_error, Result};
use crate::matchmaking::{Matchmaker, PairSelection};
use crate::rating::RatingEngine;
use crate::store::{EntityStore, SnapshotStore};
use crate::types::{EntityRecord, MatchOutcome, Side};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info};

/// Counters for the running session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub started_at: DateTime<Utc>,
    /// Matches recorded since the session started
    pub matches_recorded: u64,
    /// Saves that failed and had to be retried
    pub failed_saves: u64,
}

impl SessionStats {
    fn new() -> Self {
        Self {
            started_at: current_timestamp(),
            matches_recorded: 0,
            failed_saves: 0,
        }
    }
}

/// Single-operator ranking session over one snapshot
pub struct SessionController<S: SnapshotStore, R: Rng> {
    store: EntityStore,
    engine: RatingEngine,
    matchmaker: Matchmaker,
    snapshots: S,
    rng: R,
    current: PairSelection,
    dirty: bool,
    stats: SessionStats,
}

impl<S: SnapshotStore, R: Rng> SessionController<S, R> {
    /// Start a session over an already loaded store and select the first pair
    pub fn new(
        store: EntityStore,
        engine: RatingEngine,
        matchmaker: Matchmaker,
        snapshots: S,
        mut rng: R,
    ) -> Result<Self> {
        let current = matchmaker.select_pair(&store, &mut rng)?;

        info!(
            "Session started over {} with {} entities, {} votes so far",
            snapshots.location(),
            store.len(),
            store.total_votes()
        );

        Ok(Self {
            store,
            engine,
            matchmaker,
            snapshots,
            rng,
            current,
            dirty: false,
            stats: SessionStats::new(),
        })
    }

    /// Load the store from `snapshots` and start a session over it
    pub fn open(
        snapshots: S,
        engine: RatingEngine,
        matchmaker: Matchmaker,
        rng: R,
    ) -> Result<Self> {
        let store = snapshots.load()?;
        Self::new(store, engine, matchmaker, snapshots, rng)
    }

    /// The two records currently presented, in A/B order
    pub fn current_pair(&self) -> (&EntityRecord, &EntityRecord) {
        let (a, b) = self.current.ids();
        match (self.store.get(a), self.store.get(b)) {
            (Some(a), Some(b)) => (a, b),
            // The store only changes through this controller and never loses
            // entities mid-session, so the selected ids always resolve
            _ => unreachable!("selected pair {} / {} missing from store", a, b),
        }
    }

    /// How the current pair was selected
    pub fn current_selection(&self) -> &PairSelection {
        &self.current
    }

    /// Record the operator's pick for the current pair and move to the next one.
    ///
    /// The match is applied in memory and the next pair is selected before the
    /// save. If the save fails the error is returned, the store stays marked
    /// as unsaved and the next `choose` or [`SessionController::flush`] retries.
    pub fn choose(&mut self, side: Side) -> Result<MatchOutcome> {
        let (a, b) = self.current.ids();
        let (winner, loser) = match side {
            Side::A => (a.to_string(), b.to_string()),
            Side::B => (b.to_string(), a.to_string()),
        };

        let outcome = self.engine.record_match(&mut self.store, &winner, &loser)?;
        self.stats.matches_recorded += 1;
        self.dirty = true;

        self.current = self.matchmaker.select_pair(&self.store, &mut self.rng)?;
        self.flush()?;

        Ok(outcome)
    }

    /// Persist the store if it has unsaved changes
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        match self.snapshots.save(&self.store) {
            Ok(()) => {
                self.dirty = false;
                debug!(
                    "Snapshot saved after {} matches this session",
                    self.stats.matches_recorded
                );
                Ok(())
            }
            Err(e) => {
                self.stats.failed_saves += 1;
                error!(
                    "Ranking progress not durable, save to {} failed ({} failures so far): {}",
                    self.snapshots.location(),
                    self.stats.failed_saves,
                    e
                );
                Err(e)
            }
        }
    }

    /// Whether matches have been recorded that are not on disk yet
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Leaderboard order: rating descending, then fewer wins, then id
    pub fn ranked(&self) -> Vec<&EntityRecord> {
        self.store.ranked()
    }

    /// The best `limit` entities in leaderboard order
    pub fn top(&self, limit: usize) -> Vec<&EntityRecord> {
        self.store.top(limit)
    }

    /// Total votes cast across all sessions
    pub fn total_votes(&self) -> u64 {
        self.store.total_votes()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn snapshots(&self) -> &S {
        &self.snapshots
    }

    pub fn engine(&self) -> &RatingEngine {
        &self.engine
    }

    /// End the session, handing back the store
    pub fn into_store(self) -> EntityStore {
        self.store
    }
}

/// Whether an error from [`SessionController::choose`] left the session usable
pub fn is_persistence_failure(err: &anyhow::Error) -> bool {
    ranker_error(err).map_or(false, |e| e.is_recoverable())
}
