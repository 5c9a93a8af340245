//! In-memory entity store
//!
//! Holds exactly one record per entity id. Reads are public; the ranking
//! fields can only be changed from inside the crate, which in practice means
//! through the rating engine's `record_match`.

use crate::types::{EntityId, EntityMetadata, EntityRecord};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Owned mapping of entity id to entity record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityStore {
    records: BTreeMap<EntityId, EntityRecord>,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records; a later record with the same id replaces an earlier one
    pub fn from_records(records: impl IntoIterator<Item = EntityRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self { records }
    }

    pub fn get(&self, id: &str) -> Option<&EntityRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Entity ids in key order
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.records.keys()
    }

    /// Records in key order
    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    /// Total votes cast so far; every match produces exactly one win
    pub fn total_votes(&self) -> u64 {
        self.records.values().map(|r| u64::from(r.wins)).sum()
    }

    /// All records sorted for leaderboard display.
    ///
    /// Highest rating first; equal ratings put the entity with fewer wins
    /// first, then fall back to id order so the listing is deterministic.
    pub fn ranked(&self) -> Vec<&EntityRecord> {
        let mut ranked: Vec<&EntityRecord> = self.records.values().collect();
        ranked.sort_by(|a, b| leaderboard_order(a, b));
        ranked
    }

    /// The first `limit` entries of [`EntityStore::ranked`]
    pub fn top(&self, limit: usize) -> Vec<&EntityRecord> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }

    pub(crate) fn insert(&mut self, record: EntityRecord) -> Option<EntityRecord> {
        self.records.insert(record.id.clone(), record)
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<EntityRecord> {
        self.records.remove(id)
    }

    /// Replace the metadata of an existing record, keeping its standing
    pub(crate) fn refresh_metadata(&mut self, id: &str, metadata: EntityMetadata) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.metadata = metadata;
                true
            }
            None => false,
        }
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut EntityRecord> {
        self.records.get_mut(id)
    }
}

fn leaderboard_order(a: &EntityRecord, b: &EntityRecord) -> Ordering {
    b.rating
        .total_cmp(&a.rating)
        .then_with(|| a.wins.cmp(&b.wins))
        .then_with(|| a.id.cmp(&b.id))
}
