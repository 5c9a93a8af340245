//! Test fixtures and snapshot store doubles for integration testing

#![allow(dead_code)]

use pokemon_ranker::error::{RankerError, Result};
use pokemon_ranker::store::{EntityStore, InMemorySnapshotStore, SnapshotStore};
use pokemon_ranker::types::{EntityMetadata, EntityRecord};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Metadata for a Pokémon with the fields the display and import paths use
pub fn pokemon(name: &str, dex: u32, types: &[&str], generation: &str) -> EntityMetadata {
    EntityMetadata {
        name: name.to_string(),
        pokedex_number: dex,
        types: types.iter().map(|t| t.to_string()).collect(),
        image_url: Some(format!("https://img.example/{}.png", dex)),
        sprite_url: Some(format!("https://sprites.example/{}.png", dex)),
        generation: generation.to_string(),
        region: String::new(),
        height: 1.0,
        weight: 10.0,
        abilities: vec!["overgrow".to_string()],
        stats: [("hp".to_string(), 45), ("speed".to_string(), 45)]
            .into_iter()
            .collect(),
    }
}

/// A record with a given standing
pub fn ranked(name: &str, rating: f64, wins: u32, losses: u32) -> EntityRecord {
    EntityRecord::with_standing(EntityMetadata::named(name), rating, wins, losses)
}

/// A store of fresh entities all at `rating`
pub fn uniform_store(names: &[&str], rating: f64) -> EntityStore {
    EntityStore::from_records(names.iter().map(|name| ranked(name, rating, 0, 0)))
}

/// The nine Kanto starters plus Pikachu, unranked
pub fn kanto_store() -> EntityStore {
    uniform_store(
        &[
            "Bulbasaur",
            "Ivysaur",
            "Venusaur",
            "Charmander",
            "Charmeleon",
            "Charizard",
            "Squirtle",
            "Wartortle",
            "Blastoise",
            "Pikachu",
        ],
        1200.0,
    )
}

/// Snapshot store whose first `failures` saves fail with a persistence error
#[derive(Debug, Default)]
pub struct FailingSnapshotStore {
    inner: InMemorySnapshotStore,
    failures: usize,
    attempts: AtomicUsize,
}

impl FailingSnapshotStore {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: InMemorySnapshotStore::new(),
            failures,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> &InMemorySnapshotStore {
        &self.inner
    }
}

impl SnapshotStore for FailingSnapshotStore {
    fn load(&self) -> Result<EntityStore> {
        self.inner.load()
    }

    fn save(&self, store: &EntityStore) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(RankerError::PersistenceError {
                path: self.location(),
                message: "simulated write failure".to_string(),
            }
            .into());
        }
        self.inner.save(store)
    }

    fn location(&self) -> String {
        "failing-memory".to_string()
    }
}
