//! Durable snapshots of the entity store
//!
//! The snapshot is a pretty-printed JSON object keyed by entity id. Saves go
//! through a temporary file that is fsynced and renamed over the target, so a
//! crash mid-write leaves either the old or the new snapshot on disk.

use crate::error::{RankerError, Result};
use crate::store::entity_store::EntityStore;
use crate::types::{EntityMetadata, EntityRecord, DEFAULT_RATING};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Default snapshot file name, relative to the working directory
pub const DEFAULT_SNAPSHOT_PATH: &str = "pokemon_data.json";

/// Trait for loading and saving the whole entity store
#[cfg_attr(test, mockall::automock)]
pub trait SnapshotStore {
    /// Read the persisted store; a store that was never saved loads as empty
    fn load(&self) -> Result<EntityStore>;

    /// Persist the full store atomically
    fn save(&self, store: &EntityStore) -> Result<()>;

    /// Human-readable location used in logs and errors
    fn location(&self) -> String;
}

/// On-disk layout of a single record. Field order follows the snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pokedex_number: Option<u32>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    sprite_url: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    generation: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    wins: Option<u32>,
    #[serde(default)]
    losses: Option<u32>,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    stats: BTreeMap<String, u32>,
}

impl From<&EntityRecord> for SnapshotRecord {
    fn from(record: &EntityRecord) -> Self {
        let metadata = &record.metadata;
        Self {
            name: Some(metadata.name.clone()),
            pokedex_number: Some(metadata.pokedex_number),
            types: metadata.types.clone(),
            image_url: metadata.image_url.clone(),
            sprite_url: metadata.sprite_url.clone(),
            rating: Some(record.rating),
            generation: metadata.generation.clone(),
            region: metadata.region.clone(),
            wins: Some(record.wins),
            losses: Some(record.losses),
            height: metadata.height,
            weight: metadata.weight,
            abilities: metadata.abilities.clone(),
            stats: metadata.stats.clone(),
        }
    }
}

/// Counts of fields filled in while reading an older snapshot
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Normalization {
    pub missing_names: usize,
    /// Absent or zero; dex numbers start at 1
    pub missing_pokedex_numbers: usize,
    pub missing_ratings: usize,
    pub missing_wins: usize,
    pub missing_losses: usize,
}

impl Normalization {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Decode snapshot JSON into a store, backfilling fields older snapshots lack
pub fn decode_snapshot(
    contents: &str,
    initial_rating: f64,
) -> std::result::Result<(EntityStore, Normalization), serde_json::Error> {
    let raw: BTreeMap<String, SnapshotRecord> = serde_json::from_str(contents)?;
    let mut normalization = Normalization::default();

    let records = raw.into_iter().map(|(id, entry)| {
        let name = entry.name.unwrap_or_else(|| {
            normalization.missing_names += 1;
            id.clone()
        });
        let pokedex_number = match entry.pokedex_number {
            Some(number) if number > 0 => number,
            _ => {
                normalization.missing_pokedex_numbers += 1;
                0
            }
        };
        let rating = entry.rating.unwrap_or_else(|| {
            normalization.missing_ratings += 1;
            initial_rating
        });
        let wins = entry.wins.unwrap_or_else(|| {
            normalization.missing_wins += 1;
            0
        });
        let losses = entry.losses.unwrap_or_else(|| {
            normalization.missing_losses += 1;
            0
        });

        let metadata = EntityMetadata {
            name,
            pokedex_number,
            types: entry.types,
            image_url: entry.image_url,
            sprite_url: entry.sprite_url,
            generation: entry.generation,
            region: entry.region,
            height: entry.height,
            weight: entry.weight,
            abilities: entry.abilities,
            stats: entry.stats,
        };

        let mut record = EntityRecord::with_standing(metadata, rating, wins, losses);
        record.id = id;
        record
    });

    let store = EntityStore::from_records(records.collect::<Vec<_>>());
    Ok((store, normalization))
}

/// Encode a store as indented snapshot JSON
pub fn encode_snapshot(store: &EntityStore) -> std::result::Result<Vec<u8>, serde_json::Error> {
    let raw: BTreeMap<&str, SnapshotRecord> = store
        .records()
        .map(|record| (record.id.as_str(), SnapshotRecord::from(record)))
        .collect();

    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    raw.serialize(&mut serializer)?;
    Ok(buffer)
}

/// JSON file snapshot store
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
    initial_rating: f64,
}

impl JsonSnapshotStore {
    /// Create a store for the given snapshot file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            initial_rating: DEFAULT_RATING,
        }
    }

    /// Rating used to backfill records that were saved without one
    pub fn with_initial_rating(mut self, initial_rating: f64) -> Self {
        self.initial_rating = initial_rating;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        PathBuf::from(tmp_path)
    }

    fn corrupt(&self, reason: impl Into<String>) -> anyhow::Error {
        RankerError::CorruptSnapshot {
            path: self.location(),
            reason: reason.into(),
        }
        .into()
    }

    fn persistence(&self, err: std::io::Error) -> anyhow::Error {
        RankerError::PersistenceError {
            path: self.location(),
            message: err.to_string(),
        }
        .into()
    }

    fn write_atomically(&self, payload: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path();
        let written = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .and_then(|mut file| {
                file.write_all(payload)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp_path, &self.path));

        if written.is_err() {
            // A partial temp file must not linger next to the snapshot
            if let Err(e) = fs::remove_file(&tmp_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", tmp_path.display(), e);
                }
            }
        }
        written
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Result<EntityStore> {
        if !self.path.exists() {
            info!(
                "No snapshot at {}, starting with an empty store",
                self.location()
            );
            return Ok(EntityStore::new());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| self.corrupt(format!("unreadable: {}", e)))?;
        let (store, normalization) = decode_snapshot(&contents, self.initial_rating)
            .map_err(|e| self.corrupt(e.to_string()))?;

        if !normalization.is_clean() {
            warn!(
                "Backfilled snapshot fields in {} - names: {}, pokedex numbers: {}, ratings: {}, wins: {}, losses: {}",
                self.location(),
                normalization.missing_names,
                normalization.missing_pokedex_numbers,
                normalization.missing_ratings,
                normalization.missing_wins,
                normalization.missing_losses
            );
        }

        info!(
            "Loaded {} entities from {}",
            store.len(),
            self.location()
        );
        Ok(store)
    }

    fn save(&self, store: &EntityStore) -> Result<()> {
        let payload = encode_snapshot(store).map_err(|e| RankerError::PersistenceError {
            path: self.location(),
            message: format!("serialization failed: {}", e),
        })?;

        self.write_atomically(&payload)
            .map_err(|e| self.persistence(e))?;

        debug!(
            "Saved {} entities ({} bytes) to {}",
            store.len(),
            payload.len(),
            self.location()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Snapshot store kept in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    contents: RwLock<Option<Vec<u8>>>,
    saves: RwLock<usize>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing snapshot
    pub fn with_store(store: &EntityStore) -> Result<Self> {
        let snapshots = Self::new();
        snapshots.save(store)?;
        if let Ok(mut saves) = snapshots.saves.write() {
            *saves = 0;
        }
        Ok(snapshots)
    }

    /// Number of successful saves since creation
    pub fn save_count(&self) -> usize {
        self.saves.read().map(|saves| *saves).unwrap_or_default()
    }

    /// The raw snapshot bytes last saved
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.contents
            .read()
            .map(|contents| contents.clone())
            .unwrap_or_default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<EntityStore> {
        let contents = self.contents();
        let Some(bytes) = contents else {
            return Ok(EntityStore::new());
        };

        let text = String::from_utf8(bytes).map_err(|e| RankerError::CorruptSnapshot {
            path: self.location(),
            reason: e.to_string(),
        })?;
        let (store, _) =
            decode_snapshot(&text, DEFAULT_RATING).map_err(|e| RankerError::CorruptSnapshot {
                path: self.location(),
                reason: e.to_string(),
            })?;
        Ok(store)
    }

    fn save(&self, store: &EntityStore) -> Result<()> {
        let payload = encode_snapshot(store).map_err(|e| RankerError::PersistenceError {
            path: self.location(),
            message: e.to_string(),
        })?;

        let mut contents = self
            .contents
            .write()
            .map_err(|_| RankerError::PersistenceError {
                path: self.location(),
                message: "Failed to acquire snapshot write lock".to_string(),
            })?;
        *contents = Some(payload);

        if let Ok(mut saves) = self.saves.write() {
            *saves += 1;
        }
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
