//! Metadata import
//!
//! Merges a freshly acquired metadata snapshot into the entity store. Known
//! entities get their metadata replaced while rating, wins and losses stay as
//! they were; unknown entities start at the initial rating.

use crate::error::{RankerError, Result};
use crate::store::entity_store::EntityStore;
use crate::types::{EntityMetadata, EntityRecord, DEFAULT_RATING};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Options controlling an import merge
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Rating given to entities that are not in the store yet
    pub initial_rating: f64,
    /// Drop entities that are missing from the incoming metadata
    pub prune_missing: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_RATING,
            prune_missing: false,
        }
    }
}

/// Summary of an import merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub refreshed: usize,
    pub pruned: usize,
}

/// Accepted layouts of a metadata file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MetadataFile {
    Keyed(BTreeMap<String, EntityMetadataEntry>),
    List(Vec<EntityMetadata>),
}

/// Keyed entries may omit the name and rely on the map key
#[derive(Debug, Deserialize)]
struct EntityMetadataEntry {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    rest: EntityMetadataFields,
}

#[derive(Debug, Deserialize)]
struct EntityMetadataFields {
    #[serde(default)]
    pokedex_number: u32,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    sprite_url: Option<String>,
    #[serde(default)]
    generation: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    abilities: Vec<String>,
    #[serde(default)]
    stats: BTreeMap<String, u32>,
}

impl EntityMetadataEntry {
    fn into_metadata(self, key: String) -> EntityMetadata {
        let name = if self.name.trim().is_empty() {
            key
        } else {
            self.name
        };
        let rest = self.rest;
        EntityMetadata {
            name,
            pokedex_number: rest.pokedex_number,
            types: rest.types,
            image_url: rest.image_url,
            sprite_url: rest.sprite_url,
            generation: rest.generation,
            region: rest.region,
            height: rest.height,
            weight: rest.weight,
            abilities: rest.abilities,
            stats: rest.stats,
        }
    }
}

/// Parse a metadata file, either a snapshot-shaped object or an array of records.
///
/// Ranking fields present in the file are ignored.
pub fn parse_metadata(contents: &str) -> Result<Vec<EntityMetadata>> {
    let parsed: MetadataFile =
        serde_json::from_str(contents).map_err(|e| RankerError::ImportFailed {
            reason: format!("unreadable metadata: {}", e),
        })?;

    Ok(match parsed {
        MetadataFile::Keyed(entries) => entries
            .into_iter()
            .map(|(key, entry)| entry.into_metadata(key))
            .collect(),
        MetadataFile::List(entries) => entries,
    })
}

/// Read and parse a metadata file from disk
pub fn read_metadata_file(path: &Path) -> Result<Vec<EntityMetadata>> {
    let contents = fs::read_to_string(path).map_err(|e| RankerError::ImportFailed {
        reason: format!("cannot read {}: {}", path.display(), e),
    })?;
    parse_metadata(&contents)
}

/// Capitalize the first character and lowercase the rest, e.g. `mr-mime` -> `Mr-mime`
pub fn capitalize_name(name: &str) -> String {
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Region a generation was introduced in; accepts `IV`, `Iv` or `generation-iv`
pub fn region_for_generation(generation: &str) -> &'static str {
    let generation = generation.trim().to_ascii_uppercase();
    let numeral = generation
        .strip_prefix("GENERATION-")
        .unwrap_or(&generation);

    match numeral {
        "I" => "Kanto",
        "II" => "Johto",
        "III" => "Hoenn",
        "IV" => "Sinnoh",
        "V" => "Unova",
        "VI" => "Kalos",
        "VII" => "Alola",
        "VIII" => "Galar",
        "IX" => "Paldea",
        _ => "Unknown",
    }
}

fn normalize(mut metadata: EntityMetadata) -> Result<EntityMetadata> {
    metadata.name = capitalize_name(&metadata.name);
    if metadata.name.is_empty() {
        return Err(RankerError::ImportFailed {
            reason: format!(
                "entity with pokedex number {} has no name",
                metadata.pokedex_number
            ),
        }
        .into());
    }
    if metadata.region.trim().is_empty() {
        metadata.region = region_for_generation(&metadata.generation).to_string();
    }
    Ok(metadata)
}

/// Merge incoming metadata into the store.
///
/// The whole batch is validated before the store is touched, so a rejected
/// import leaves the store unchanged.
pub fn merge_import(
    store: &mut EntityStore,
    incoming: Vec<EntityMetadata>,
    options: &ImportOptions,
) -> Result<ImportReport> {
    let mut seen = HashSet::new();
    let mut batch = Vec::with_capacity(incoming.len());
    for metadata in incoming {
        let metadata = normalize(metadata)?;
        if !seen.insert(metadata.name.clone()) {
            return Err(RankerError::ImportFailed {
                reason: format!("duplicate entity {}", metadata.name),
            }
            .into());
        }
        batch.push(metadata);
    }

    let mut report = ImportReport::default();

    if options.prune_missing {
        let stale: Vec<String> = store
            .ids()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            store.remove(&id);
            debug!("Pruned {} (absent from import)", id);
            report.pruned += 1;
        }
    }

    for metadata in batch {
        let id = metadata.name.clone();
        if store.contains(&id) {
            store.refresh_metadata(&id, metadata);
            report.refreshed += 1;
        } else {
            store.insert(EntityRecord::new(metadata, options.initial_rating));
            report.added += 1;
        }
    }

    info!(
        "Import merged - added: {}, refreshed: {}, pruned: {}, total: {}",
        report.added,
        report.refreshed,
        report.pruned,
        store.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ranker_error;

    fn stored(name: &str, rating: f64, wins: u32, losses: u32) -> EntityRecord {
        EntityRecord::with_standing(EntityMetadata::named(name), rating, wins, losses)
    }

    #[test]
    fn test_reimport_preserves_standing() {
        let mut store = EntityStore::from_records(vec![stored("Pikachu", 1333.3, 5, 2)]);

        let mut refreshed = EntityMetadata::named("pikachu");
        refreshed.pokedex_number = 25;
        refreshed.image_url = Some("https://img.example/pikachu-new.png".to_string());
        refreshed.generation = "I".to_string();

        let report = merge_import(&mut store, vec![refreshed], &ImportOptions::default()).unwrap();
        assert_eq!(
            report,
            ImportReport {
                added: 0,
                refreshed: 1,
                pruned: 0
            }
        );

        let pikachu = store.get("Pikachu").unwrap();
        assert_eq!(pikachu.rating(), 1333.3);
        assert_eq!((pikachu.wins(), pikachu.losses()), (5, 2));
        assert_eq!(
            pikachu.metadata.image_url.as_deref(),
            Some("https://img.example/pikachu-new.png")
        );
        assert_eq!(pikachu.metadata.region, "Kanto");
    }

    #[test]
    fn test_new_entities_start_fresh() {
        let mut store = EntityStore::new();
        let options = ImportOptions {
            initial_rating: 1500.0,
            prune_missing: false,
        };

        merge_import(
            &mut store,
            vec![EntityMetadata::named("Sprigatito")],
            &options,
        )
        .unwrap();

        let sprigatito = store.get("Sprigatito").unwrap();
        assert_eq!(sprigatito.rating(), 1500.0);
        assert_eq!(sprigatito.matches_played(), 0);
    }

    #[test]
    fn test_prune_missing() {
        let mut store = EntityStore::from_records(vec![
            stored("Pikachu", 1250.0, 3, 0),
            stored("Missingno", 1100.0, 0, 3),
        ]);
        let options = ImportOptions {
            prune_missing: true,
            ..ImportOptions::default()
        };

        let report =
            merge_import(&mut store, vec![EntityMetadata::named("Pikachu")], &options).unwrap();

        assert_eq!(report.pruned, 1);
        assert!(!store.contains("Missingno"));
        assert_eq!(store.get("Pikachu").unwrap().wins(), 3);
    }

    #[test]
    fn test_duplicate_names_rejected_without_changes() {
        let mut store = EntityStore::from_records(vec![stored("Eevee", 1200.0, 0, 0)]);
        let before = store.clone();

        let err = merge_import(
            &mut store,
            vec![
                EntityMetadata::named("Mew"),
                EntityMetadata::named("mew"),
            ],
            &ImportOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            ranker_error(&err),
            Some(RankerError::ImportFailed { .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_parse_keyed_and_list_layouts() {
        let keyed = r#"{
            "Charmander": {"pokedex_number": 4, "types": ["Fire"], "rating": 1400.0, "wins": 9},
            "Squirtle": {"name": "Squirtle", "pokedex_number": 7}
        }"#;
        let parsed = parse_metadata(keyed).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "Charmander");
        assert_eq!(parsed[0].types, vec!["Fire".to_string()]);

        let list = r#"[{"name": "Totodile", "pokedex_number": 158, "generation": "Ii"}]"#;
        let parsed = parse_metadata(list).unwrap();
        assert_eq!(parsed[0].pokedex_number, 158);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_metadata("[1, 2, 3]").unwrap_err();
        assert!(matches!(
            ranker_error(&err),
            Some(RankerError::ImportFailed { .. })
        ));
    }

    #[test]
    fn test_region_inference() {
        assert_eq!(region_for_generation("I"), "Kanto");
        assert_eq!(region_for_generation("Iii"), "Hoenn");
        assert_eq!(region_for_generation("generation-viii"), "Galar");
        assert_eq!(region_for_generation("Ix"), "Paldea");
        assert_eq!(region_for_generation("X"), "Unknown");
    }

    #[test]
    fn test_capitalize_name() {
        assert_eq!(capitalize_name("mr-mime"), "Mr-mime");
        assert_eq!(capitalize_name("PIKACHU"), "Pikachu");
        assert_eq!(capitalize_name("  "), "");
    }
}
