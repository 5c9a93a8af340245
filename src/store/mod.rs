//! Entity storage: the in-memory store, its durable snapshots and metadata import
//!
//! This module owns the mapping from entity id to record and everything needed
//! to get that mapping on and off disk.

pub mod entity_store;
pub mod import;
pub mod snapshot;

// Re-export commonly used types
pub use entity_store::EntityStore;
pub use import::{merge_import, read_metadata_file, ImportOptions, ImportReport};
pub use snapshot::{InMemorySnapshotStore, JsonSnapshotStore, SnapshotStore, DEFAULT_SNAPSHOT_PATH};
