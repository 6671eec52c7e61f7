//! Collection writer: appends the Session Planner's generated plan to the
//! game's on-disk `collection.db` (spec §4.G "Collection write", §6
//! "osu! collection.db binary").
//!
//! The binary format itself is delegated to the `osu-db` crate (same family
//! as the `Listing::from_file`/`save` pair in
//! `Siflorite-osu-db/src/listing.rs`); the core only depends on the narrow
//! [`CollectionWriter`] trait so the rest of the planner never touches the
//! binary format directly (spec §9 capability-trait design note).

use osu_db::collection::{Collection, CollectionList};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("failed to read existing collection.db: {0}")]
    Read(std::io::Error),
    #[error("collection.db was malformed: {0}")]
    Parse(String),
    #[error("failed to write collection.db: {0}")]
    Write(std::io::Error),
}

/// Capability the planner depends on instead of the binary format directly
/// (spec §9). A fake implementation backs the planner's tests.
pub trait CollectionWriter: Send + Sync {
    /// Appends a new collection named `name` containing `beatmap_hashes`,
    /// creating `collection.db` if it does not exist yet.
    fn append_collection(&self, name: &str, beatmap_hashes: &[String]) -> Result<(), CollectionError>;
}

pub struct OsuDbCollectionWriter {
    collection_db_path: PathBuf,
}

impl OsuDbCollectionWriter {
    pub fn new(collection_db_path: PathBuf) -> Self {
        Self { collection_db_path }
    }

    fn load_or_empty(&self) -> Result<CollectionList, CollectionError> {
        if !self.collection_db_path.exists() {
            return Ok(CollectionList {
                version: 20140609,
                collections: Vec::new(),
            });
        }
        CollectionList::from_file(&self.collection_db_path)
            .map_err(|e| CollectionError::Parse(e.to_string()))
    }
}

impl CollectionWriter for OsuDbCollectionWriter {
    fn append_collection(&self, name: &str, beatmap_hashes: &[String]) -> Result<(), CollectionError> {
        let mut list = self.load_or_empty()?;
        list.collections.push(Collection {
            name: Some(name.to_string()),
            beatmap_hashes: beatmap_hashes.iter().cloned().map(Some).collect(),
        });
        list.save(&self.collection_db_path).map_err(CollectionError::Write)
    }
}

/// The collection name encodes `generated_at` (spec §4.G "Collection
/// write"): `"companella YYYY-MM-DD HH:mm:ss"`.
pub fn collection_name(generated_at: chrono::DateTime<chrono::Utc>) -> String {
    format!("companella {}", generated_at.format("%Y-%m-%d %H:%M:%S"))
}

/// Hashes a beatmap file's bytes into the MD5 hex string the game's
/// collection format expects.
pub fn hash_beatmap_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn collection_name_encodes_generated_at() {
        let timestamp = chrono::Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();
        assert_eq!(collection_name(timestamp), "companella 2026-07-28 12:00:00");
    }
}
