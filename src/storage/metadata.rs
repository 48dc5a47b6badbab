//! Metadata tracking for index state

use crate::ingest::get_utc_timestamp;
use crate::storage::atomic_write;
use crate::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the metadata record inside an index directory.
pub const METADATA_FILE_NAME: &str = "index.meta";

/// Informational summary written next to the index artifacts.
///
/// Nothing on the load path depends on this file; it exists so tooling can
/// inspect an index directory without decoding the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Version of the index format
    pub version: u32,

    /// Number of documents in the corpus at last save
    pub document_count: usize,

    /// Columns of the fitted vectorizer at last save
    pub vocabulary_size: usize,

    /// First save of this index directory (UTC seconds)
    pub created_at: u64,

    /// Most recent save (UTC seconds)
    pub updated_at: u64,
}

impl Default for IndexMetadata {
    fn default() -> Self {
        let now = get_utc_timestamp();
        Self {
            version: 1,
            document_count: 0,
            vocabulary_size: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl IndexMetadata {
    /// Create new metadata for a fresh index
    pub fn new() -> Self {
        Self::default()
    }

    /// Update counts after a save
    pub fn update_counts(&mut self, document_count: usize, vocabulary_size: usize) {
        self.document_count = document_count;
        self.vocabulary_size = vocabulary_size;
        self.updated_at = get_utc_timestamp();
    }

    /// Save metadata to file
    pub fn save(&self, base_path: &Path) -> IndexResult<()> {
        let metadata_path = base_path.join(METADATA_FILE_NAME);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| IndexError::General(format!("Failed to serialize metadata: {e}")))?;

        atomic_write(&metadata_path, json.as_bytes()).map_err(|e| {
            IndexError::PersistenceError {
                path: metadata_path,
                source: Box::new(e),
            }
        })
    }

    /// Load metadata from file, or fresh metadata when none exists
    pub fn load(base_path: &Path) -> IndexResult<Self> {
        let metadata_path = base_path.join(METADATA_FILE_NAME);

        if !metadata_path.exists() {
            return Ok(Self::new());
        }

        let json = fs::read_to_string(&metadata_path).map_err(|e| IndexError::LoadError {
            path: metadata_path.clone(),
            source: Box::new(e),
        })?;

        serde_json::from_str(&json)
            .map_err(|e| IndexError::General(format!("Failed to parse metadata: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_metadata_is_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let metadata = IndexMetadata::load(temp_dir.path()).unwrap();
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.document_count, 0);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut metadata = IndexMetadata::new();
        metadata.update_counts(3, 6);
        metadata.save(temp_dir.path()).unwrap();

        let loaded = IndexMetadata::load(temp_dir.path()).unwrap();
        assert_eq!(loaded, metadata);
        assert!(loaded.updated_at >= loaded.created_at);
    }

    #[test]
    fn test_garbage_metadata_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(METADATA_FILE_NAME), "{not json").unwrap();
        assert!(IndexMetadata::load(temp_dir.path()).is_err());
    }
}
