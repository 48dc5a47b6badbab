//! Persistence layer for one index directory.
//!
//! ```text
//! <index_path>/
//!   documents.json   ids, texts, metadata and the id counter
//!   vectorizer.bin   fitted vectorizer stamped with a corpus fingerprint
//!   index.vec        similarity matrix stamped with the same fingerprint
//!   index.meta       informational summary
//! ```
//!
//! `documents.json` is the source of truth. The other two artifacts are
//! derived from it and are only trusted when their fingerprints match the
//! corpus they sit beside.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{StorageError, StorageResult};
use crate::storage::IndexMetadata;
use crate::store::{CorpusFingerprint, DocumentStore, Metadata};
use crate::vector::{IndexFile, SimilarityIndex};
use crate::vectorizer::TfidfVectorizer;

/// File name of the corpus record inside an index directory.
pub const DOCUMENTS_FILE_NAME: &str = "documents.json";

/// File name of the fitted vectorizer inside an index directory.
pub const VECTORIZER_FILE_NAME: &str = "vectorizer.bin";

const DOCUMENTS_VERSION: u32 = 1;
const VECTORIZER_VERSION: u32 = 1;

/// Upper bound on a decoded vectorizer, so a corrupt length prefix cannot
/// trigger a huge allocation.
const VECTORIZER_DECODE_LIMIT: usize = 256 * 1024 * 1024;

/// Writes `bytes` to a temporary sibling of `path` and renames it into place.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialized corpus state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub version: u32,

    /// Next value for generated `doc_<n>` ids
    pub next_sequence: u64,

    pub ids: Vec<String>,
    pub texts: Vec<String>,
    pub metadata: Vec<Metadata>,
}

/// Serialized vectorizer with the fingerprint of the corpus it was fitted on.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct VectorizerRecord {
    pub version: u32,
    pub fingerprint: CorpusFingerprint,
    pub vectorizer: TfidfVectorizer,
}

/// Borrowed view of everything a save writes.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub store: &'a DocumentStore,
    pub next_sequence: u64,
    /// `None` when the corpus is empty and derived files should be removed
    pub derived: Option<(&'a TfidfVectorizer, &'a SimilarityIndex)>,
}

/// State of the derived artifacts found at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedLoad {
    /// Both artifacts decode and match the loaded corpus
    Current {
        vectorizer: TfidfVectorizer,
        index: SimilarityIndex,
    },

    /// At least one artifact file is absent
    Missing,

    /// Both decode but describe a different corpus
    Stale { reason: String },
}

/// Everything read back from an index directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub store: DocumentStore,
    pub next_sequence: u64,
    pub derived: DerivedLoad,
}

/// Manages persistence of the index
#[derive(Debug, Clone)]
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    /// Create a new persistence manager
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn documents_path(&self) -> PathBuf {
        self.base_path.join(DOCUMENTS_FILE_NAME)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.base_path.join(VECTORIZER_FILE_NAME)
    }

    fn index_file(&self) -> IndexFile {
        IndexFile::new(&self.base_path)
    }

    /// True when a corpus record exists on disk.
    #[must_use]
    pub fn has_documents(&self) -> bool {
        self.documents_path().exists()
    }

    /// Writes the full snapshot: corpus first, then derived artifacts, then
    /// the informational metadata.
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub fn save(&self, snapshot: Snapshot<'_>) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path)?;

        self.save_documents(snapshot.store, snapshot.next_sequence)?;

        let vocabulary_size = match snapshot.derived {
            Some((vectorizer, index)) => {
                self.save_derived(snapshot.store.fingerprint(), vectorizer, index)?;
                vectorizer.vocabulary_size()
            }
            None => {
                self.clear_derived()?;
                0
            }
        };

        let mut metadata = IndexMetadata::load(&self.base_path).unwrap_or_default();
        metadata.update_counts(snapshot.store.len(), vocabulary_size);
        if let Err(e) = metadata.save(&self.base_path) {
            tracing::warn!("Failed to update index metadata: {e}");
        }

        Ok(())
    }

    /// Writes `documents.json`.
    pub fn save_documents(&self, store: &DocumentStore, next_sequence: u64) -> StorageResult<()> {
        let record = DocumentRecord {
            version: DOCUMENTS_VERSION,
            next_sequence,
            ids: store.ids().to_vec(),
            texts: store.texts().to_vec(),
            metadata: store.iter().map(|doc| doc.metadata.clone()).collect(),
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|e| StorageError::Encode {
            artifact: "documents",
            reason: e.to_string(),
        })?;

        atomic_write(&self.documents_path(), &json)?;
        tracing::debug!(
            "Wrote {} documents to {}",
            store.len(),
            self.documents_path().display()
        );
        Ok(())
    }

    /// Writes `vectorizer.bin` and `index.vec`, both stamped with `fingerprint`.
    pub fn save_derived(
        &self,
        fingerprint: CorpusFingerprint,
        vectorizer: &TfidfVectorizer,
        index: &SimilarityIndex,
    ) -> StorageResult<()> {
        let record = VectorizerRecord {
            version: VECTORIZER_VERSION,
            fingerprint,
            vectorizer: vectorizer.clone(),
        };
        let bytes = bincode::encode_to_vec(&record, bincode::config::standard()).map_err(|e| {
            StorageError::Encode {
                artifact: "vectorizer",
                reason: e.to_string(),
            }
        })?;

        atomic_write(&self.vectorizer_path(), &bytes)?;
        self.index_file().write(index, fingerprint.as_bytes())?;

        tracing::debug!(
            "Wrote vectorizer ({} terms) and index ({} rows) for corpus {}",
            vectorizer.vocabulary_size(),
            index.len(),
            fingerprint.short_hex()
        );
        Ok(())
    }

    /// Removes derived artifacts. Missing files are not an error.
    pub fn clear_derived(&self) -> StorageResult<()> {
        match fs::remove_file(self.vectorizer_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.index_file().remove()?;
        Ok(())
    }

    /// Reads the directory back.
    ///
    /// Returns `Ok(None)` when no corpus record exists. Any artifact that
    /// exists but cannot be read or decoded is an error; missing or stale
    /// derived artifacts are reported through [`DerivedLoad`] instead.
    #[must_use = "Load errors should be handled appropriately"]
    pub fn load(&self) -> StorageResult<Option<PersistedState>> {
        if !self.has_documents() {
            return Ok(None);
        }

        let record = self.read_documents()?;
        let store = DocumentStore::from_parts(record.ids, record.texts, record.metadata).map_err(
            |e| StorageError::Decode {
                artifact: "documents",
                reason: e.to_string(),
            },
        )?;

        let derived = if store.is_empty() {
            DerivedLoad::Missing
        } else {
            self.load_derived(&store)?
        };

        Ok(Some(PersistedState {
            store,
            next_sequence: record.next_sequence,
            derived,
        }))
    }

    fn read_documents(&self) -> StorageResult<DocumentRecord> {
        let bytes = fs::read(self.documents_path())?;
        let record: DocumentRecord =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::Decode {
                artifact: "documents",
                reason: e.to_string(),
            })?;

        if record.version > DOCUMENTS_VERSION {
            return Err(StorageError::UnsupportedVersion {
                artifact: "documents",
                found: record.version,
                supported: DOCUMENTS_VERSION,
            });
        }
        Ok(record)
    }

    fn read_vectorizer(&self) -> StorageResult<VectorizerRecord> {
        let bytes = fs::read(self.vectorizer_path())?;
        let config = bincode::config::standard().with_limit::<VECTORIZER_DECODE_LIMIT>();
        let (record, consumed): (VectorizerRecord, usize) =
            bincode::decode_from_slice(&bytes, config).map_err(|e| StorageError::Decode {
                artifact: "vectorizer",
                reason: e.to_string(),
            })?;

        if consumed != bytes.len() {
            return Err(StorageError::Decode {
                artifact: "vectorizer",
                reason: format!("{} trailing bytes", bytes.len() - consumed),
            });
        }
        if record.version > VECTORIZER_VERSION {
            return Err(StorageError::UnsupportedVersion {
                artifact: "vectorizer",
                found: record.version,
                supported: VECTORIZER_VERSION,
            });
        }
        record
            .vectorizer
            .check_consistency()
            .map_err(|reason| StorageError::Decode {
                artifact: "vectorizer",
                reason,
            })?;
        Ok(record)
    }

    fn load_derived(&self, store: &DocumentStore) -> StorageResult<DerivedLoad> {
        let index_file = self.index_file();
        if !self.vectorizer_path().exists() || !index_file.exists() {
            return Ok(DerivedLoad::Missing);
        }

        let record = self.read_vectorizer()?;
        let stored = index_file.read()?;
        let fingerprint = store.fingerprint();

        if record.fingerprint != fingerprint {
            return Ok(DerivedLoad::Stale {
                reason: format!(
                    "vectorizer was fitted on corpus {}, documents are {}",
                    record.fingerprint.short_hex(),
                    fingerprint.short_hex()
                ),
            });
        }
        if stored.fingerprint != *fingerprint.as_bytes() {
            return Ok(DerivedLoad::Stale {
                reason: format!(
                    "index was built from corpus {}, documents are {}",
                    CorpusFingerprint::from_bytes(stored.fingerprint).short_hex(),
                    fingerprint.short_hex()
                ),
            });
        }

        let vocabulary_size = record.vectorizer.vocabulary_size();
        let width = stored.index.dimension().map_or(0, |d| d.get());
        let consistent = if record.vectorizer.is_empty() {
            stored.index.is_empty()
        } else {
            stored.index.len() == store.len() && width == vocabulary_size
        };
        if !consistent {
            return Ok(DerivedLoad::Stale {
                reason: format!(
                    "index holds {} rows of width {width}, expected {} rows of width {vocabulary_size}",
                    stored.index.len(),
                    store.len()
                ),
            });
        }

        Ok(DerivedLoad::Current {
            vectorizer: record.vectorizer,
            index: stored.index,
        })
    }
}
