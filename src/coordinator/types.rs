//! Value types returned by [`DocumentIndex`](super::DocumentIndex).

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{IndexError, IndexResult};
use crate::store::Metadata;
use crate::vector::DEFAULT_MAX_FEATURES;

/// Default score threshold applied to query hits.
pub const DEFAULT_MIN_SCORE: f32 = 0.01;

/// Lifecycle state of the index.
///
/// `Stale` exists only between a corpus change and the rebuild that follows
/// it, both of which happen under the writer lock, so readers never see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    /// No documents
    Empty,
    /// Corpus changed, derived artifacts not rebuilt yet
    Stale,
    /// Vectorizer and index match the corpus
    Ready,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Stale => "stale",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Whether a mutation reached disk.
///
/// A failed save never undoes the mutation; it only downgrades durability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Durability {
    /// Every artifact was written
    Persisted,
    /// Applied in memory, but saving failed
    InMemoryOnly { reason: String },
    /// The index has no persist directory
    Ephemeral,
}

impl Durability {
    /// False only when a save was attempted and failed.
    #[must_use]
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::InMemoryOnly { .. })
    }
}

/// Result of [`DocumentIndex::add_documents`](super::DocumentIndex::add_documents).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddOutcome {
    /// Ids of the new documents, in input order
    pub ids: Vec<String>,
    pub durability: Durability,
}

/// Result of [`DocumentIndex::delete_by_id`](super::DocumentIndex::delete_by_id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteOutcome {
    pub found: bool,
    /// `None` when nothing was removed and nothing was written
    pub durability: Option<Durability>,
}

/// Result of [`DocumentIndex::batch`](super::DocumentIndex::batch).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    /// Whatever the batch closure returned
    pub value: T,
    pub added: Vec<String>,
    pub removed: usize,
    /// `None` when the batch changed nothing
    pub durability: Option<Durability>,
}

/// One ranked query hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine similarity, higher is closer
    pub score: f32,
    /// `1 - score`
    pub distance: f32,
}

/// Snapshot of index statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub name: String,
    pub document_count: usize,
    pub index_built: bool,
    /// Rows in the similarity index
    pub index_size: usize,
    /// Configured vocabulary cap
    pub feature_dimension: usize,
    /// Columns actually fitted
    pub vocabulary_size: usize,
    pub persist_directory: Option<PathBuf>,
    pub state: IndexState,
}

/// What happened when an index directory was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    /// No persisted corpus; started empty
    Fresh,
    /// Corpus and derived artifacts loaded as-is
    Loaded { documents: usize },
    /// Corpus loaded, derived artifacts recomputed
    Rebuilt {
        documents: usize,
        reason: String,
        durability: Durability,
    },
    /// Persisted state was unreadable and was discarded
    Reset { reason: String },
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "Created fresh index"),
            Self::Loaded { documents } => write!(f, "Loaded index ({documents} documents)"),
            Self::Rebuilt {
                documents, reason, ..
            } => write!(f, "Rebuilt index ({documents} documents): {reason}"),
            Self::Reset { reason } => {
                write!(f, "Discarded unreadable index, starting empty: {reason}")
            }
        }
    }
}

/// Tunables for a [`DocumentIndex`](super::DocumentIndex).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOptions {
    pub name: String,
    pub max_features: usize,
    pub min_score: f32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            name: "documents".to_string(),
            max_features: DEFAULT_MAX_FEATURES,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl IndexOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.collection_name.clone(),
            max_features: settings.vectorizer.max_features,
            min_score: settings.search.min_score,
        }
    }

    pub fn validate(&self) -> IndexResult<()> {
        if self.max_features == 0 {
            return Err(IndexError::ConfigError {
                reason: "max_features must be at least 1".to_string(),
            });
        }
        if !self.min_score.is_finite() {
            return Err(IndexError::ConfigError {
                reason: format!("min_score must be finite, got {}", self.min_score),
            });
        }
        Ok(())
    }
}
