//! Vector search functionality for the document index.
//!
//! This module provides the exact similarity index and its binary on-disk
//! matrix format.
//!
//! # Architecture
//! Every row is L2-normalized at build time, so cosine similarity reduces to
//! a dot product. Search is a flat scan over all rows: exact, deterministic,
//! and linear in corpus size.

mod index;
mod storage;
mod types;

// Re-export core types for public API
pub use index::{SimilarityIndex, l2_normalize};
pub use storage::{INDEX_FILE_NAME, IndexFile, StoredIndex};
pub use types::{
    DEFAULT_MAX_FEATURES, SearchHit, VectorDimension, VectorError, display_distance,
    distance_from_score,
};
