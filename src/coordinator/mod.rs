//! Index coordination: owns the corpus and its derived artifacts, serializes
//! mutations, and decides when to rebuild and persist.

mod index;
mod types;

pub use index::{DocumentIndex, IndexBatch};
pub use types::{
    AddOutcome, BatchOutcome, DEFAULT_MIN_SCORE, DeleteOutcome, Durability, IndexOptions,
    IndexState, IndexStats, LoadReport, SearchResult,
};
