//! Persistent TF-IDF document index with exact cosine search.
//!
//! [`DocumentIndex`] owns the corpus, fits a [`TfidfVectorizer`] over it, and
//! answers similarity queries against a dense [`SimilarityIndex`]. Every
//! mutation refits both and saves them next to the documents, so an index
//! reopened from disk answers queries exactly as it did before.
//!
//! ```no_run
//! use docvec::{DocumentIndex, IndexOptions};
//!
//! let index = DocumentIndex::open(".docvec/index", IndexOptions::default())?;
//! index.add_documents(
//!     vec!["Cats are small furry pets".to_string()],
//!     None,
//!     None,
//! )?;
//! for hit in index.query("furry pets", 3)? {
//!     println!("{} {:.3}", hit.id, hit.score);
//! }
//! # Ok::<(), docvec::IndexError>(())
//! ```

pub mod config;
pub mod coordinator;
pub mod display;
pub mod error;
pub mod ingest;
pub mod io;
pub mod logging;
pub mod storage;
pub mod store;
pub mod vector;
pub mod vectorizer;

pub use config::Settings;
pub use coordinator::{
    AddOutcome, BatchOutcome, DeleteOutcome, DocumentIndex, Durability, IndexBatch,
    IndexOptions, IndexState, IndexStats, LoadReport, SearchResult,
};
pub use error::{IndexError, IndexResult, StorageError, StorageResult};
pub use storage::IndexPersistence;
pub use store::{Document, Metadata, MetadataValue};
pub use vector::SimilarityIndex;
pub use vectorizer::TfidfVectorizer;
