//! Persistence of the document index to a directory on disk.

pub mod metadata;
pub mod persistence;

pub use metadata::{IndexMetadata, METADATA_FILE_NAME};
pub(crate) use persistence::atomic_write;
pub use persistence::{
    DOCUMENTS_FILE_NAME, DerivedLoad, DocumentRecord, IndexPersistence, PersistedState, Snapshot,
    VECTORIZER_FILE_NAME, VectorizerRecord,
};
