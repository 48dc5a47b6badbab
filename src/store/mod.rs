//! Document storage: the ordered corpus every derived artifact is built from.

mod corpus;
mod document;
mod fingerprint;

pub use corpus::{DocumentStore, StoreError};
pub use document::{Document, DocumentRef, Metadata, MetadataValue};
pub use fingerprint::CorpusFingerprint;
