//! File ingestion: turning uploaded files into indexed documents.

pub mod file_info;
pub mod queue;
pub mod walker;

use std::path::PathBuf;
use thiserror::Error;

use crate::error::IndexError;

pub use file_info::{file_metadata, get_utc_timestamp, read_document};
pub use queue::{IngestEvent, IngestQueue, IngestSummary, ingest_file};
pub use walker::{FileWalker, IGNORE_FILE_NAME, collect_files};

/// Errors raised while ingesting a single file
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{path}' is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Ingestion queue is closed")]
    QueueClosed,

    #[error("Ingestion worker panicked")]
    WorkerPanicked,
}

pub type IngestResult<T> = Result<T, IngestError>;
