//! Error types for the document index
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::vector::VectorError;

/// Main error type for index operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Caller supplied inconsistent arguments
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Document id '{id}' already exists in the index")]
    DuplicateId { id: String },

    /// Storage errors
    #[error("Failed to persist index to '{path}': {source}")]
    PersistenceError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to load index from '{path}': {source}")]
    LoadError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Vector math errors surfaced through the coordinator
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// Corrupted index error
    #[error("Index appears to be corrupted: {reason}")]
    IndexCorrupted { reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::DuplicateId { .. } => "DUPLICATE_ID",
            Self::PersistenceError { .. } => "PERSISTENCE_ERROR",
            Self::LoadError { .. } => "LOAD_ERROR",
            Self::Vector(_) => "VECTOR_ERROR",
            Self::IndexCorrupted { .. } => "INDEX_CORRUPTED",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::DuplicateId { .. } => vec![
                "Delete the existing document first, or omit the id to have one generated",
            ],
            Self::IndexCorrupted { .. } | Self::Vector(_) => vec![
                "Run 'docvec rebuild' to recompute the vectorizer and index from the documents",
                "Check for disk errors or filesystem corruption",
            ],
            Self::LoadError { .. } | Self::PersistenceError { .. } => vec![
                "Check disk space and permissions in the index directory",
                "The in-memory index is still usable; the next mutation retries the save",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'docvec init --force' to regenerate the settings file",
            ],
            _ => vec![],
        }
    }
}

/// Errors specific to persistence operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode {artifact}: {reason}")]
    Encode {
        artifact: &'static str,
        reason: String,
    },

    #[error("Failed to decode {artifact}: {reason}")]
    Decode {
        artifact: &'static str,
        reason: String,
    },

    #[error("Unsupported {artifact} format version {found} (supported up to {supported})")]
    UnsupportedVersion {
        artifact: &'static str,
        found: u32,
        supported: u32,
    },

    #[error("Vector storage error: {0}")]
    Vector(#[from] VectorError),
}

impl StorageError {
    /// True when the error means the bytes on disk cannot be trusted, as opposed
    /// to the file being unreadable for environmental reasons.
    pub fn is_corruption(&self) -> bool {
        match self {
            Self::Decode { .. } | Self::UnsupportedVersion { .. } => true,
            Self::Vector(VectorError::InvalidFormat(_))
            | Self::Vector(VectorError::VersionMismatch { .. })
            | Self::Vector(VectorError::InvalidDimension { .. }) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
