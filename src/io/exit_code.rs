//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success
//! - `1`: General error
//! - `2`: Blocking error, the index on disk needs attention
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::coordinator::Durability;
use crate::error::IndexError;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Document not found, or a query matched nothing (code 3)
    NotFound = 3,

    /// Rejected arguments such as a duplicate id (code 4)
    InvalidInput = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// The mutation was applied but could not be saved (code 7)
    NotPersisted = 7,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// `Success` if data is found, `NotFound` if empty.
    pub fn from_lookup<T>(result: &Option<T>) -> Self {
        match result {
            Some(_) => ExitCode::Success,
            None => ExitCode::NotFound,
        }
    }

    /// `Success` unless a save was attempted and failed.
    pub fn from_durability(durability: &Durability) -> Self {
        if durability.is_durable() {
            ExitCode::Success
        } else {
            ExitCode::NotPersisted
        }
    }

    /// Convert an `IndexError` to the appropriate exit code.
    pub fn from_error(error: &IndexError) -> Self {
        match error {
            IndexError::InvalidInput { .. } | IndexError::DuplicateId { .. } => {
                ExitCode::InvalidInput
            }
            IndexError::PersistenceError { .. } | IndexError::LoadError { .. } => {
                ExitCode::IoError
            }
            IndexError::ConfigError { .. } => ExitCode::ConfigError,
            IndexError::IndexCorrupted { .. } => ExitCode::BlockingError,
            _ => ExitCode::GeneralError,
        }
    }

    /// Blocking errors should halt automation pipelines.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::InvalidInput => "Invalid input",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::NotPersisted => "Applied in memory but not saved",
        }
    }
}
