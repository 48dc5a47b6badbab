//! Type-safe wrappers and core types for the similarity index.
//!
//! Newtypes here keep dimensions and row positions from being mixed up with
//! the plain integers floating around the coordinator.

use thiserror::Error;

/// Default cap on the number of vocabulary terms (and therefore vector width).
pub const DEFAULT_MAX_FEATURES: usize = 1000;

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent dimension
/// mismatches between the vectorizer, the index and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ranked row returned by [`SimilarityIndex::search`](crate::vector::SimilarityIndex::search).
///
/// `position` is the row index, which is also the document's position in the
/// store the index was built from. `score` is the raw inner product of the
/// normalized query and row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

impl SearchHit {
    /// Similarity converted to a distance (`1 - score`).
    ///
    /// This is a display value, not a metric. Floating point noise can push the
    /// score above 1.0, so the result may be slightly negative.
    #[must_use]
    pub fn distance(&self) -> f32 {
        distance_from_score(self.score)
    }
}

/// `1 - score`, unclamped.
#[must_use]
pub fn distance_from_score(score: f32) -> f32 {
    1.0 - score
}

/// Clamp a derived distance into the displayable `[0, 2]` range.
#[must_use]
pub fn display_distance(distance: f32) -> f32 {
    if distance.is_nan() {
        return 1.0;
    }
    distance.clamp(0.0, 2.0)
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Rebuild the index so the vectorizer and index agree"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Storage error: {0}\nSuggestion: Check disk space and file permissions")]
    Storage(#[from] std::io::Error),

    #[error("Invalid index file format: {0}\nSuggestion: Delete the index file to force a rebuild")]
    InvalidFormat(String),

    #[error(
        "Invalid storage version: expected {expected}, got {actual}\nSuggestion: Rebuild the index with this version of docvec"
    )]
    VersionMismatch { expected: u32, actual: u32 },
}
