use thiserror::Error;

/// Errors raised while scoring or ranking characteristic vectors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    /// The two vectors being compared differ in length.
    #[error("Cannot compare vectors of length {left} and {right}")]
    DimensionMismatch { left: usize, right: usize },
    /// One of the vectors has no elements.
    #[error("Cannot score an empty vector")]
    EmptyVector,
    /// The population supplier failed.
    #[error("Characteristics source failed: {0}")]
    Source(String),
    /// The rating oracle failed.
    #[error("Rating oracle failed: {0}")]
    Oracle(String),
}
