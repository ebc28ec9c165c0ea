use thiserror::Error;

/// Errors raised by the descriptor pipeline.
///
/// All of them point at invalid input or misconfiguration; nothing here is
/// transient, so callers should not retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The image is smaller than the canonical analysis resolution.
    #[error("Image of size {width}x{height} is too small for a {required}x{required} analysis crop")]
    InvalidImageSize {
        /// Width of the rejected image.
        width: usize,
        /// Height of the rejected image.
        height: usize,
        /// Canonical square resolution required by the analysis.
        required: usize,
    },
    /// The image has no pixels at all.
    #[error("Image has no pixels")]
    EmptyImage,
    /// A channel or vector does not have the length the pipeline expects.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// Invalid geometry or normalization parameters.
    #[error("Invalid analysis configuration: {0}")]
    Configuration(String),
}
