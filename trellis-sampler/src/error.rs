//! Error types for trellis-sampler.

use thiserror::Error;

/// Error type for sampling operations.
#[derive(Error, Debug)]
pub enum SampleError {
    /// The sampler path only supports 64-bit id storage.
    #[error("32-bit graphs are not supported by the sampler")]
    UnsupportedWidth,

    /// The probability vector does not cover every edge.
    #[error("probability length {got} does not match edge count {expected}")]
    ProbabilityLength { got: usize, expected: usize },

    /// Malformed caller input (bad seed ids, non-positive batch shape, …).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Error surfaced by the storage layer.
    #[error(transparent)]
    Graph(#[from] trellis_core::Error),
}

/// Result type for sampling operations.
pub type Result<T> = std::result::Result<T, SampleError>;
