//! Error types for trellis-core.

use thiserror::Error;

/// Error type for graph storage operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Vertex type out of range (bipartite graphs only have types 0 and 1).
    #[error("invalid vertex type: {0}")]
    InvalidVertexType(usize),

    /// Vertex id out of range for its type.
    #[error("invalid vertex id {vid} for vertex type {vtype}")]
    InvalidVertexId { vtype: usize, vid: i64 },

    /// Edge id out of range.
    #[error("invalid edge id: {0}")]
    InvalidEdgeId(i64),

    /// Edge type out of range for the meta-graph.
    #[error("invalid edge type: {0}")]
    InvalidEdgeType(usize),

    /// Two parallel array arguments differ in length.
    #[error("length mismatch: {0}")]
    LengthMismatch(String),

    /// Relations incident on the same vertex type disagree on its cardinality.
    #[error("mismatched number of vertices for vertex type {vtype}: {expected} vs {got}")]
    VertexCountMismatch {
        vtype: usize,
        expected: i64,
        got: i64,
    },

    /// Catch-all for malformed caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for graph storage operations.
pub type Result<T> = std::result::Result<T, Error>;
