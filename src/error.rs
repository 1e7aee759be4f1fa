//! Error types for flow graph operations
//!
//! Only referential faults are errors. Validation results are data and
//! loader failures are absorbed by the catalog cache.

use thiserror::Error;

/// Result type alias using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised by `FlowGraph` mutations and document hydration
#[derive(Debug, Error)]
pub enum FlowError {
    /// An operation referenced a node id that is not in the graph
    #[error("Unknown node: {id}")]
    UnknownNode { id: String },

    /// A bulk insert supplied a node id that already exists
    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: String },

    /// A bulk insert supplied an edge id that already exists
    #[error("Duplicate edge id: {id}")]
    DuplicateEdge { id: String },

    /// A bulk insert supplied an edge whose endpoint does not exist
    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },

    /// Flow document could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    /// Create an unknown-node error
    pub fn unknown_node(id: impl Into<String>) -> Self {
        Self::UnknownNode { id: id.into() }
    }

    /// True for the reference-error family (missing endpoints)
    pub fn is_reference_error(&self) -> bool {
        matches!(self, Self::UnknownNode { .. } | Self::DanglingEdge { .. })
    }
}
