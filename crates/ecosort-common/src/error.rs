//! Error types for EcoSort.

use thiserror::Error;

use crate::ids::NodeId;

/// Top-level error type for EcoSort operations.
#[derive(Debug, Error)]
pub enum EcosortError {
    /// Scene graph errors
    #[error("World error: {0}")]
    World(#[from] WorldError),

    /// Category parse errors
    #[error("Category error: {0}")]
    Category(#[from] CategoryParseError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Scene graph errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// Node does not exist or was despawned
    #[error("Scene node not found: {0}")]
    NodeNotFound(NodeId),

    /// Reparenting would make a node its own ancestor
    #[error("Cannot attach {child} under {parent}: would create a cycle")]
    Cycle {
        /// Node being attached
        child: NodeId,
        /// Requested new parent
        parent: NodeId,
    },

    /// The scene root is permanent
    #[error("The scene root cannot be detached")]
    RootDetach,
}

/// Unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown waste category: {0}")]
pub struct CategoryParseError(pub String);

/// Result type alias for EcoSort operations.
pub type EcosortResult<T> = Result<T, EcosortError>;
