//! Error types for koru-tree.
//!
//! Tree operations themselves never fail: a malformed path, a missing
//! intermediate node or a blocked write degrades to `None`, an empty result
//! or a no-op. Errors only arise at the edges of the crate, when a tree is
//! moved to or from JSON or when configuration is loaded.
use thiserror::Error;

/// The error type for the fallible edges of koru-tree.
#[derive(Error, Debug)]
pub enum TreeError {
    /// Serialization error when converting data to/from JSON
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A leaf that has no JSON representation (callbacks, the void marker)
    #[error("Value at '{path}' of kind '{kind}' cannot be represented as JSON")]
    Unrepresentable {
        /// Space-joined path of the offending node ("" for the root)
        path: String,
        /// Kind name of the offending leaf
        kind: String,
    },

    /// A tree was built from a document whose root is not a mapping
    #[error("Expected a mapping at the root, found {kind}")]
    NotAMapping {
        /// Kind name of the root value
        kind: String,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of why the configuration is invalid
        reason: String,
    },
}

/// Result type alias for koru-tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
