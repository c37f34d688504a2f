//! Graph access error types.

use thiserror::Error;

/// Errors raised while reading from or writing to the graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The requested node type is not registered.
    #[error("Unknown node type: {0}")]
    UnknownType(String),

    /// No node of the type (or a subtype) has the external id.
    #[error("No {node_type} with id {id}")]
    NotFound { node_type: String, id: String },

    /// No node has the store key.
    #[error("No node with key {0}")]
    UnknownKey(String),

    /// A relationship name is not declared on the node's type.
    #[error("Node type {node_type} has no relationship named {relationship}")]
    UnknownRelationship {
        node_type: String,
        relationship: String,
    },

    /// A property value does not fit its declared kind.
    #[error("Invalid value for {node_type}.{property}: {reason}")]
    InvalidProperty {
        node_type: String,
        property: String,
        reason: String,
    },

    /// A fixture file could not be read or does not describe a valid graph.
    #[error("Fixture error: {0}")]
    Fixture(String),

    /// The backing store failed or could not be reached.
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// The request deadline passed before the store answered.
    #[error("Graph request timed out")]
    Timeout,
}

impl GraphError {
    /// Whether the same request may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::StoreUnavailable(_) | GraphError::Timeout)
    }
}

impl From<surrealdb::Error> for GraphError {
    fn from(err: surrealdb::Error) -> Self {
        GraphError::StoreUnavailable(err.to_string())
    }
}
