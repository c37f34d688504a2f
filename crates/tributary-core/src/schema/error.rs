//! Schema registry error types.

use thiserror::Error;

/// Errors raised while building the registry or validating templates.
///
/// All of these are startup-time configuration errors: the registry and the
/// template set are compiled once, so nothing here is recoverable per request.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A node type was registered twice.
    #[error("Node type registered twice: {0}")]
    DuplicateType(String),

    /// A node type name is not present in the registry.
    #[error("Unknown node type: {0}")]
    UnknownType(String),

    /// A node type extends a type that was never registered.
    #[error("Node type {node_type} extends unknown type {parent}")]
    UnknownParent { node_type: String, parent: String },

    /// A node type inherits from itself through its ancestors.
    #[error("Inheritance cycle through node type {0}")]
    InheritanceCycle(String),

    /// A relationship points at a type that was never registered.
    #[error("Relationship {node_type}.{relationship} targets unknown type {target}")]
    UnknownTarget {
        node_type: String,
        relationship: String,
        target: String,
    },

    /// Two relationship names claim the same edge label, direction and target.
    #[error(
        "{node_type} declares both {first} and {second} for {direction} {label} edges with {target}"
    )]
    AmbiguousRelationship {
        node_type: String,
        label: String,
        direction: String,
        target: String,
        first: String,
        second: String,
    },

    /// A node type has no unique external id property.
    #[error("Node type {0} has no unique id property")]
    MissingUniqueId(String),

    /// A node type has more than one unique external id property.
    #[error("Node type {0} declares more than one unique id property")]
    MultipleUniqueIds(String),

    /// A relationship name is not declared on a node type.
    #[error("Node type {node_type} has no relationship named {relationship}")]
    UnknownRelationship {
        node_type: String,
        relationship: String,
    },

    /// A traversal template is structurally invalid.
    #[error("Invalid story template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },
}

impl SchemaError {
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}
