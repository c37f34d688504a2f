//! Descriptor types for node types, their properties and relationships.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a node property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Integer,
    Float,
    /// A point in time, rendered as ISO-8601 on the wire.
    Timestamp,
    StringList,
    /// A string restricted to a fixed set of values.
    Enum(Vec<String>),
}

/// A declared property of a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Name used inside the store.
    pub name: String,
    /// Name used in serialized output.
    pub wire_name: String,
    /// Semantic type.
    pub kind: PropertyKind,
    /// Whether this is the node type's unique external id.
    pub unique: bool,
}

/// Direction of an edge relative to the node that declares or observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
    /// Declared relationships only: the edge may point either way.
    Either,
}

impl Direction {
    /// The direction as seen from the node at the other end of the edge.
    pub fn reversed(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
            Direction::Either => Direction::Either,
        }
    }

    /// Whether an observed edge direction satisfies this declared direction.
    pub fn admits(self, observed: Direction) -> bool {
        self == Direction::Either || self == observed
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
            Direction::Either => "either",
        };
        f.write_str(text)
    }
}

/// How many edges of a relationship a node may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    ZeroOrOne,
    Many,
}

impl Cardinality {
    /// Single-valued relationships serialize as an object or `null`.
    pub fn is_single(self) -> bool {
        matches!(self, Cardinality::One | Cardinality::ZeroOrOne)
    }
}

/// A declared relationship of a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDescriptor {
    /// Field name used to access the relationship.
    pub name: String,
    /// Edge label stored in the graph.
    pub edge_label: String,
    /// Node type at the far end.
    pub target: String,
    pub direction: Direction,
    pub cardinality: Cardinality,
}

impl RelationshipDescriptor {
    fn new(name: &str, edge_label: &str, target: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            edge_label: edge_label.to_string(),
            target: target.to_string(),
            direction,
            cardinality: Cardinality::Many,
        }
    }

    /// Relationship along edges leaving the declaring node.
    pub fn outgoing(name: &str, edge_label: &str, target: &str) -> Self {
        Self::new(name, edge_label, target, Direction::Outgoing)
    }

    /// Relationship along edges arriving at the declaring node.
    pub fn incoming(name: &str, edge_label: &str, target: &str) -> Self {
        Self::new(name, edge_label, target, Direction::Incoming)
    }

    /// Relationship along edges in either direction.
    pub fn either(name: &str, edge_label: &str, target: &str) -> Self {
        Self::new(name, edge_label, target, Direction::Either)
    }

    pub fn one(mut self) -> Self {
        self.cardinality = Cardinality::One;
        self
    }

    pub fn zero_or_one(mut self) -> Self {
        self.cardinality = Cardinality::ZeroOrOne;
        self
    }
}

/// Definition of one node type, built with a small fluent API.
///
/// ```
/// use tributary_core::schema::{NodeTypeDescriptor, PropertyKind, RelationshipDescriptor};
///
/// let tag = NodeTypeDescriptor::new("KojiTag")
///     .unique_id_as("id_", "id")
///     .property("name", PropertyKind::String)
///     .relationship(RelationshipDescriptor::outgoing("builds", "CONTAINS", "KojiBuild"));
/// assert_eq!(tag.relationships.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
    pub relationships: Vec<RelationshipDescriptor>,
}

impl NodeTypeDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            properties: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Inherit every property and relationship of `parent`.
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn property(self, name: &str, kind: PropertyKind) -> Self {
        self.property_as(name, name, kind)
    }

    /// Declare a property whose wire name differs from its store name.
    pub fn property_as(mut self, name: &str, wire_name: &str, kind: PropertyKind) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.to_string(),
            wire_name: wire_name.to_string(),
            kind,
            unique: false,
        });
        self
    }

    pub fn unique_id(self, name: &str) -> Self {
        self.unique_id_as(name, name)
    }

    /// Declare the unique external id, stored as `name` and serialized as `wire_name`.
    pub fn unique_id_as(mut self, name: &str, wire_name: &str) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.to_string(),
            wire_name: wire_name.to_string(),
            kind: PropertyKind::String,
            unique: true,
        });
        self
    }

    pub fn relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships.push(relationship);
        self
    }
}
