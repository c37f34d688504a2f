//! Graph access port and store adapters.
//!
//! The core reads the artifact graph through [`GraphPort`], a deliberately
//! small surface: fetch a node by type and external id, fetch every edge
//! incident to a node, and follow a declared relationship. Two adapters
//! implement it:
//!
//! - [`SurrealGraph`] - SurrealDB embedded (RocksDB on disk, in-memory for tests)
//! - [`MemoryGraph`] - an in-process store, loadable from a fixture file
//!
//! Requests go through a [`GraphSession`], which applies the request deadline
//! to every store call and memoises edge lookups for the life of the request.

mod error;
mod fixture;
mod memory;
mod session;
mod surreal;
mod value;

pub use error::GraphError;
pub use fixture::{Fixture, FixtureEdge, FixtureNode};
pub use memory::MemoryGraph;
pub use session::GraphSession;
pub use surreal::SurrealGraph;
pub use value::PropertyValue;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::schema::{Direction, SchemaRegistry};

/// Properties of a node keyed by their store name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A node instance read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Opaque store-assigned key. Never leaves the process.
    pub key: String,
    pub node_type: String,
    pub properties: Properties,
}

impl GraphNode {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// The node's unique external id, if the type is known and the id is set.
    pub fn external_id(&self, registry: &SchemaRegistry) -> Option<String> {
        let node_type = registry.get(&self.node_type)?;
        self.property(&node_type.unique_property().name)?.as_id()
    }
}

/// An edge incident to a node, with the node at its far end.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub far: GraphNode,
}

impl GraphEdge {
    /// Outgoing if `key` is the edge's source, incoming otherwise.
    pub fn direction_from(&self, key: &str) -> Direction {
        if self.source == key {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

/// Read access to the artifact graph.
#[async_trait]
pub trait GraphPort: Send + Sync {
    /// Registry the adapter validates and decodes nodes against.
    fn registry(&self) -> &Arc<SchemaRegistry>;

    /// Find a node of `node_type`, or any subtype of it, by external id.
    async fn get_node(&self, node_type: &str, external_id: &str) -> Result<Option<GraphNode>, GraphError>;

    /// Every edge touching the node, in both directions and with any label.
    async fn get_edges(&self, key: &str) -> Result<Vec<GraphEdge>, GraphError>;

    /// Nodes reached from `node` through a declared relationship.
    async fn follow(&self, node: &GraphNode, relationship: &str) -> Result<Vec<GraphNode>, GraphError> {
        let registry = self.registry();
        check_relationship(registry, node, relationship)?;
        let edges = self.get_edges(&node.key).await?;
        Ok(select_relationship(registry, node, relationship, &edges))
    }
}

/// Fail unless `relationship` is declared on the node's type.
pub(crate) fn check_relationship(
    registry: &SchemaRegistry,
    node: &GraphNode,
    relationship: &str,
) -> Result<(), GraphError> {
    let node_type = registry
        .get(&node.node_type)
        .ok_or_else(|| GraphError::UnknownType(node.node_type.clone()))?;
    if node_type.relationship(relationship).is_none() {
        return Err(GraphError::UnknownRelationship {
            node_type: node.node_type.clone(),
            relationship: relationship.to_string(),
        });
    }
    Ok(())
}

/// Far nodes of the edges that map to `relationship`, in edge order.
///
/// Edges are matched the same way the serializer maps them, so `follow`
/// agrees with the expanded form of the node.
pub(crate) fn select_relationship(
    registry: &SchemaRegistry,
    node: &GraphNode,
    relationship: &str,
    edges: &[GraphEdge],
) -> Vec<GraphNode> {
    edges
        .iter()
        .filter(|edge| {
            registry
                .relationship_for(
                    &node.node_type,
                    &edge.label,
                    edge.direction_from(&node.key),
                    &edge.far.node_type,
                )
                .is_some_and(|r| r.name == relationship)
        })
        .map(|edge| edge.far.clone())
        .collect()
}

/// Decode raw properties against a node type's declarations.
///
/// Keys may use either the store name or the wire name. Declared properties
/// missing from `raw` are left out; undeclared keys are rejected.
pub(crate) fn decode_properties(
    registry: &SchemaRegistry,
    node_type: &str,
    raw: &Map<String, Value>,
) -> Result<Properties, GraphError> {
    let declared = registry
        .get(node_type)
        .ok_or_else(|| GraphError::UnknownType(node_type.to_string()))?;

    let mut properties = Properties::new();
    for (key, value) in raw {
        let descriptor = declared
            .property(key)
            .or_else(|| declared.properties().iter().find(|p| &p.wire_name == key))
            .ok_or_else(|| GraphError::InvalidProperty {
                node_type: node_type.to_string(),
                property: key.clone(),
                reason: "not declared on this type".to_string(),
            })?;
        let decoded =
            PropertyValue::from_json(&descriptor.kind, value).map_err(|reason| GraphError::InvalidProperty {
                node_type: node_type.to_string(),
                property: descriptor.name.clone(),
                reason,
            })?;
        properties.insert(descriptor.name.clone(), decoded);
    }

    Ok(properties)
}

/// The node's unique id from already decoded properties.
pub(crate) fn required_id(
    registry: &SchemaRegistry,
    node_type: &str,
    properties: &Properties,
) -> Result<String, GraphError> {
    let declared = registry
        .get(node_type)
        .ok_or_else(|| GraphError::UnknownType(node_type.to_string()))?;
    let unique = declared.unique_property();
    properties
        .get(&unique.name)
        .and_then(PropertyValue::as_id)
        .ok_or_else(|| GraphError::InvalidProperty {
            node_type: node_type.to_string(),
            property: unique.name.clone(),
            reason: "unique id is required".to_string(),
        })
}

/// Root of the type's hierarchy. External ids are unique per root.
pub(crate) fn root_type<'a>(registry: &'a SchemaRegistry, node_type: &'a str) -> &'a str {
    registry
        .get(node_type)
        .and_then(|t| t.ancestors().last())
        .map(String::as_str)
        .unwrap_or(node_type)
}
