//! Node serialization.
//!
//! Turns a [`GraphNode`] into the JSON object exposed to clients. The shallow
//! form holds every declared property under its wire name. The expanded form
//! adds every declared relationship, each holding the shallow form of the
//! related nodes:
//!
//! - single-valued relationships are an object, or `null` when absent
//! - many-valued relationships are an array, `[]` when absent
//!
//! Edges the schema does not map are reported to the [`DiagnosticsSink`]
//! and left out.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::diagnostics::DiagnosticsSink;
use crate::graph::{GraphError, GraphNode, GraphSession};
use crate::schema::{Direction, SchemaRegistry};

/// A serialized node.
pub type PropertyMap = Map<String, Value>;

pub struct NodeSerializer {
    registry: Arc<SchemaRegistry>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl NodeSerializer {
    pub fn new(registry: Arc<SchemaRegistry>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            registry,
            diagnostics,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Every declared property, inherited ones included, under its wire name.
    pub fn serialize_shallow(&self, node: &GraphNode) -> Result<PropertyMap, GraphError> {
        let node_type = self
            .registry
            .get(&node.node_type)
            .ok_or_else(|| GraphError::UnknownType(node.node_type.clone()))?;

        Ok(node_type
            .properties()
            .iter()
            .map(|property| {
                let value = node
                    .property(&property.name)
                    .map(|v| v.to_json())
                    .unwrap_or(Value::Null);
                (property.wire_name.clone(), value)
            })
            .collect())
    }

    /// The shallow form plus every declared relationship, one level deep.
    pub async fn serialize_expanded(
        &self,
        session: &GraphSession,
        node: &GraphNode,
    ) -> Result<PropertyMap, GraphError> {
        let mut serialized = self.serialize_shallow(node)?;
        let node_type = self
            .registry
            .get(&node.node_type)
            .ok_or_else(|| GraphError::UnknownType(node.node_type.clone()))?;

        for relationship in node_type.relationships() {
            let empty = if relationship.cardinality.is_single() {
                Value::Null
            } else {
                Value::Array(Vec::new())
            };
            serialized.insert(relationship.name.clone(), empty);
        }

        let edges = session.edges(node).await?;
        for edge in edges.iter() {
            let direction = edge.direction_from(&node.key);
            let Some(relationship) = self.registry.relationship_for(
                &node.node_type,
                &edge.label,
                direction,
                &edge.far.node_type,
            ) else {
                self.diagnostics.warn(&unmapped_message(node, &edge.label, direction, &edge.far));
                continue;
            };

            let far = self.serialize_shallow(&edge.far)?;
            if relationship.cardinality.is_single() {
                serialized.insert(relationship.name.clone(), Value::Object(far));
            } else if let Some(Value::Array(items)) = serialized.get_mut(&relationship.name) {
                items.push(Value::Object(far));
            }
        }

        Ok(serialized)
    }
}

fn unmapped_message(node: &GraphNode, label: &str, direction: Direction, far: &GraphNode) -> String {
    let (from, to) = match direction {
        Direction::Incoming => (&far.node_type, &node.node_type),
        _ => (&node.node_type, &far.node_type),
    };
    format!(
        "An {} {} relationship of {} ({} -> {}) is not mapped in the schema and will be ignored",
        direction, label, node.node_type, from, to
    )
}
