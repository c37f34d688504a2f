//! In-process graph store.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::fixture::References;
use super::{
    decode_properties, required_id, root_type, Fixture, GraphEdge, GraphError, GraphNode, GraphPort,
};
use crate::schema::SchemaRegistry;

#[derive(Debug, Clone)]
struct StoredEdge {
    source: String,
    target: String,
    label: String,
}

/// Graph held entirely in memory.
///
/// Built up front (from a fixture or through [`upsert_node`](Self::upsert_node)
/// and [`connect`](Self::connect)) and then shared read-only behind an `Arc`.
/// Edges are returned in insertion order.
#[derive(Debug, Clone)]
pub struct MemoryGraph {
    registry: Arc<SchemaRegistry>,
    nodes: HashMap<String, GraphNode>,
    ids: HashMap<(String, String), String>,
    edges: Vec<StoredEdge>,
}

impl MemoryGraph {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            nodes: HashMap::new(),
            ids: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Build a graph from a fixture.
    pub fn from_fixture(registry: Arc<SchemaRegistry>, fixture: &Fixture) -> Result<Self, GraphError> {
        let mut graph = Self::new(registry);
        let mut refs = References::default();

        for node in &fixture.nodes {
            let key = graph.upsert_node(&node.node_type, Value::Object(node.properties.clone()))?;
            let external_id = graph.nodes[&key].external_id(&graph.registry).unwrap_or_default();
            refs.record(node, &node.node_type, &external_id, &key);
        }
        for edge in &fixture.edges {
            let from = refs.resolve(&edge.from)?.to_string();
            let to = refs.resolve(&edge.to)?.to_string();
            graph.connect(&from, &edge.label, &to)?;
        }

        Ok(graph)
    }

    /// Insert a node, or merge properties into the node with the same id.
    ///
    /// Returns the node's store key. Upserting a subtype over an existing
    /// node of its parent type narrows the stored type.
    pub fn upsert_node(&mut self, node_type: &str, properties: Value) -> Result<String, GraphError> {
        let Value::Object(raw) = properties else {
            return Err(GraphError::InvalidProperty {
                node_type: node_type.to_string(),
                property: "properties".to_string(),
                reason: "expected an object".to_string(),
            });
        };
        let properties = decode_properties(&self.registry, node_type, &raw)?;
        let external_id = required_id(&self.registry, node_type, &properties)?;
        let id_key = (root_type(&self.registry, node_type).to_string(), external_id);

        if let Some(key) = self.ids.get(&id_key) {
            if let Some(existing) = self.nodes.get_mut(key) {
                existing.properties.extend(properties);
                if self.registry.is_a(node_type, &existing.node_type) {
                    existing.node_type = node_type.to_string();
                }
                return Ok(key.clone());
            }
        }

        let key = uuid::Uuid::new_v4().to_string();
        self.nodes.insert(
            key.clone(),
            GraphNode {
                key: key.clone(),
                node_type: node_type.to_string(),
                properties,
            },
        );
        self.ids.insert(id_key, key.clone());
        Ok(key)
    }

    /// Add an edge between two stored nodes. Adding the same edge twice is a no-op.
    pub fn connect(&mut self, from: &str, label: &str, to: &str) -> Result<(), GraphError> {
        for key in [from, to] {
            if !self.nodes.contains_key(key) {
                return Err(GraphError::UnknownKey(key.to_string()));
            }
        }
        let exists = self
            .edges
            .iter()
            .any(|e| e.source == from && e.target == to && e.label == label);
        if !exists {
            self.edges.push(StoredEdge {
                source: from.to_string(),
                target: to.to_string(),
                label: label.to_string(),
            });
        }
        Ok(())
    }

    /// Store key of the node with the given type and external id.
    pub fn key_of(&self, node_type: &str, external_id: &str) -> Option<&str> {
        let id_key = (root_type(&self.registry, node_type).to_string(), external_id.to_string());
        self.ids.get(&id_key).map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[async_trait]
impl GraphPort for MemoryGraph {
    fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    async fn get_node(&self, node_type: &str, external_id: &str) -> Result<Option<GraphNode>, GraphError> {
        if self.registry.get(node_type).is_none() {
            return Err(GraphError::UnknownType(node_type.to_string()));
        }
        let node = self
            .key_of(node_type, external_id)
            .and_then(|key| self.nodes.get(key))
            .filter(|node| self.registry.is_a(&node.node_type, node_type))
            .cloned();
        Ok(node)
    }

    async fn get_edges(&self, key: &str) -> Result<Vec<GraphEdge>, GraphError> {
        let edges = self
            .edges
            .iter()
            .filter_map(|edge| {
                let far_key = if edge.source == key {
                    &edge.target
                } else if edge.target == key {
                    &edge.source
                } else {
                    return None;
                };
                let far = self.nodes.get(far_key)?;
                Some(GraphEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    label: edge.label.clone(),
                    far: far.clone(),
                })
            })
            .collect();
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph() -> MemoryGraph {
        MemoryGraph::new(Arc::new(SchemaRegistry::builtin().unwrap()))
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_external_id() {
        let mut g = graph();
        let first = g.upsert_node("KojiBuild", json!({"id": "2345", "name": "slf4j"})).unwrap();
        let second = g.upsert_node("KojiBuild", json!({"id_": 2345, "version": "1.7.4"})).unwrap();

        assert_eq!(first, second);
        assert_eq!(g.node_count(), 1);
        let node = g.get_node("KojiBuild", "2345").await.unwrap().unwrap();
        assert!(node.property("name").is_some());
        assert!(node.property("version").is_some());
    }

    #[tokio::test]
    async fn test_subtype_found_through_parent_type() {
        let mut g = graph();
        g.upsert_node("ContainerKojiBuild", json!({"id": "710"})).unwrap();

        let node = g.get_node("KojiBuild", "710").await.unwrap().unwrap();
        assert_eq!(node.node_type, "ContainerKojiBuild");
        assert!(g.get_node("KojiBuild", "711").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parent_not_found_through_subtype() {
        let mut g = graph();
        g.upsert_node("KojiBuild", json!({"id": "2345"})).unwrap();
        assert!(g.get_node("ContainerKojiBuild", "2345").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edges_seen_from_both_ends() {
        let mut g = graph();
        let commit = g.upsert_node("DistGitCommit", json!({"hash": "8a63"})).unwrap();
        let bug = g.upsert_node("BugzillaBug", json!({"id": "12345"})).unwrap();
        g.connect(&commit, "RESOLVED", &bug).unwrap();
        g.connect(&commit, "RESOLVED", &bug).unwrap();

        assert_eq!(g.edge_count(), 1);
        let from_bug = g.get_edges(&bug).await.unwrap();
        assert_eq!(from_bug.len(), 1);
        assert_eq!(from_bug[0].far.key, commit);

        let node = g.get_node("DistGitCommit", "8a63").await.unwrap().unwrap();
        let bugs = g.follow(&node, "resolved_bugs").await.unwrap();
        assert_eq!(bugs.len(), 1);
        assert_eq!(bugs[0].key, bug);
    }

    #[test]
    fn test_rejects_undeclared_property_and_missing_id() {
        let mut g = graph();
        assert!(matches!(
            g.upsert_node("BugzillaBug", json!({"id": "1", "color": "red"})),
            Err(GraphError::InvalidProperty { .. })
        ));
        assert!(matches!(
            g.upsert_node("BugzillaBug", json!({"status": "NEW"})),
            Err(GraphError::InvalidProperty { .. })
        ));
        assert!(matches!(g.connect("a", "RESOLVED", "b"), Err(GraphError::UnknownKey(_))));
    }

    #[tokio::test]
    async fn test_unknown_type_is_an_error() {
        let g = graph();
        assert!(matches!(g.get_node("Widget", "1").await, Err(GraphError::UnknownType(_))));
    }
}
