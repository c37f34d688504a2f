//! Per-request view of the graph.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{check_relationship, select_relationship, GraphEdge, GraphError, GraphNode, GraphPort};
use crate::schema::{Direction, SchemaRegistry};

/// Graph access scoped to one request.
///
/// Every store call is bounded by the request deadline, and edge lookups are
/// memoised so a node visited by several templates is fetched once. The
/// cache lock is never held while the store is being called.
pub struct GraphSession {
    port: Arc<dyn GraphPort>,
    deadline: Option<Instant>,
    edges: Mutex<HashMap<String, Arc<Vec<GraphEdge>>>>,
}

impl GraphSession {
    pub fn new(port: Arc<dyn GraphPort>, timeout: Option<Duration>) -> Self {
        Self {
            port,
            deadline: timeout.map(|t| Instant::now() + t),
            edges: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.port.registry()
    }

    /// Fetch a node, failing with `NotFound` when it does not exist.
    pub async fn get_node(&self, node_type: &str, external_id: &str) -> Result<GraphNode, GraphError> {
        self.bounded(self.port.get_node(node_type, external_id))
            .await?
            .ok_or_else(|| GraphError::NotFound {
                node_type: node_type.to_string(),
                id: external_id.to_string(),
            })
    }

    /// Every edge incident to the node.
    pub async fn edges(&self, node: &GraphNode) -> Result<Arc<Vec<GraphEdge>>, GraphError> {
        if let Some(cached) = self.edges.lock().await.get(&node.key) {
            return Ok(Arc::clone(cached));
        }

        let fetched = Arc::new(self.bounded(self.port.get_edges(&node.key)).await?);
        self.edges
            .lock()
            .await
            .insert(node.key.clone(), Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Nodes reached from `node` through a declared relationship.
    pub async fn follow(&self, node: &GraphNode, relationship: &str) -> Result<Vec<GraphNode>, GraphError> {
        check_relationship(self.registry(), node, relationship)?;
        let edges = self.edges(node).await?;
        Ok(select_relationship(self.registry(), node, relationship, &edges))
    }

    /// Nodes of `far_type` (or a subtype) attached to `node` by `label` edges
    /// running in `direction`.
    pub async fn neighbors(
        &self,
        node: &GraphNode,
        label: &str,
        direction: Direction,
        far_type: &str,
    ) -> Result<Vec<GraphNode>, GraphError> {
        let edges = self.edges(node).await?;
        let registry = self.registry();
        Ok(edges
            .iter()
            .filter(|edge| {
                edge.label == label
                    && direction.admits(edge.direction_from(&node.key))
                    && registry.is_a(&edge.far.node_type, far_type)
            })
            .map(|edge| edge.far.clone())
            .collect())
    }

    /// Fail with `Timeout` once the request deadline has passed.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, GraphError>
    where
        F: Future<Output = Result<T, GraphError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call)
                .await
                .map_err(|_| GraphError::Timeout)?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryGraph;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPort {
        inner: MemoryGraph,
        edge_calls: AtomicUsize,
    }

    #[async_trait]
    impl GraphPort for CountingPort {
        fn registry(&self) -> &Arc<SchemaRegistry> {
            self.inner.registry()
        }

        async fn get_node(&self, node_type: &str, external_id: &str) -> Result<Option<GraphNode>, GraphError> {
            self.inner.get_node(node_type, external_id).await
        }

        async fn get_edges(&self, key: &str) -> Result<Vec<GraphEdge>, GraphError> {
            self.edge_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_edges(key).await
        }
    }

    struct StalledPort(MemoryGraph);

    #[async_trait]
    impl GraphPort for StalledPort {
        fn registry(&self) -> &Arc<SchemaRegistry> {
            self.0.registry()
        }

        async fn get_node(&self, _: &str, _: &str) -> Result<Option<GraphNode>, GraphError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn get_edges(&self, _: &str) -> Result<Vec<GraphEdge>, GraphError> {
            Ok(Vec::new())
        }
    }

    fn fixture() -> MemoryGraph {
        let mut g = MemoryGraph::new(Arc::new(SchemaRegistry::builtin().unwrap()));
        let build = g.upsert_node("KojiBuild", json!({"id": "2345"})).unwrap();
        let advisory = g.upsert_node("Advisory", json!({"id": "27825"})).unwrap();
        g.connect(&advisory, "ATTACHED", &build).unwrap();
        g
    }

    #[tokio::test]
    async fn test_edges_are_memoised() {
        let port = Arc::new(CountingPort {
            inner: fixture(),
            edge_calls: AtomicUsize::new(0),
        });
        let session = GraphSession::new(port.clone(), None);
        let build = session.get_node("KojiBuild", "2345").await.unwrap();

        session.edges(&build).await.unwrap();
        session.follow(&build, "advisories").await.unwrap();
        let advisories = session
            .neighbors(&build, "ATTACHED", Direction::Incoming, "Advisory")
            .await
            .unwrap();

        assert_eq!(advisories.len(), 1);
        assert_eq!(port.edge_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_node_is_not_found() {
        let session = GraphSession::new(Arc::new(fixture()), None);
        let err = session.get_node("KojiBuild", "1").await.unwrap_err();
        assert!(matches!(err, GraphError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_deadline_bounds_store_calls() {
        let session = GraphSession::new(Arc::new(StalledPort(fixture())), Some(Duration::from_millis(20)));
        let err = session.get_node("KojiBuild", "2345").await.unwrap_err();
        assert!(matches!(err, GraphError::Timeout));
        assert!(err.is_retryable());
    }
}
