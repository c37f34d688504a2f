//! SurrealDB embedded graph store.
//!
//! Nodes live in `graph_node` with their type, unique id and a property
//! object; edges live in `graph_edge` as plain records holding the keys of
//! both ends and a sequence number that fixes their order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;

use super::fixture::References;
use super::{
    decode_properties, required_id, root_type, Fixture, GraphEdge, GraphError, GraphNode, GraphPort,
    Properties,
};
use crate::schema::SchemaRegistry;

#[derive(Debug, Serialize, Deserialize)]
struct NodeRow {
    node_key: String,
    node_type: String,
    uid: String,
    properties: Value,
}

#[derive(Debug, Deserialize)]
struct EdgeRow {
    from_key: String,
    to_key: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct SeqRow {
    seq: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct KeyRow {
    node_key: String,
}

/// Graph store backed by SurrealDB.
///
/// Edges are numbered as they are written, so [`GraphPort::get_edges`]
/// returns them in insertion order even when several are created within
/// the same clock tick.
pub struct SurrealGraph {
    db: Surreal<Db>,
    registry: Arc<SchemaRegistry>,
    last_seq: AtomicU64,
}

impl SurrealGraph {
    /// Open or create a RocksDB-backed store at the given path.
    pub async fn open(
        path: &Path,
        namespace: &str,
        database: &str,
        registry: Arc<SchemaRegistry>,
    ) -> Result<Self, GraphError> {
        let db = Surreal::new::<RocksDb>(path).await?;
        db.use_ns(namespace).use_db(database).await?;
        Ok(Self::with_db(db, registry))
    }

    /// Open a throwaway in-memory store.
    pub async fn memory(
        namespace: &str,
        database: &str,
        registry: Arc<SchemaRegistry>,
    ) -> Result<Self, GraphError> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns(namespace).use_db(database).await?;
        Ok(Self::with_db(db, registry))
    }

    fn with_db(db: Surreal<Db>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            db,
            registry,
            last_seq: AtomicU64::new(0),
        }
    }

    /// Define tables and indexes. Safe to run on an initialized store.
    pub async fn initialize_schema(&self) -> Result<(), GraphError> {
        self.db
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS graph_node SCHEMALESS;
                DEFINE FIELD IF NOT EXISTS node_key ON graph_node TYPE string;
                DEFINE FIELD IF NOT EXISTS node_type ON graph_node TYPE string;
                DEFINE FIELD IF NOT EXISTS uid ON graph_node TYPE string;
                DEFINE INDEX IF NOT EXISTS graph_node_key ON graph_node FIELDS node_key UNIQUE;
                DEFINE INDEX IF NOT EXISTS graph_node_uid ON graph_node FIELDS uid;
                "#,
            )
            .await?
            .check()?;

        self.db
            .query(
                r#"
                DEFINE TABLE IF NOT EXISTS graph_edge SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS from_key ON graph_edge TYPE string;
                DEFINE FIELD IF NOT EXISTS to_key ON graph_edge TYPE string;
                DEFINE FIELD IF NOT EXISTS label ON graph_edge TYPE string;
                DEFINE FIELD IF NOT EXISTS seq ON graph_edge TYPE int;
                DEFINE FIELD IF NOT EXISTS created_at ON graph_edge TYPE datetime;
                DEFINE INDEX IF NOT EXISTS graph_edge_from ON graph_edge FIELDS from_key;
                DEFINE INDEX IF NOT EXISTS graph_edge_to ON graph_edge FIELDS to_key;
                "#,
            )
            .await?
            .check()?;

        // Continue numbering after the edges already in the store
        let last: Option<SeqRow> = self
            .db
            .query("SELECT seq FROM graph_edge ORDER BY seq DESC LIMIT 1")
            .await?
            .take(0)?;
        let last = last
            .and_then(|row| row.seq)
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);
        self.last_seq.fetch_max(last, Ordering::SeqCst);

        Ok(())
    }

    /// Insert a node, or merge properties into the node with the same id.
    pub async fn upsert_node(&self, node_type: &str, properties: Value) -> Result<String, GraphError> {
        let Value::Object(raw) = properties else {
            return Err(GraphError::InvalidProperty {
                node_type: node_type.to_string(),
                property: "properties".to_string(),
                reason: "expected an object".to_string(),
            });
        };
        let mut properties = decode_properties(&self.registry, node_type, &raw)?;
        let uid = required_id(&self.registry, node_type, &properties)?;
        let family = self.family_of(node_type);

        let existing: Option<NodeRow> = self
            .db
            .query("SELECT node_key, node_type, uid, properties FROM graph_node WHERE uid = $uid AND node_type IN $types LIMIT 1")
            .bind(("uid", uid.clone()))
            .bind(("types", family))
            .await?
            .take(0)?;

        match existing {
            Some(row) => {
                let stored = self.decode_row(&row)?;
                let mut merged = stored.properties;
                merged.append(&mut properties);
                let narrowed = if self.registry.is_a(node_type, &row.node_type) {
                    node_type.to_string()
                } else {
                    row.node_type.clone()
                };

                self.db
                    .query("UPDATE graph_node SET node_type = $node_type, properties = $properties WHERE node_key = $key")
                    .bind(("node_type", narrowed))
                    .bind(("properties", encode_properties(&merged)))
                    .bind(("key", row.node_key.clone()))
                    .await?
                    .check()?;
                Ok(row.node_key)
            }
            None => {
                let row = NodeRow {
                    node_key: uuid::Uuid::new_v4().to_string(),
                    node_type: node_type.to_string(),
                    uid,
                    properties: encode_properties(&properties),
                };
                let key = row.node_key.clone();
                self.db
                    .query("CREATE graph_node CONTENT $row")
                    .bind(("row", row))
                    .await?
                    .check()?;
                Ok(key)
            }
        }
    }

    /// Add an edge between two stored nodes. Adding the same edge twice is a no-op.
    pub async fn connect(&self, from: &str, label: &str, to: &str) -> Result<(), GraphError> {
        let found: Vec<KeyRow> = self
            .db
            .query("SELECT node_key FROM graph_node WHERE node_key IN $keys")
            .bind(("keys", vec![from.to_string(), to.to_string()]))
            .await?
            .take(0)?;
        for key in [from, to] {
            if !found.iter().any(|row| row.node_key == key) {
                return Err(GraphError::UnknownKey(key.to_string()));
            }
        }

        let existing: Vec<EdgeRow> = self
            .db
            .query("SELECT from_key, to_key, label FROM graph_edge WHERE from_key = $from AND to_key = $to AND label = $label")
            .bind(("from", from.to_string()))
            .bind(("to", to.to_string()))
            .bind(("label", label.to_string()))
            .await?
            .take(0)?;
        if !existing.is_empty() {
            return Ok(());
        }

        let seq = self.last_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.db
            .query("CREATE graph_edge CONTENT { from_key: $from, to_key: $to, label: $label, seq: $seq, created_at: time::now() }")
            .bind(("from", from.to_string()))
            .bind(("to", to.to_string()))
            .bind(("label", label.to_string()))
            .bind(("seq", seq as i64))
            .await?
            .check()?;
        Ok(())
    }

    /// Write every node and edge of a fixture.
    pub async fn load_fixture(&self, fixture: &Fixture) -> Result<(), GraphError> {
        let mut refs = References::default();
        for node in &fixture.nodes {
            let raw = Value::Object(node.properties.clone());
            let key = self.upsert_node(&node.node_type, raw).await?;
            let properties = decode_properties(&self.registry, &node.node_type, &node.properties)?;
            let uid = required_id(&self.registry, &node.node_type, &properties)?;
            refs.record(node, &node.node_type, &uid, &key);
        }
        for edge in &fixture.edges {
            let from = refs.resolve(&edge.from)?;
            let to = refs.resolve(&edge.to)?;
            self.connect(from, &edge.label, to).await?;
        }
        Ok(())
    }

    /// Every registered type sharing an id space with `node_type`.
    fn family_of(&self, node_type: &str) -> Vec<String> {
        let root = root_type(&self.registry, node_type);
        self.registry
            .subtypes_of(root)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Stored properties the registry no longer declares are dropped, and
    /// nodes of unregistered types come back without properties.
    fn decode_row(&self, row: &NodeRow) -> Result<GraphNode, GraphError> {
        let properties = match (self.registry.get(&row.node_type), &row.properties) {
            (Some(declared), Value::Object(raw)) => {
                let known: Map<String, Value> = raw
                    .iter()
                    .filter(|(name, _)| declared.property(name).is_some())
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                decode_properties(&self.registry, &row.node_type, &known)?
            }
            _ => Properties::new(),
        };

        Ok(GraphNode {
            key: row.node_key.clone(),
            node_type: row.node_type.clone(),
            properties,
        })
    }
}

#[async_trait]
impl GraphPort for SurrealGraph {
    fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    async fn get_node(&self, node_type: &str, external_id: &str) -> Result<Option<GraphNode>, GraphError> {
        if self.registry.get(node_type).is_none() {
            return Err(GraphError::UnknownType(node_type.to_string()));
        }
        let types: Vec<String> = self
            .registry
            .subtypes_of(node_type)
            .into_iter()
            .map(str::to_string)
            .collect();

        let row: Option<NodeRow> = self
            .db
            .query("SELECT node_key, node_type, uid, properties FROM graph_node WHERE uid = $uid AND node_type IN $types LIMIT 1")
            .bind(("uid", external_id.to_string()))
            .bind(("types", types))
            .await?
            .take(0)?;

        row.map(|r| self.decode_row(&r)).transpose()
    }

    async fn get_edges(&self, key: &str) -> Result<Vec<GraphEdge>, GraphError> {
        let rows: Vec<EdgeRow> = self
            .db
            .query("SELECT from_key, to_key, label, seq FROM graph_edge WHERE from_key = $key OR to_key = $key ORDER BY seq")
            .bind(("key", key.to_string()))
            .await?
            .take(0)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let far_keys: Vec<String> = rows
            .iter()
            .map(|r| if r.from_key == key { r.to_key.clone() } else { r.from_key.clone() })
            .collect();
        let far_rows: Vec<NodeRow> = self
            .db
            .query("SELECT node_key, node_type, uid, properties FROM graph_node WHERE node_key IN $keys")
            .bind(("keys", far_keys))
            .await?
            .take(0)?;

        let mut far_nodes = HashMap::new();
        for row in &far_rows {
            far_nodes.insert(row.node_key.clone(), self.decode_row(row)?);
        }

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let far_key = if row.from_key == key { &row.to_key } else { &row.from_key };
                let far = far_nodes.get(far_key)?.clone();
                Some(GraphEdge {
                    source: row.from_key,
                    target: row.to_key,
                    label: row.label,
                    far,
                })
            })
            .collect())
    }
}

fn encode_properties(properties: &Properties) -> Value {
    Value::Object(
        properties
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}
