//! Result shaping.
//!
//! Turns resolved stories into the JSON envelopes returned to clients:
//! `{"data": [...], "meta": {"related_nodes": {...}}}`.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::graph::{GraphError, GraphNode, GraphSession};
use crate::serialize::{NodeSerializer, PropertyMap};
use crate::story::Story;

/// Case-insensitive set of resource type names to serialize expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandSet {
    names: HashSet<String>,
}

impl ExpandSet {
    /// Parse a comma separated list such as `kojibuild,Advisory`.
    pub fn from_csv(list: &str) -> Self {
        Self {
            names: list
                .split(',')
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn only(resource: &str) -> Self {
        Self::from_csv(resource)
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.names.contains(&resource.to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryMeta {
    pub related_nodes: BTreeMap<String, usize>,
}

/// One story as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryEnvelope {
    pub data: Vec<Value>,
    pub meta: StoryMeta,
}

pub struct ResultShaper {
    serializer: Arc<NodeSerializer>,
}

impl ResultShaper {
    pub fn new(serializer: Arc<NodeSerializer>) -> Self {
        Self { serializer }
    }

    /// Serialize each story's nodes and wrap them in envelopes.
    ///
    /// Headline nodes whose type is in `expand` are serialized expanded and
    /// every other node shallow. A node appearing twice in one story is
    /// only emitted the first time.
    pub async fn shape(
        &self,
        session: &GraphSession,
        stories: &[Story],
        expand: &ExpandSet,
    ) -> Result<Vec<StoryEnvelope>, GraphError> {
        let registry = self.serializer.registry();
        let mut envelopes = Vec::with_capacity(stories.len());

        for story in stories {
            let mut emitted = HashSet::new();
            let mut data = Vec::new();

            for hop in &story.hops {
                for node in &hop.nodes {
                    let identity = (node.node_type.clone(), node.external_id(registry).unwrap_or_default());
                    if !emitted.insert(identity) {
                        continue;
                    }

                    let serialized = if hop.headline && expand.contains(&node.node_type) {
                        self.serializer.serialize_expanded(session, node).await?
                    } else {
                        self.serializer.serialize_shallow(node)?
                    };
                    data.push(with_resource_type(serialized, node));
                }
            }

            envelopes.push(StoryEnvelope {
                data,
                meta: StoryMeta {
                    related_nodes: story.related_nodes.clone(),
                },
            });
        }

        Ok(envelopes)
    }

    /// A single node, expanded, with its resource type.
    pub async fn shape_node(&self, session: &GraphSession, node: &GraphNode) -> Result<Value, GraphError> {
        let serialized = self.serializer.serialize_expanded(session, node).await?;
        Ok(with_resource_type(serialized, node))
    }
}

fn with_resource_type(mut serialized: PropertyMap, node: &GraphNode) -> Value {
    serialized.insert("resource_type".to_string(), Value::String(node.node_type.clone()));
    Value::Object(serialized)
}
