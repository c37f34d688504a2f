//! Graph snapshot fixtures.
//!
//! A fixture lists nodes and the edges between them:
//!
//! ```yaml
//! nodes:
//!   - type: BugzillaBug
//!     ref: bug
//!     properties: { id: "12345", status: CLOSED }
//!   - type: DistGitCommit
//!     properties: { hash: 8a63adb }
//! edges:
//!   - { from: "DistGitCommit:8a63adb", label: RESOLVED, to: bug }
//! ```
//!
//! Edges name their endpoints by `ref`, which defaults to
//! `<type>:<external id>`. Property keys may be store or wire names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use super::GraphError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub nodes: Vec<FixtureNode>,
    #[serde(default)]
    pub edges: Vec<FixtureEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureEdge {
    pub from: String,
    pub label: String,
    pub to: String,
}

impl Fixture {
    /// Load a fixture, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Fixture(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, GraphError> {
        serde_yaml::from_str(content).map_err(|e| GraphError::Fixture(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self, GraphError> {
        serde_json::from_str(content).map_err(|e| GraphError::Fixture(e.to_string()))
    }
}

/// Tracks fixture references while a fixture is being applied.
#[derive(Debug, Default)]
pub(crate) struct References {
    keys: HashMap<String, String>,
}

impl References {
    pub(crate) fn record(&mut self, node: &FixtureNode, node_type: &str, external_id: &str, key: &str) {
        self.keys
            .insert(format!("{}:{}", node_type, external_id), key.to_string());
        if let Some(reference) = &node.reference {
            self.keys.insert(reference.clone(), key.to_string());
        }
    }

    pub(crate) fn resolve(&self, reference: &str) -> Result<&str, GraphError> {
        self.keys
            .get(reference)
            .map(String::as_str)
            .ok_or_else(|| GraphError::Fixture(format!("edge endpoint {} matches no node", reference)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_fixture_parses() {
        let fixture = Fixture::from_yaml(
            r#"
nodes:
  - type: BugzillaBug
    ref: bug
    properties: { id: "12345" }
edges:
  - { from: "DistGitCommit:8a63adb", label: RESOLVED, to: bug }
"#,
        )
        .unwrap();

        assert_eq!(fixture.nodes.len(), 1);
        assert_eq!(fixture.nodes[0].reference.as_deref(), Some("bug"));
        assert_eq!(fixture.edges[0].label, "RESOLVED");
    }

    #[test]
    fn test_references_resolve_alias_and_default() {
        let node = FixtureNode {
            node_type: "BugzillaBug".to_string(),
            reference: Some("bug".to_string()),
            properties: Map::new(),
        };
        let mut refs = References::default();
        refs.record(&node, "BugzillaBug", "12345", "k1");

        assert_eq!(refs.resolve("bug").unwrap(), "k1");
        assert_eq!(refs.resolve("BugzillaBug:12345").unwrap(), "k1");
        assert!(refs.resolve("BugzillaBug:1").is_err());
    }
}
