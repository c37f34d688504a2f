use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use tributary_core::config::{ConfigError, StoreBackend, StoreConfig};
use tributary_core::graph::Fixture;
use tributary_core::story::TemplateError;
use tributary_core::{open_store, Config, GraphError, GraphPort, SchemaRegistry, TemplateSet};

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::builtin().unwrap())
}

fn pipeline_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pipeline.yaml")
}

/// Creates a scratch directory holding a JSON copy of the pipeline fixture.
fn create_json_fixture() -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let fixture = Fixture::load(&pipeline_path()).unwrap();
    let path = temp_dir.path().join("pipeline.json");
    fs::write(&path, serde_json::to_string_pretty(&fixture).unwrap()).unwrap();
    (path, temp_dir)
}

#[tokio::test]
async fn test_open_memory_store() {
    let config = StoreConfig {
        backend: StoreBackend::Memory,
        fixture: Some(pipeline_path()),
        ..Default::default()
    };

    let port = open_store(&config, registry()).await.unwrap();

    let node = port.get_node("Advisory", "27825").await.unwrap().unwrap();
    assert_eq!(node.node_type, "Advisory");
    assert_eq!(port.get_edges(&node.key).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_json_and_yaml_fixtures_agree() {
    let (json_path, _temp_dir) = create_json_fixture();
    let from_yaml = Fixture::load(&pipeline_path()).unwrap();
    let from_json = Fixture::load(&json_path).unwrap();

    assert_eq!(from_json.nodes.len(), from_yaml.nodes.len());
    assert_eq!(from_json.edges.len(), from_yaml.edges.len());

    let config = StoreConfig {
        backend: StoreBackend::Memory,
        fixture: Some(json_path),
        ..Default::default()
    };
    let port = open_store(&config, registry()).await.unwrap();
    assert!(port.get_node("ContainerKojiBuild", "811").await.unwrap().is_some());
}

#[tokio::test]
async fn test_open_surreal_store_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let config = StoreConfig {
        backend: StoreBackend::Surreal,
        path: temp_dir.path().join("store").join("graph"),
        fixture: Some(pipeline_path()),
        ..Default::default()
    };

    let port = open_store(&config, registry()).await.unwrap();

    let node = port.get_node("KojiBuild", "2345").await.unwrap().unwrap();
    assert_eq!(port.get_edges(&node.key).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_missing_fixture() {
    let config = StoreConfig {
        backend: StoreBackend::Memory,
        fixture: Some(PathBuf::from("/nonexistent/fixture.yaml")),
        ..Default::default()
    };

    let err = open_store(&config, registry()).await.err().unwrap();
    assert!(matches!(err, GraphError::Fixture(_)));
}

#[test]
fn test_fixture_with_dangling_edge() {
    let fixture = Fixture::from_json(
        &json!({
            "nodes": [{ "type": "BugzillaBug", "ref": "bug", "properties": { "id": "1" } }],
            "edges": [{ "from": "commit", "label": "RESOLVED", "to": "bug" }]
        })
        .to_string(),
    )
    .unwrap();

    let err = tributary_core::MemoryGraph::from_fixture(registry(), &fixture).unwrap_err();
    assert!(matches!(err, GraphError::Fixture(_)));
}

#[test]
fn test_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("tributary.toml");
    fs::write(
        &path,
        r#"
[server]
port = 8080

[store]
backend = "memory"
fixture = "graph.yaml"

[story]
request_timeout_ms = 2500
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.store.fixture, Some(PathBuf::from("graph.yaml")));
    assert_eq!(config.story.request_timeout().as_millis(), 2500);
    assert_eq!(config.story.fan_out_concurrency, 8);
}

#[test]
fn test_config_file_errors() {
    let temp_dir = TempDir::new().unwrap();

    let err = Config::from_file(temp_dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError(_)));

    let path = temp_dir.path().join("broken.toml");
    fs::write(&path, "[server\nport = ").unwrap();
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));

    let path = temp_dir.path().join("memory.toml");
    fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();
    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_template_files() {
    let temp_dir = TempDir::new().unwrap();
    let registry = SchemaRegistry::builtin().unwrap();

    let toml_path = temp_dir.path().join("stories.toml");
    fs::write(
        &toml_path,
        r#"
[[template]]
name = "owner-builds"
seed = "User"
steps = [
    { name = "user", headline = true },
    { name = "builds", from = "user", relationship = "koji_builds", mode = "gather", headline = true },
]
"#,
    )
    .unwrap();
    let templates = TemplateSet::load(&registry, &toml_path).unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates.for_type(&registry, "User").len(), 1);

    let yaml_path = temp_dir.path().join("stories.yaml");
    fs::write(
        &yaml_path,
        r#"
template:
  - name: tag-builds
    seed: KojiTag
    steps:
      - { name: tag, headline: true }
      - { name: build, from: tag, relationship: builds }
"#,
    )
    .unwrap();
    let templates = TemplateSet::load(&registry, &yaml_path).unwrap();
    assert_eq!(templates.iter().next().unwrap().name, "tag-builds");

    let bad_path = temp_dir.path().join("bad.toml");
    fs::write(
        &bad_path,
        r#"
[[template]]
name = "broken"
seed = "User"
steps = [
    { name = "user" },
    { name = "ships", from = "user", relationship = "ships" },
]
"#,
    )
    .unwrap();
    let err = TemplateSet::load(&registry, &bad_path).unwrap_err();
    assert!(matches!(err, TemplateError::Schema(_)));

    let err = TemplateSet::load(&registry, &temp_dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, TemplateError::Read(_)));
}
