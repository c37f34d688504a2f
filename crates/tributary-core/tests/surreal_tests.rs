use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use tributary_core::graph::{Fixture, PropertyValue};
use tributary_core::schema::Direction;
use tributary_core::{
    GraphError, GraphPort, GraphSession, MemoryGraph, SchemaRegistry, Story, StoryResolver, SurrealGraph, TemplateSet,
};

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::builtin().unwrap())
}

fn pipeline_fixture() -> Fixture {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pipeline.yaml");
    Fixture::load(&path).unwrap()
}

async fn create_test_graph() -> SurrealGraph {
    let graph = SurrealGraph::memory("test", "graph", registry()).await.unwrap();
    graph.initialize_schema().await.unwrap();
    graph
}

#[tokio::test]
async fn test_initialize_schema_twice() {
    let graph = create_test_graph().await;
    graph.initialize_schema().await.unwrap();
}

#[tokio::test]
async fn test_upsert_and_get_node() {
    let graph = create_test_graph().await;
    let key = graph
        .upsert_node("KojiBuild", json!({ "id": "2345", "name": "slf4j", "state": 1 }))
        .await
        .unwrap();

    let node = graph.get_node("KojiBuild", "2345").await.unwrap().unwrap();
    assert_eq!(node.key, key);
    assert_eq!(node.node_type, "KojiBuild");
    assert_eq!(node.property("name"), Some(&PropertyValue::String("slf4j".to_string())));
    assert_eq!(node.property("state"), Some(&PropertyValue::Integer(1)));

    assert!(graph.get_node("KojiBuild", "9999").await.unwrap().is_none());
    assert!(matches!(
        graph.get_node("Spaceship", "1").await,
        Err(GraphError::UnknownType(_))
    ));
}

#[tokio::test]
async fn test_upsert_merges_properties() {
    let graph = create_test_graph().await;
    let first = graph
        .upsert_node("BugzillaBug", json!({ "id": "1", "status": "NEW", "votes": 2 }))
        .await
        .unwrap();
    let second = graph
        .upsert_node("BugzillaBug", json!({ "id": "1", "status": "VERIFIED" }))
        .await
        .unwrap();
    assert_eq!(first, second);

    let node = graph.get_node("BugzillaBug", "1").await.unwrap().unwrap();
    assert_eq!(node.property("status"), Some(&PropertyValue::String("VERIFIED".to_string())));
    assert_eq!(node.property("votes"), Some(&PropertyValue::Integer(2)));
}

#[tokio::test]
async fn test_upsert_narrows_to_subtype() {
    let graph = create_test_graph().await;
    let build = graph.upsert_node("KojiBuild", json!({ "id": "710" })).await.unwrap();
    let image = graph
        .upsert_node("ContainerKojiBuild", json!({ "id": "710", "original_nvr": "some_nvr-1-1" }))
        .await
        .unwrap();
    assert_eq!(build, image);

    let node = graph.get_node("KojiBuild", "710").await.unwrap().unwrap();
    assert_eq!(node.node_type, "ContainerKojiBuild");
    assert!(graph.get_node("ContainerKojiBuild", "710").await.unwrap().is_some());
}

#[tokio::test]
async fn test_upsert_rejects_bad_properties() {
    let graph = create_test_graph().await;

    let err = graph
        .upsert_node("Advisory", json!({ "id": "1", "state": "LOST" }))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidProperty { .. }));

    let err = graph
        .upsert_node("Advisory", json!({ "id": "1", "colour": "red" }))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidProperty { .. }));
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let graph = create_test_graph().await;
    let commit = graph.upsert_node("DistGitCommit", json!({ "hash": "abc" })).await.unwrap();
    let bug = graph.upsert_node("BugzillaBug", json!({ "id": "1" })).await.unwrap();

    graph.connect(&commit, "RESOLVED", &bug).await.unwrap();
    graph.connect(&commit, "RESOLVED", &bug).await.unwrap();

    let edges = graph.get_edges(&commit).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].label, "RESOLVED");
    assert_eq!(edges[0].far.key, bug);
    assert_eq!(edges[0].direction_from(&commit), Direction::Outgoing);

    let edges = graph.get_edges(&bug).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].far.key, commit);
    assert_eq!(edges[0].direction_from(&bug), Direction::Incoming);
}

#[tokio::test]
async fn test_connect_unknown_key() {
    let graph = create_test_graph().await;
    let bug = graph.upsert_node("BugzillaBug", json!({ "id": "1" })).await.unwrap();

    let err = graph.connect("no-such-key", "RESOLVED", &bug).await.unwrap_err();
    assert!(matches!(err, GraphError::UnknownKey(key) if key == "no-such-key"));
}

#[tokio::test]
async fn test_edges_keep_insertion_order() {
    let graph = create_test_graph().await;
    graph.load_fixture(&pipeline_fixture()).await.unwrap();

    let build = graph.get_node("KojiBuild", "2345").await.unwrap().unwrap();
    let registry = registry();
    let far: Vec<(String, String)> = graph
        .get_edges(&build.key)
        .await
        .unwrap()
        .iter()
        .map(|e| (e.label.clone(), e.far.external_id(&registry).unwrap()))
        .collect();

    assert_eq!(
        far,
        [
            ("BUILT_FROM".to_string(), "8a63adb248ba633e200067e1ad6dc61931727bad".to_string()),
            ("BUILT_FROM".to_string(), "f4dfc64c10a90492303e4f14ad3549a1a2b13575".to_string()),
            ("OWNED_BY".to_string(), "tbrady".to_string()),
            ("ATTACHED".to_string(), "27825".to_string()),
            ("ATTACHED".to_string(), "123456".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_edges_written_back_to_back_keep_order() {
    let graph = create_test_graph().await;
    let build = graph.upsert_node("KojiBuild", json!({ "id": "1" })).await.unwrap();
    let mut expected = Vec::new();
    for n in 0..40 {
        let advisory = graph
            .upsert_node("Advisory", json!({ "id": n.to_string() }))
            .await
            .unwrap();
        graph.connect(&advisory, "ATTACHED", &build).await.unwrap();
        expected.push(advisory);
    }

    let far: Vec<String> = graph
        .get_edges(&build)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.far.key)
        .collect();
    assert_eq!(far, expected);
}

#[tokio::test]
async fn test_stories_match_in_memory_graph() {
    let registry = registry();
    let templates = Arc::new(TemplateSet::builtin(&registry).unwrap());
    let resolver = StoryResolver::new(templates, 4);

    let surreal: Arc<dyn GraphPort> = {
        let graph = create_test_graph().await;
        graph.load_fixture(&pipeline_fixture()).await.unwrap();
        Arc::new(graph)
    };
    let memory: Arc<dyn GraphPort> =
        Arc::new(MemoryGraph::from_fixture(Arc::clone(&registry), &pipeline_fixture()).unwrap());

    let summarize = |stories: Vec<Story>| -> Vec<(Vec<String>, BTreeMap<String, usize>)> {
        stories
            .into_iter()
            .map(|s| {
                let ids = s
                    .hops
                    .iter()
                    .flat_map(|h| h.nodes.iter().map(|n| n.external_id(&registry).unwrap()))
                    .collect();
                (ids, s.related_nodes)
            })
            .collect()
    };

    for (node_type, id) in [("BugzillaBug", "12345"), ("KojiBuild", "2345"), ("FreshmakerEvent", "1180")] {
        let session = GraphSession::new(Arc::clone(&surreal), None);
        let from_surreal = resolver.resolve(&session, node_type, id).await.unwrap();
        let session = GraphSession::new(Arc::clone(&memory), None);
        let from_memory = resolver.resolve(&session, node_type, id).await.unwrap();

        assert!(!from_memory.is_empty());
        assert_eq!(summarize(from_surreal), summarize(from_memory), "{node_type} {id}");
    }
}
