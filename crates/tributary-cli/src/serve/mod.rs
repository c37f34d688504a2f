//! HTTP API.
//!
//! # Routes
//!
//! - `GET /healthz`
//! - `GET /api/v1/allstories/{resource}/{id}` - stories of a node
//! - `GET /api/v1/{resource}/{id}` - a single expanded node
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)
//! - `error` - error to status code mapping

mod error;
mod handlers;
mod models;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use tributary_core::config::ServerConfig;
use tributary_core::StoryService;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    pub service: Arc<StoryService>,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the HTTP server.
pub struct ServeConfig {
    /// Address to bind.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl From<&ServerConfig> for ServeConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Build the router with every API route.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/api/v1/allstories/{resource}/{id}", get(handlers::all_stories))
        .route("/api/v1/{resource}/{id}", get(handlers::node))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl+C.
pub async fn start_server(
    service: Arc<StoryService>,
    config: ServeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(Arc::new(AppState { service }));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Tributary API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    use tributary_core::graph::{GraphEdge, GraphError, GraphNode, GraphPort};
    use tributary_core::{
        MemoryGraph, RecordingDiagnostics, SchemaRegistry, ServiceOptions, TemplateSet,
    };

    enum Failure {
        Stall,
        Down,
    }

    struct FailingPort {
        registry: Arc<SchemaRegistry>,
        failure: Failure,
    }

    #[async_trait]
    impl GraphPort for FailingPort {
        fn registry(&self) -> &Arc<SchemaRegistry> {
            &self.registry
        }

        async fn get_node(&self, _: &str, _: &str) -> Result<Option<GraphNode>, GraphError> {
            match self.failure {
                Failure::Stall => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(None)
                }
                Failure::Down => Err(GraphError::StoreUnavailable("connection refused".to_string())),
            }
        }

        async fn get_edges(&self, _: &str) -> Result<Vec<GraphEdge>, GraphError> {
            Ok(Vec::new())
        }
    }

    fn app_with(port: Arc<dyn GraphPort>) -> Router {
        let templates = Arc::new(TemplateSet::builtin(port.registry()).unwrap());
        let service = StoryService::new(
            port,
            templates,
            Arc::new(RecordingDiagnostics::new()),
            ServiceOptions {
                request_timeout: Some(Duration::from_millis(50)),
                fan_out_concurrency: 4,
            },
        );
        router(Arc::new(AppState {
            service: Arc::new(service),
        }))
    }

    fn app() -> Router {
        let registry = Arc::new(SchemaRegistry::builtin().unwrap());
        let mut graph = MemoryGraph::new(registry);
        let bug = graph
            .upsert_node("BugzillaBug", json!({"id": "12345", "status": "CLOSED"}))
            .unwrap();
        let commit = graph.upsert_node("DistGitCommit", json!({"hash": "8a63adb"})).unwrap();
        let build = graph
            .upsert_node("KojiBuild", json!({"id": "2345", "name": "slf4j"}))
            .unwrap();
        graph.connect(&commit, "RESOLVED", &bug).unwrap();
        graph.connect(&build, "BUILT_FROM", &commit).unwrap();
        app_with(Arc::new(graph))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(app(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_all_stories() {
        let (status, body) = get(app(), "/api/v1/allstories/bugzillabug/12345").await;
        assert_eq!(status, StatusCode::OK);

        let stories = body.as_array().unwrap();
        assert_eq!(stories.len(), 1);
        let data = stories[0]["data"].as_array().unwrap();
        let types: Vec<&str> = data.iter().map(|n| n["resource_type"].as_str().unwrap()).collect();
        assert_eq!(types, ["BugzillaBug", "DistGitCommit", "KojiBuild"]);
        // Seed is expanded by default
        assert!(data[0].get("resolved_by_commits").is_some());
        assert!(data[2].get("commit").is_none());
        assert_eq!(stories[0]["meta"]["related_nodes"]["Advisory"], json!(0));
    }

    #[tokio::test]
    async fn test_node() {
        let (status, body) = get(app(), "/api/v1/KojiBuild/2345").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resource_type"], json!("KojiBuild"));
        assert_eq!(body["commit"]["hash"], json!("8a63adb"));
        assert_eq!(body["advisories"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_type_and_id_are_not_found() {
        let (status, body) = get(app(), "/api/v1/allstories/widget/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("widget"));

        let (status, _) = get(app(), "/api/v1/allstories/kojibuild/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_failures_map_to_retryable_statuses() {
        let registry = Arc::new(SchemaRegistry::builtin().unwrap());

        let down = app_with(Arc::new(FailingPort {
            registry: registry.clone(),
            failure: Failure::Down,
        }));
        let (status, _) = get(down, "/api/v1/allstories/kojibuild/1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let stalled = app_with(Arc::new(FailingPort {
            registry,
            failure: Failure::Stall,
        }));
        let (status, body) = get(stalled, "/api/v1/kojibuild/1").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].is_string());
    }
}
