//! Story service facade.
//!
//! Ties the registry, templates, graph port and diagnostics together behind
//! the two read operations the API exposes. Every call gets its own
//! [`GraphSession`] and runs under the request deadline; a timeout fails the
//! whole call rather than returning partial stories.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{StoreBackend, StoreConfig, StoryConfig, DEFAULT_FAN_OUT_CONCURRENCY};
use crate::diagnostics::DiagnosticsSink;
use crate::graph::{Fixture, GraphError, GraphPort, GraphSession, MemoryGraph, SurrealGraph};
use crate::schema::SchemaRegistry;
use crate::serialize::NodeSerializer;
use crate::shape::{ExpandSet, ResultShaper, StoryEnvelope};
use crate::story::{StoryResolver, TemplateSet};

/// Per-request limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Deadline for a whole request. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    pub fan_out_concurrency: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            request_timeout: None,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }
}

impl From<&StoryConfig> for ServiceOptions {
    fn from(config: &StoryConfig) -> Self {
        Self {
            request_timeout: Some(config.request_timeout()),
            fan_out_concurrency: config.fan_out_concurrency,
        }
    }
}

pub struct StoryService {
    port: Arc<dyn GraphPort>,
    resolver: StoryResolver,
    shaper: ResultShaper,
    options: ServiceOptions,
}

impl StoryService {
    /// `templates` must have been compiled against the port's registry.
    pub fn new(
        port: Arc<dyn GraphPort>,
        templates: Arc<TemplateSet>,
        diagnostics: Arc<dyn DiagnosticsSink>,
        options: ServiceOptions,
    ) -> Self {
        let serializer = Arc::new(NodeSerializer::new(Arc::clone(port.registry()), diagnostics));
        Self {
            resolver: StoryResolver::new(templates, options.fan_out_concurrency),
            shaper: ResultShaper::new(serializer),
            port,
            options,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.port.registry()
    }

    pub fn templates(&self) -> &TemplateSet {
        self.resolver.templates()
    }

    /// Every story the node takes part in, shaped for the wire.
    ///
    /// `resource` is matched case-insensitively. Without an explicit expand
    /// set only the seed's type is expanded.
    pub async fn all_stories(
        &self,
        resource: &str,
        id: &str,
        expand: Option<ExpandSet>,
    ) -> Result<Vec<StoryEnvelope>, GraphError> {
        let node_type = self.resolve_resource(resource)?;
        let expand = expand.unwrap_or_else(|| ExpandSet::only(&node_type));
        let session = self.session();

        self.bounded(async {
            let stories = self.resolver.resolve(&session, &node_type, id).await?;
            info!(resource = %node_type, id, stories = stories.len(), "Resolved stories");
            self.shaper.shape(&session, &stories, &expand).await
        })
        .await
    }

    /// A single node, expanded, with its resource type.
    pub async fn node(&self, resource: &str, id: &str) -> Result<Value, GraphError> {
        let node_type = self.resolve_resource(resource)?;
        let session = self.session();

        self.bounded(async {
            let node = session.get_node(&node_type, id).await?;
            self.shaper.shape_node(&session, &node).await
        })
        .await
    }

    fn resolve_resource(&self, resource: &str) -> Result<String, GraphError> {
        self.registry()
            .resolve_resource(resource)
            .map(|t| t.name().to_string())
            .ok_or_else(|| GraphError::UnknownType(resource.to_string()))
    }

    fn session(&self) -> GraphSession {
        GraphSession::new(Arc::clone(&self.port), self.options.request_timeout)
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, GraphError>>) -> Result<T, GraphError> {
        match self.options.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| GraphError::Timeout)?,
            None => call.await,
        }
    }
}

/// Open the graph store described by `config`.
///
/// A configured fixture is loaded into the store before it is returned.
pub async fn open_store(
    config: &StoreConfig,
    registry: Arc<SchemaRegistry>,
) -> Result<Arc<dyn GraphPort>, GraphError> {
    let fixture = config.fixture.as_deref().map(Fixture::load).transpose()?;

    match config.backend {
        StoreBackend::Memory => {
            let fixture = fixture.unwrap_or_default();
            let graph = MemoryGraph::from_fixture(registry, &fixture)?;
            info!(nodes = graph.node_count(), edges = graph.edge_count(), "Loaded in-memory graph");
            Ok(Arc::new(graph))
        }
        StoreBackend::Surreal => {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| GraphError::StoreUnavailable(format!("{}: {}", parent.display(), e)))?;
            }
            let graph = SurrealGraph::open(&config.path, &config.namespace, &config.database, registry).await?;
            graph.initialize_schema().await?;
            if let Some(fixture) = &fixture {
                graph.load_fixture(fixture).await?;
                info!(nodes = fixture.nodes.len(), edges = fixture.edges.len(), "Loaded fixture into store");
            }
            Ok(Arc::new(graph))
        }
    }
}
