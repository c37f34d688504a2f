pub mod config;
pub mod diagnostics;
pub mod graph;
pub mod schema;
pub mod serialize;
pub mod service;
pub mod shape;
pub mod story;

pub use config::Config;
pub use diagnostics::{DiagnosticsSink, RecordingDiagnostics, TracingDiagnostics};
pub use graph::{GraphError, GraphPort, GraphSession, MemoryGraph, SurrealGraph};
pub use schema::{SchemaError, SchemaRegistry};
pub use service::{open_store, ServiceOptions, StoryService};
pub use shape::{ExpandSet, StoryEnvelope};
pub use story::{Story, StoryResolver, TemplateSet};
