use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tributary_core::config::LoggingConfig;
use tributary_core::{
    open_store, Config, ExpandSet, SchemaRegistry, ServiceOptions, StoryService, TemplateSet,
    TracingDiagnostics,
};

mod serve;

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Release artifact stories across bug, build and errata trackers", long_about = None)]
struct Cli {
    /// Config file to use instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
    },
    /// Print every story a node takes part in
    Stories {
        /// Resource type, e.g. kojibuild
        resource: String,
        /// External id of the node
        id: String,
        /// Comma separated resource types to expand
        #[arg(long)]
        expand: Option<String>,
    },
    /// Print a single node with its relationships
    Node {
        /// Resource type, e.g. advisory
        resource: String,
        /// External id of the node
        id: String,
    },
    /// Validate the schema and story templates
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            let service = build_service(&config).await?;
            serve::start_server(service, serve::ServeConfig::from(&config.server)).await?;
        }
        Commands::Stories {
            resource,
            id,
            expand,
        } => {
            let service = build_service(&config).await?;
            let expand = expand.as_deref().map(ExpandSet::from_csv);
            let stories = service.all_stories(&resource, &id, expand).await?;
            println!("{}", serde_json::to_string_pretty(&stories)?);
        }
        Commands::Node { resource, id } => {
            let service = build_service(&config).await?;
            let node = service.node(&resource, &id).await?;
            println!("{}", serde_json::to_string_pretty(&node)?);
        }
        Commands::Check => {
            let registry = SchemaRegistry::builtin()?;
            let templates = load_templates(&config, &registry)?;

            println!("Schema: {} node types", registry.len());
            for name in registry.type_names() {
                if let Some(node_type) = registry.get(name) {
                    println!(
                        "  {} ({} properties, {} relationships)",
                        name,
                        node_type.properties().len(),
                        node_type.relationships().len()
                    );
                }
            }

            println!("Templates: {}", templates.len());
            for template in templates.iter() {
                let steps: Vec<&str> = template.steps.iter().map(|s| s.node_type.as_str()).collect();
                println!("  {} [{}]: {}", template.name, template.seed_type, steps.join(" -> "));
            }
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output on stdout stays machine readable
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_templates(config: &Config, registry: &SchemaRegistry) -> Result<TemplateSet, Box<dyn std::error::Error>> {
    let templates = match &config.story.templates {
        Some(path) => TemplateSet::load(registry, path)?,
        None => TemplateSet::builtin(registry)?,
    };
    Ok(templates)
}

async fn build_service(config: &Config) -> Result<Arc<StoryService>, Box<dyn std::error::Error>> {
    let registry = Arc::new(SchemaRegistry::builtin()?);
    let templates = Arc::new(load_templates(config, &registry)?);
    let port = open_store(&config.store, registry).await?;

    Ok(Arc::new(StoryService::new(
        port,
        templates,
        Arc::new(TracingDiagnostics),
        ServiceOptions::from(&config.story),
    )))
}
