//! flowkit command line
//!
//! Validates and rearranges stored flow documents, and fetches trigger
//! catalogs through the same cache the editor uses.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowkit::{
    catalog::{HttpCatalogLoader, TriggerCatalog},
    config::Config,
    flow::{is_save_eligible, validate, FlowDocument, FlowGraph},
    layout::LayoutEngine,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowkit", version, about = "Flow graph tooling for automation editors")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every node's required fields; exits with 1 when issues are found
    Validate {
        /// Flow document (JSON)
        file: PathBuf,
    },
    /// Recompute node positions
    Rearrange {
        /// Flow document (JSON)
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch the trigger catalog for a channel
    Catalog {
        /// Channel name or alias, e.g. "instagram" or "ig"
        channel: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::default();

    match cli.command {
        Command::Validate { file } => {
            let (document, graph) = load_flow(&file).await?;
            let issues = validate(&graph);
            println!("{}", serde_json::to_string_pretty(&issues)?);

            if is_save_eligible(&issues) {
                tracing::info!("✅ Flow '{}' is ready to save", document.name);
                Ok(ExitCode::SUCCESS)
            } else {
                tracing::warn!("❌ Flow '{}' has {} nodes with missing fields", document.name, issues.len());
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Rearrange { file, output } => {
            let (document, mut graph) = load_flow(&file).await?;
            let engine = LayoutEngine::new(config.layout);
            tracing::debug!("📏 Layout spacing: {:?}", engine.config());
            graph.rearrange(&engine);

            let rendered = graph.to_document(document.name, document.categories).to_json_pretty()?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("💾 Wrote rearranged flow to {}", path.display());
                }
                None => println!("{}", rendered),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Catalog { channel } => {
            let loader = HttpCatalogLoader::new(&config.catalog)?;
            let catalog = TriggerCatalog::new(&config.cache, loader);

            let entries = catalog.get(&channel).await;
            if entries.is_empty() {
                tracing::warn!("📭 No triggers available for '{}'", catalog.normalize(&channel));
            }
            println!("{}", serde_json::to_string_pretty(&*entries)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn load_flow(path: &Path) -> Result<(FlowDocument, FlowGraph)> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document =
        FlowDocument::from_json(&raw).with_context(|| format!("Invalid flow document {}", path.display()))?;

    let graph = FlowGraph::from_document(document.clone())?;
    tracing::info!(
        "📋 Loaded flow '{}' with {} nodes and {} edges",
        document.name,
        graph.len(),
        graph.edges().len()
    );
    Ok((document, graph))
}
