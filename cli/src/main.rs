use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use article_index::builder::{BuildOutcome, IndexBuilder};
use article_index::config::IndexSettings;
use article_index::indexer::article::delete_matching;
use article_index::search::elasticsearch::ElasticsearchEngine;
use article_index::search::engine::SearchEngine;
use article_index::search::query::Query;
use article_index::view::manager::ViewManager;

#[derive(Parser)]
#[command(name = "article-index")]
#[command(about = "Maintain the article view indexes", long_about = None)]
struct Args {
    /// Settings file (without extension); `article-index.*` when omitted
    #[arg(long, short, env = "ARTICLE_INDEX_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the default and live indexes
    Build {
        /// Drop and recreate indexes that already exist
        #[arg(long)]
        destroy: bool,
    },
    /// Delete every document from the default and live indexes
    Clear,
    /// Show whether each index exists and how many documents it holds
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "article_index=info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = IndexSettings::load(args.config.as_deref()).context("Failed to load settings")?;

    let engine: Arc<dyn SearchEngine> = Arc::new(
        ElasticsearchEngine::new(&settings).context("Failed to connect to Elasticsearch")?,
    );
    let builder = IndexBuilder::new()
        .with_manager("default", ViewManager::new(engine.clone(), settings.default_index.as_str()))
        .with_manager("live", ViewManager::new(engine, settings.live_index.as_str()));

    match args.command {
        Command::Build { destroy } => {
            for (name, outcome) in builder.build(destroy).await? {
                let verb = match outcome {
                    BuildOutcome::Created => "created",
                    BuildOutcome::Recreated => "dropped and recreated",
                    BuildOutcome::Untouched => "already exists, untouched",
                };
                println!("{name}: {verb}");
            }
        }
        Command::Clear => {
            for (name, manager) in builder.managers() {
                let summary =
                    delete_matching(manager, Query::MatchAll, settings.clear_page_size).await?;
                println!(
                    "{name}: deleted {} documents in {} pages",
                    summary.deleted, summary.pages_scanned
                );
            }
        }
        Command::Status => {
            let mut status = Vec::new();
            for (name, manager) in builder.managers() {
                let exists = manager.index_exists().await?;
                let documents = if exists {
                    Some(manager.count(&Query::MatchAll).await?)
                } else {
                    None
                };
                status.push(json!({
                    "manager": name,
                    "index": manager.name(),
                    "exists": exists,
                    "documents": documents,
                }));
            }
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
