pub mod aggregate;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod tracker;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{EtlConfig, DEFAULT_SOURCE_DIR, DEFAULT_STORE_PATH};
use crate::pipeline::{EtlPipeline, RunOutcome};
use crate::report::GraphSummary;
use crate::tracker::CompletenessTracker;

/// Runs the cricket import command line interface.
pub async fn run_cli() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = EtlConfig::new(&cli.paths.source_dir, &cli.paths.base_path).with_force(cli.paths.force);
    match cli.command.unwrap_or(Command::Import) {
        Command::Import => run_import(config).await?,
        Command::Status => run_status(config).await?,
        Command::H2h { team1, team2 } => run_head_to_head(config, &team1, &team2).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    paths: PathArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct PathArgs {
    /// Directory holding one JSON file per match
    #[arg(long, global = true, env = "CRICKET_JSON_FOLDER", default_value = DEFAULT_SOURCE_DIR)]
    source_dir: PathBuf,
    /// Base directory for the graph, catalog and log files
    #[arg(long, global = true, env = "CRICKET_STORE_PATH", default_value = DEFAULT_STORE_PATH)]
    base_path: PathBuf,
    /// Run even if the previous run makes this one look redundant
    #[arg(long, global = true, default_value_t = false)]
    force: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Imports new matches and recomputes statistics (default)
    Import,
    /// Prints graph counts and match completeness
    Status,
    /// Prints the head-to-head record of two franchises
    H2h { team1: String, team2: String },
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_import(config: EtlConfig) -> anyhow::Result<()> {
    info!(source = %config.source_dir.display(), store = %config.storage.base_path.display(), "Starting import");
    let pipeline = EtlPipeline::open(config).await?;
    let outcome = pipeline.run().await?;
    if let RunOutcome::Completed(summary) = &outcome {
        if summary.failed > 0 {
            info!(
                failed = summary.failed,
                log = %pipeline.store().error_log.path().display(),
                "Some matches failed; see the error log"
            );
        }
    }
    print_json(&outcome)
}

#[derive(Serialize)]
struct StatusReport {
    graph: GraphSummary,
    partial_matches: Vec<String>,
}

async fn run_status(config: EtlConfig) -> anyhow::Result<()> {
    let pipeline = EtlPipeline::open(config).await?;
    let graph = Arc::clone(&pipeline.store().graph);
    let status = StatusReport {
        graph: report::summary(graph.as_ref())?,
        partial_matches: CompletenessTracker::new(graph).partial_match_ids()?,
    };
    print_json(&status)
}

async fn run_head_to_head(config: EtlConfig, team1: &str, team2: &str) -> anyhow::Result<()> {
    let pipeline = EtlPipeline::open(config).await?;
    let graph = pipeline.store().graph.as_ref();
    let summary = report::head_to_head(graph, team1, team2)?;
    let matches = report::head_to_head_matches(graph, team1, team2)?;
    print_json(&serde_json::json!({ "summary": summary, "matches": matches }))
}
