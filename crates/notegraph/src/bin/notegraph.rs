//! notegraph binary
//!
//! Run with: cargo run -p notegraph -- --input unstructured --output structured

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notegraph::generation::ChatClient;
use notegraph::providers::{LlmProvider, ModelRole};
use notegraph::{NotesConfig, Pipeline, RunSummary};

const DEFAULT_CONFIG: &str = "notegraph.toml";

/// Turn a folder of documents into linked Markdown notes.
#[derive(Parser)]
#[command(name = "notegraph", version, about)]
struct Cli {
    /// Configuration file (default: ./notegraph.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with source documents
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory where notes are written
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Skip translation and use extracted text as-is
    #[arg(long)]
    no_translate: bool,

    /// Log filter, e.g. "notegraph=debug" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Log file written alongside stderr output
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(input) = cli.input {
        config.paths.input_dir = input;
    }
    if let Some(output) = cli.output {
        config.paths.output_dir = output;
    }
    if let Some(batch_size) = cli.batch_size {
        config.chunking.batch_size = batch_size;
    }
    if cli.no_translate {
        config.translation.enabled = false;
    }
    if let Some(log_file) = cli.log_file {
        config.logging.file = Some(log_file);
    }

    init_tracing(&config, cli.log_level.as_deref())?;

    config.validate().context("invalid configuration")?;
    let api_key = config.api_key()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Input: {}", config.paths.input_dir.display());
    tracing::info!("  - Output: {}", config.paths.output_dir.display());
    tracing::info!("  - Batch size: {}", config.chunking.batch_size);
    tracing::info!("  - Translation: {}", if config.translation.enabled { "on" } else { "off" });

    let client = ChatClient::new(&config.llm, api_key).context("failed to build HTTP client")?;
    tracing::info!("  - Topics model: {}", client.model(ModelRole::Topics));
    tracing::info!("  - Writing model: {}", client.model(ModelRole::Writing));

    if !client.health_check().await.unwrap_or(false) {
        tracing::warn!("Generation API at {} did not answer the health check", config.llm.base_url);
    }

    let provider: Arc<dyn LlmProvider> = Arc::new(client);
    let mut pipeline = Pipeline::new(config, provider).context("failed to start pipeline")?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .context("invalid progress template")?,
    );
    progress.set_message("Documents");

    let summary = pipeline
        .run_with_progress(|_, total| {
            progress.set_length(total as u64);
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    let summary = summary.context("run failed")?;
    print_summary(&summary, pipeline.registry().len());
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<NotesConfig> {
    match path {
        Some(path) => NotesConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None if PathBuf::from(DEFAULT_CONFIG).is_file() => {
            NotesConfig::from_file(DEFAULT_CONFIG).context("failed to load notegraph.toml")
        }
        None => Ok(NotesConfig::default()),
    }
}

fn init_tracing(config: &NotesConfig, level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.logging.level.as_str().into()),
    };

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn print_summary(summary: &RunSummary, known_notes: usize) {
    println!();
    println!("{}", style("Run complete").bold().green());
    println!(
        "  Documents: {} processed, {} aborted, {} duplicate",
        summary.documents_processed, summary.documents_aborted, summary.documents_duplicate
    );
    println!(
        "  Chunks:    {} ({} failed)",
        summary.chunks, summary.chunk_failures
    );
    println!(
        "  Notes:     {} written, {} skipped, {} failed",
        style(summary.notes_written).bold(),
        summary.notes_skipped,
        summary.note_failures
    );
    if summary.dangling_links > 0 {
        println!(
            "  {}",
            style(format!("{} wikilink(s) point at missing notes", summary.dangling_links)).yellow()
        );
    }
    println!("  Vault now holds {} note(s)", known_notes);
}
