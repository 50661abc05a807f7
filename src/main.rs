mod analysis;
mod config;
mod enrich;
mod error;
mod models;
mod report;
mod runner;
mod text;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use analysis::{SourceReader, analyze, extract_failures, unanalyzed_entries};
use config::Config;
use enrich::{ChatEnricher, DisabledEnricher, Enricher, enrich_all};
use runner::{PlaywrightRunner, ReportSource, SavedReport};

/// Classify failed end-to-end browser tests and suggest fixes.
#[derive(Parser)]
#[command(name = "triage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root containing the tests and `triage.toml`
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Config file (defaults to `<workspace>/triage.toml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Markdown report path
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Also write the full report as JSON
    #[arg(long, global = true)]
    json: Option<PathBuf>,

    /// Skip the language-model enrichment step
    #[arg(long, global = true)]
    no_enrich: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite and triage its failures
    Run {
        /// Extra arguments passed through to the test command
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Triage a previously saved JSON report
    Analyze {
        /// Path to the reporter's JSON output
        report: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let workspace = match cli.workspace {
        Some(ref dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let config = match cli.config {
        Some(ref path) => Config::load_from(path),
        None => Config::load(&workspace),
    };

    let source: Box<dyn ReportSource> = match cli.command {
        Commands::Run { ref args } => Box::new(
            PlaywrightRunner::new(
                workspace.clone(),
                &config.runner.command,
                args,
                config.runner.timeout_secs,
            )
            .context("invalid runner configuration")?,
        ),
        Commands::Analyze { ref report } => Box::new(SavedReport::new(resolve(&workspace, report))),
    };

    // Upstream failure is the only fatal outcome.
    let run_report = source
        .collect()
        .await
        .with_context(|| format!("{} did not produce a test report", source.name()))?;
    for error in &run_report.errors {
        warn!(
            "run-level error: {}",
            error.message.as_deref().unwrap_or("unknown")
        );
    }

    let raw = extract_failures(&run_report);
    for (name, status) in unanalyzed_entries(&run_report) {
        warn!("{} ended {:?} and will not be analyzed", name, status);
    }
    info!("{} failed test(s) to analyze", raw.len());

    let reader = SourceReader::new(workspace.clone(), config.source.roots.clone());
    let analyses = raw.into_iter().map(|r| analyze(r, &reader)).collect();

    let enricher = build_enricher(&config, cli.no_enrich);
    let analyses = enrich_all(analyses, enricher.as_ref(), config.enrichment.concurrency).await;

    let report = report::assemble(analyses, run_report.summary());

    let output = resolve(&workspace, cli.output.as_ref().unwrap_or(&config.report.output));
    report.write_markdown(&output, config.report.max_error_chars)?;
    if let Some(json) = cli.json.as_ref().or(config.report.json.as_ref()) {
        report.write_json(&resolve(&workspace, json))?;
    }

    report::console::print_summary(&report, enricher.is_active());
    println!();
    println!("Report written to {}", output.display());
    Ok(())
}

/// Enrichment runs only with a credential present and not switched off.
fn build_enricher(config: &Config, disabled: bool) -> Box<dyn Enricher> {
    if disabled {
        return Box::new(DisabledEnricher);
    }
    let Some(api_key) = config.enrichment.api_key() else {
        info!(
            "{} not set, enrichment disabled",
            config.enrichment.api_key_env
        );
        return Box::new(DisabledEnricher);
    };
    match ChatEnricher::new(&config.enrichment, api_key) {
        Ok(enricher) => Box::new(enricher),
        Err(e) => {
            warn!("enrichment unavailable: {}", e);
            Box::new(DisabledEnricher)
        }
    }
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}
