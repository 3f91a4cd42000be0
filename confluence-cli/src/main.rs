//! Confluence CLI — evaluate candle bundles and inspect the engine configuration.
//!
//! Commands:
//! - `evaluate` — score a batch input file and print the cycle report as JSON
//! - `config` — print the effective configuration as TOML
//!
//! Logs go to stderr (`RUST_LOG`, default `info`) so stdout stays clean JSON.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use confluence_runner::{load_batch, load_config_or_default, BatchInput, Pipeline};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence — multi-timeframe trading signal engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every symbol in a batch input and print one final signal per symbol.
    Evaluate {
        /// Batch input JSON (`{"symbols": [...]}` or a bare array). `-` reads stdin.
        #[arg(long)]
        input: PathBuf,

        /// TOML config file. Defaults to the built-in thresholds.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Include every scorer's signal in the report.
        #[arg(long, default_value_t = false)]
        include_scorers: bool,

        /// Pretty-print the JSON report.
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// TOML config file to validate and print. Defaults to the built-in thresholds.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            input,
            config,
            output,
            include_scorers,
            pretty,
        } => run_evaluate(&input, config.as_deref(), output.as_deref(), include_scorers, pretty),
        Commands::Config { config } => run_config(config.as_deref()),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init()
}

fn run_evaluate(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    include_scorers: bool,
    pretty: bool,
) -> Result<()> {
    let config = load_config_or_default(config)?;
    let pipeline = Pipeline::new(config).context("Failed to build pipeline")?;
    info!(
        scorers = ?pipeline.scorer_names(),
        config_hash = %pipeline.config_hash(),
        "pipeline ready"
    );

    let batch = read_batch(input)?;
    info!(symbols = batch.len(), "batch loaded");

    let report = pipeline.evaluate_batch(&batch, include_scorers);
    let json = report.to_json(pretty).context("Failed to serialize report")?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn read_batch(input: &Path) -> Result<BatchInput> {
    if input.as_os_str() == "-" {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("Failed to read batch from stdin")?;
        Ok(BatchInput::from_json_str(&json)?)
    } else {
        Ok(load_batch(input)?)
    }
}

fn run_config(config: Option<&Path>) -> Result<()> {
    let config = load_config_or_default(config)?;
    let toml = config.to_toml_string().context("Failed to serialize config")?;
    info!(fingerprint = %config.fingerprint(), "effective config");
    print!("{toml}");
    Ok(())
}
