#![deny(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "codescale",
    about = "Score, rank and review generated Python code",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a single Python file (`-` reads stdin).
    Evaluate(EvaluateArgs),

    /// Score and rank a batch of candidates from a JSON file or a directory of `.py` files.
    Batch(BatchArgs),

    /// List potential issues in a Python file (`-` reads stdin).
    Issues(IssuesArgs),

    /// Show the effective metric weights.
    Weights(WeightsArgs),
}

#[derive(Args)]
struct ScoringArgs {
    /// Metric priority, highest first, e.g. `--priority time_complexity,readability`.
    #[arg(long, value_delimiter = ',')]
    priority: Option<Vec<String>>,

    /// Weight configuration file (default: ./codescale.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Python file to evaluate, or `-` for stdin.
    path: PathBuf,

    #[command(flatten)]
    scoring: ScoringArgs,

    /// Output format: pretty, text, or json.
    #[arg(long, default_value = "pretty")]
    format: String,
}

#[derive(Args)]
struct BatchArgs {
    /// JSON batch file, or a directory whose `.py` files become candidates.
    path: PathBuf,

    /// Prompt recorded in the report (overrides the batch file's prompt).
    #[arg(long)]
    prompt: Option<String>,

    #[command(flatten)]
    scoring: ScoringArgs,

    /// Output format: pretty, text, or json.
    #[arg(long, default_value = "pretty")]
    format: String,

    /// Print each candidate result to stderr as a JSON line as soon as it is ready.
    #[arg(long)]
    stream: bool,
}

#[derive(Args)]
struct IssuesArgs {
    /// Python file to check, or `-` for stdin.
    path: PathBuf,

    /// Output format: pretty, text, or json.
    #[arg(long, default_value = "pretty")]
    format: String,
}

#[derive(Args)]
struct WeightsArgs {
    #[command(flatten)]
    scoring: ScoringArgs,

    /// Output format: pretty, text, or json.
    #[arg(long, default_value = "pretty")]
    format: String,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Evaluate(a) => commands::evaluate::run(
            &a.path,
            &a.format,
            a.scoring.priority.as_deref(),
            a.scoring.config.as_deref(),
        ),

        Command::Batch(a) => commands::batch::run(
            &a.path,
            a.prompt.as_deref(),
            a.scoring.priority,
            a.scoring.config.as_deref(),
            &a.format,
            a.stream,
        ),

        Command::Issues(a) => commands::issues::run(&a.path, &a.format),

        Command::Weights(a) => commands::weights::run(
            a.scoring.priority.as_deref(),
            a.scoring.config.as_deref(),
            &a.format,
        ),
    }
}
