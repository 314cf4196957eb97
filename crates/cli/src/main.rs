//! medplan CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write the default config
//! - `plan`      — Build a medication plan from a drug list
//! - `identify`  — Identify a drug from label text
//! - `doctor`    — Diagnose configuration and upstream reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "medplan",
    about = "medplan — medication plans from drug interactions and generated guidance",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Build a medication plan
    Plan {
        /// JSON file holding a list of drugs, or `-` for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Write the plan here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Identify a drug from the text of its label
    Identify {
        /// File with one line of label text per line
        #[arg(short, long, conflicts_with = "line")]
        file: Option<PathBuf>,

        /// A line of label text (repeatable)
        #[arg(short, long)]
        line: Vec<String>,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Plan { input, output } => commands::plan::run(input, output).await?,
        Commands::Identify { file, line } => commands::identify::run(file, line).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
