//! Docent CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive chat or single-question mode
//! - `tools`   — List the document tools the model can call
//! - `doctor`  — Diagnose configuration and document corpora

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "docent",
    about = "Docent — answers questions from your documentation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.docent/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the documentation assistant
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List the document tools
    Tools,

    /// Diagnose configuration and document corpora
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Chat { message } => commands::chat::run(config_path, message).await?,
        Commands::Tools => commands::tools::run(config_path)?,
        Commands::Doctor => commands::doctor::run(config_path)?,
    }

    Ok(())
}
