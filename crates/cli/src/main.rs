//! toolrun CLI — the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive session or single-query mode
//! - `tools`  — List the built-in tools
//! - `doctor` — Diagnose configuration and resources

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "toolrun",
    about = "toolrun — tool-using assistant runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single query instead of entering interactive mode
        #[arg(short, long)]
        query: Option<String>,

        /// Resume a session by id (within its retention window)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// List the built-in tools
    Tools,

    /// Diagnose configuration and resources
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { query, session } => commands::chat::run(query, session).await?,
        Commands::Tools => commands::tools_cmd::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
