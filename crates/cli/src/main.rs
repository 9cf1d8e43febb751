//! deskmind CLI: the main entry point.
//!
//! Commands:
//! - `serve` : Start the HTTP API for the desktop shell
//! - `chat`  : Interactive or single-message chat
//! - `tools` : List available tools
//! - `index` : Add files to the document index
//! - `query` : Ask the document index directly
//! - `stats` : Show document index statistics
//! - `clear` : Remove everything from the document index

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "deskmind",
    about = "deskmind — local LLM agent with tools and document retrieval",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.deskmind/config.toml
    #[arg(short, long, global = true, env = "DESKMIND_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Model to use instead of the configured default
        #[arg(long)]
        model: Option<String>,

        /// Answer from the document index when possible
        #[arg(long)]
        rag: bool,
    },

    /// List available tools
    Tools,

    /// Index files into the document index
    Index {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Ask the document index a question
    Query {
        question: String,

        /// Extra context prepended to the question
        #[arg(long)]
        context: Option<String>,
    },

    /// Show document index statistics
    Stats,

    /// Clear the document index
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Chat {
            message,
            model,
            rag,
        } => commands::chat::run(config, message, model, rag).await?,
        Commands::Tools => commands::tools::run(config).await?,
        Commands::Index { paths } => commands::index::index(config, paths).await?,
        Commands::Query { question, context } => {
            commands::index::query(config, question, context).await?
        }
        Commands::Stats => commands::index::stats(config).await?,
        Commands::Clear => commands::index::clear(config).await?,
    }

    Ok(())
}
