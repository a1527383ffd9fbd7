//! # wiki-vault CLI
//!
//! Command-line interface for the self-hosted Obsidian-vault wiki
//! server: project scaffolding, the live dev server, and a one-shot
//! lexical search for scripts/agents.

mod collaborators;
mod commands;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wiki_core::Config;

#[derive(Parser)]
#[command(name = "wiki-vault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "wiki.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new wiki-vault project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Run the live dev server (content pipeline, watcher, search, embeddings)
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// One-shot lexical search over the vault
    Search {
        /// Search query
        query: String,

        /// Maximum results per category (title/heading)
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_vault(path.as_deref()),
        Commands::Serve { port } => {
            let mut config = Config::from_file(&cli.config)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            commands::serve(&config).await
        }
        Commands::Search { query, limit, json } => {
            commands::search_vault(&cli.config, &query, commands::SearchOptions { limit, json })
        }
    }
}
