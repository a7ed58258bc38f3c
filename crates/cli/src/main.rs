//! Folio CLI — the main entry point.
//!
//! Commands:
//! - `chat`      — Interactive chat with the portfolio assistant
//! - `ask`       — Answer a single question
//! - `documents` — List the retrieval corpus built from the profile
//! - `serve`     — Start the HTTP gateway
//! - `config`    — Show, create or locate the config file
//! - `doctor`    — Diagnose configuration, profile and providers

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio — a portfolio assistant that answers questions about one profile",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.folio/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use this profile JSON instead of the configured one
    #[arg(long, global = true)]
    profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the portfolio assistant
    Chat,

    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,

        /// Print the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the documents built from the profile
    Documents {
        /// Print the documents as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Diagnose configuration, profile and providers
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so answers on stdout stay clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let overrides = commands::Overrides {
        config: cli.config,
        profile: cli.profile,
    };

    match cli.command {
        Commands::Chat => commands::chat::run(&overrides).await?,
        Commands::Ask { question, json } => commands::ask::run(&overrides, &question, json).await?,
        Commands::Documents { json } => commands::documents::run(&overrides, json)?,
        Commands::Serve { port, host } => commands::serve::run(&overrides, port, host).await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show(&overrides)?,
            ConfigAction::Init { force } => commands::config_cmd::init(&overrides, force)?,
            ConfigAction::Path => commands::config_cmd::path(&overrides),
        },
        Commands::Doctor => commands::doctor::run(&overrides).await?,
    }

    Ok(())
}
