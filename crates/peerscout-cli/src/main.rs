//! Peerscout CLI — query Electrum servers and list the peers they know.
//!
//! Subcommands: init, peers, request.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::PeerscoutConfig;

/// Peerscout — Electrum peer discovery.
#[derive(Parser, Debug)]
#[command(name = "peerscout", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "peerscout.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// List the peers a node advertises.
    Peers(commands::peers::PeersArgs),
    /// Send a single JSON-RPC request and print the response line.
    Request(commands::request::RequestArgs),
}

fn init_tracing(config: &PeerscoutConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = PeerscoutConfig::load(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    init_tracing(&config);

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Peers(args) => commands::peers::run(args, &config).await,
        Commands::Request(args) => commands::request::run(args, &config).await,
    }
}
