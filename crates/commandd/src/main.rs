//! commandd - HTTP service for how-to command records

use anyhow::{Context, Result};
use clap::Parser;
use command_common::config::{config_path, CommandApiConfig};
use commandd::repo;
use commandd::server::{self, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "commandd", version, about = "Command records over HTTP")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value_os_t = config_path())]
    config: PathBuf,

    /// Override the listen address (host:port)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = CommandApiConfig::load_from(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .init();

    info!("commandd v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Store backend: {}", config.database.backend.as_str());

    let store = repo::open_store(&config.database)
        .await
        .context("Failed to open command store")?;

    server::run(
        AppState::new(store),
        &config.server.bind_address,
        config.server.max_body_bytes,
    )
    .await
}
