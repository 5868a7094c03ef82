//! Stocktake API Server
//!
//! Run with: cargo run --bin stocktake -- [--config path/to/config.toml]
//!
//! Without `--config` the default locations are searched (see
//! [`Config::load_default`]). `STOCKTAKE_*` environment variables override
//! file settings and `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stocktake::api::{serve, AppState};
use stocktake::config::{Config, LoggingConfig};
use stocktake::storage::open_store;

#[derive(Parser)]
#[command(name = "stocktake")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inventory and sales tracking API server")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging)?;

    tracing::info!("Starting Stocktake API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = config.storage.backend.as_str(),
        fallback = config.storage.fallback_to_sample_data,
        "Storage configuration"
    );

    let store = open_store(&config.storage).context("Failed to open store")?;

    if let Err(e) = store.ping().await {
        tracing::warn!(error = %e, "Store did not answer the startup ping");
    }

    let state = AppState::new(store, config.api.clone(), config.variance.thresholds());
    serve(state).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("stocktake={},tower_http=info", logging.level))
    });
    let json = logging.format.eq_ignore_ascii_case("json");

    let file = match &logging.file {
        Some(path) => Some(Mutex::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?,
        )),
        None => None,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match (json, file) {
        (true, Some(file)) => registry.with(fmt::layer().json().with_writer(file)).init(),
        (true, None) => registry.with(fmt::layer().json()).init(),
        (false, Some(file)) => registry
            .with(fmt::layer().with_ansi(false).with_writer(file))
            .init(),
        (false, None) => registry.with(fmt::layer()).init(),
    }

    Ok(())
}
