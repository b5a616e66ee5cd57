use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tally::config::{Config, LoadOutcome};
use tally::counter::{CounterAggregator, KeyNamer};
use tally::pixel;
use tally::storage::{connect_with_retry, CounterStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "tally", about = "Embeddable site and page visit counter")]
struct Cli {
    /// Path to the YAML configuration file, created with defaults if missing
    #[arg(short, long, env = "TALLY_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Keep counters in process memory instead of Redis
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config)? {
        LoadOutcome::Loaded(config) => config,
        LoadOutcome::Bootstrapped(path) => {
            info!(
                "Created default configuration at {}, edit it and run again",
                path.display()
            );
            return Ok(());
        }
    };
    info!("Loaded configuration from {}", cli.config.display());

    // Initialize storage
    let store: Arc<dyn CounterStore> = if cli.memory {
        warn!("Using in-memory counter store, counts are lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(connect_with_retry(&config.redis).await?)
    };

    let keys = KeyNamer::new(&config.redis.prefix);
    info!("Counter keys use prefix {:?}", keys.prefix());

    let router = pixel::create_pixel_router(
        CounterAggregator::new(store, keys),
        config.client_ip.clone(),
        config.callback.clone(),
    );

    let listener = tokio::net::TcpListener::bind(&config.listening)
        .await
        .with_context(|| format!("failed to bind {}", config.listening))?;
    info!("🚀 Counter listening on http://{}", config.listening);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
