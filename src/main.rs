//! macgate daemon: load config, open the store, serve RADIUS until told to
//! stop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use macgate::config::load_config;
use macgate::decision::DecisionEngine;
use macgate::lifecycle::{signals, Shutdown};
use macgate::observability;
use macgate::radius::RadiusServer;
use macgate::store::{DeviceStore, SqliteStore};

#[derive(Parser)]
#[command(name = "macgate")]
#[command(about = "MAC address allow-list RADIUS responder", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "macgate.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Fail fast: an unreadable or invalid config never serves traffic.
    let config = load_config(&args.config)?;

    observability::logging::init(&config.observability.log_level);
    tracing::info!(config = %args.config.display(), "macgate v0.1.0 starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = SqliteStore::connect(&config.database).await?;
    store.health_check().await?;
    tracing::info!(
        backend = store.backend_name(),
        url = %config.database.url,
        "permission store ready"
    );

    let store: Arc<dyn DeviceStore> = Arc::new(store);
    let engine = Arc::new(DecisionEngine::new(
        store,
        Duration::from_millis(config.database.lookup_timeout_ms),
    ));

    // The listener starts last: traffic only once everything under it is up.
    let server = RadiusServer::bind(&config.radius, engine).await?;

    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    server.run(shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
