// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::alert_factory::AlertFactory;
use crate::application::key_value_store::KeyValueStore;
use crate::application::monitor_service::PlantMonitor;
use crate::application::reading_source::ReadingSource;
use crate::application::scheduler::{spawn_poller, spawn_sweeper};
use crate::infrastructure::config::{StorageBackend, load_monitor_config};
use crate::infrastructure::file_store::FileStore;
use crate::infrastructure::http_reading_source::HttpReadingSource;
use crate::infrastructure::memory_store::MemoryStore;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration; invalid thresholds are fatal
    let config = load_monitor_config().context("Invalid plant monitor configuration")?;
    let plants = config.plants();
    tracing::info!("Monitoring {} plants", plants.len());

    // Create adapters (infrastructure layer)
    let storage: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::File => {
            let store = FileStore::open(&config.storage.directory)?;
            tracing::info!("Persisting alerts under {}", store.directory().display());
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory alert storage; alerts are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let readings: Arc<dyn ReadingSource> = Arc::new(HttpReadingSource::new(
        config.api.base_url.clone(),
        std::time::Duration::from_secs(config.api.timeout_secs),
    )?);

    // Create the monitor (application layer)
    let factory = AlertFactory::new(config.critical_deltas(), config.message_table()?);
    let retention = config.schedule.retention();
    let (monitor, handle) = PlantMonitor::new(plants, storage, factory, retention);
    let monitor_task = monitor.spawn();

    let poller = spawn_poller(handle.clone(), readings.clone(), config.schedule.poll_interval());
    let sweeper = spawn_sweeper(handle.clone(), config.schedule.sweep_interval());

    // Build router (presentation layer)
    let state = Arc::new(AppState {
        monitor: handle,
        readings,
    });
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting plant-monitor service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Timers hold monitor handles; stop them so the monitor drains and exits
    poller.abort();
    sweeper.abort();
    let _ = monitor_task.await;
    tracing::info!("Shut down cleanly");

    Ok(())
}
