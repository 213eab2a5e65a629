use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use beacon_poller::{HttpProber, Scheduler, SnapshotHub, StoreSink};
use beacon_state::StateStore;

use crate::config::BeaconConfig;

const DB_FILE: &str = "beacon.redb";

/// Open (creating if needed) the state database under `data_dir`.
pub fn open_store(data_dir: &Path) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join(DB_FILE);
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}

pub fn migrate(data_dir: &Path) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let services = store.list_services()?;
    info!(services = services.len(), "state database is up to date");
    Ok(())
}

pub async fn run_daemon(config: BeaconConfig) -> anyhow::Result<()> {
    info!("Beacon daemon starting");

    let store = open_store(&config.server.data_dir)?;

    // ── Poller ─────────────────────────────────────────────────

    let hub = SnapshotHub::default();
    let sink = Arc::new(StoreSink::new(store.clone(), hub.clone()));
    let prober = HttpProber::new(config.poller.probe_config());
    let scheduler = Scheduler::new(Arc::new(store.clone()), prober, sink, &config.poller);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller_handle = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    // ── API server ─────────────────────────────────────────────

    let router = beacon_api::build_router(store, hub);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    if let Err(e) = poller_handle.await {
        error!(error = %e, "poll scheduler task failed");
    }

    info!("Beacon daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");

        migrate(&data_dir).unwrap();
        assert!(data_dir.join(DB_FILE).exists());

        // Idempotent on an existing database.
        let store = open_store(&data_dir).unwrap();
        store.create_service("api", "http://api.test").unwrap();
        drop(store);
        migrate(&data_dir).unwrap();
        assert_eq!(open_store(&data_dir).unwrap().list_services().unwrap().len(), 1);
    }
}
