use std::sync::Arc;

use parcel_tracker::clock::SystemClock;
use parcel_tracker::config::{Config, StorageBackend};
use parcel_tracker::error::AppError;
use parcel_tracker::state::AppState;
use parcel_tracker::store::snapshot;
use parcel_tracker::{api, engine};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let records = match &config.storage {
        StorageBackend::File(path) => snapshot::load(path).await?,
        StorageBackend::Memory => {
            tracing::warn!("DATABASE_URL not set to a file; parcels live in memory only");
            Vec::new()
        }
    };

    let snapshot_path = match &config.storage {
        StorageBackend::File(path) => Some(path.clone()),
        StorageBackend::Memory => None,
    };
    let http_port = config.http_port;

    let (app_state, snapshot_rx) = AppState::new(config, Arc::new(SystemClock), records);
    let shared_state = Arc::new(app_state);

    let writer = match (snapshot_path.clone(), snapshot_rx) {
        (Some(path), Some(rx)) => Some(tokio::spawn(engine::snapshot::run_snapshot_writer(
            shared_state.clone(),
            path,
            rx,
        ))),
        _ => None,
    };

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{http_port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port, parcels = shared_state.store.len(), "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    if let Some(path) = snapshot_path {
        engine::snapshot::flush_on_shutdown(&shared_state, &path, writer).await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
