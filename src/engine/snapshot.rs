use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::snapshot;

pub async fn run_snapshot_writer(
    state: Arc<AppState>,
    path: PathBuf,
    mut snapshot_rx: mpsc::Receiver<()>,
) {
    info!(path = %path.display(), "snapshot writer started");

    while snapshot_rx.recv().await.is_some() {
        while snapshot_rx.try_recv().is_ok() {}

        let _guard = state.snapshot_lock.lock().await;
        let records = state.store.snapshot();
        let parcels = records.len();
        match snapshot::save(&path, records).await {
            Ok(()) => {
                state
                    .metrics
                    .snapshot_writes_total
                    .with_label_values(&["success"])
                    .inc();
                debug!(parcels, "snapshot written");
            }
            Err(err) => {
                state
                    .metrics
                    .snapshot_writes_total
                    .with_label_values(&["error"])
                    .inc();
                error!(error = %err, "failed to write snapshot");
            }
        }
    }

    warn!("snapshot writer stopped: queue channel closed");
}

/// Stops the writer task before the final save so the two never share the temp file.
pub async fn flush_on_shutdown(
    state: &AppState,
    path: &Path,
    writer: Option<JoinHandle<()>>,
) -> Result<(), AppError> {
    let _guard = state.snapshot_lock.lock().await;

    if let Some(writer) = writer {
        writer.abort();
        let _ = writer.await;
    }

    snapshot::save(path, state.store.snapshot()).await?;
    info!(path = %path.display(), "final snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::{flush_on_shutdown, run_snapshot_writer};
    use crate::clock::SystemClock;
    use crate::config::{Config, StorageBackend};
    use crate::engine::queue::request_snapshot;
    use crate::models::parcel::Parcel;
    use crate::state::AppState;
    use crate::store::{ParcelRecord, snapshot};

    #[tokio::test]
    async fn shutdown_stops_writer_then_saves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parcels.json");
        let config = Config {
            storage: StorageBackend::File(path.clone()),
            ..Config::default()
        };

        let (state, rx) = AppState::new(config, Arc::new(SystemClock), Vec::new());
        let state = Arc::new(state);
        let writer = tokio::spawn(run_snapshot_writer(
            state.clone(),
            path.clone(),
            rx.unwrap(),
        ));

        for n in 0..20 {
            let parcel = Parcel::new(
                format!("1Z{n:016}"),
                "Berlin, Germany".to_string(),
                "Tokyo, Japan".to_string(),
                Vec::new(),
                Utc::now(),
            );
            state.store.insert(ParcelRecord::new(parcel)).unwrap();
            request_snapshot(&state).unwrap();
        }

        flush_on_shutdown(&state, &path, Some(writer)).await.unwrap();

        let records = snapshot::load(&path).await.unwrap();
        assert_eq!(records.len(), 20);
        assert!(!path.with_file_name("parcels.json.tmp").exists());
    }
}
