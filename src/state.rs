use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

use crate::auth::session::SessionStore;
use crate::clock::Clock;
use crate::config::{Config, StorageBackend};
use crate::observability::metrics::Metrics;
use crate::store::{ParcelRecord, ParcelStore};

pub struct AppState {
    pub config: Config,
    pub store: ParcelStore,
    pub sessions: SessionStore,
    pub clock: Arc<dyn Clock>,
    pub rng: Mutex<StdRng>,
    pub snapshot_tx: Option<mpsc::Sender<()>>,
    /// Held for the duration of every snapshot write.
    pub snapshot_lock: AsyncMutex<()>,
    pub metrics: Metrics,
}

impl AppState {
    /// The receiver is only returned for file-backed storage; the caller owns
    /// spawning the snapshot writer for it.
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        records: Vec<ParcelRecord>,
    ) -> (Self, Option<mpsc::Receiver<()>>) {
        let (snapshot_tx, snapshot_rx) = match config.storage {
            StorageBackend::File(_) => {
                let (tx, rx) = mpsc::channel(config.snapshot_queue_size.max(1));
                (Some(tx), Some(rx))
            }
            StorageBackend::Memory => (None, None),
        };

        let rng = match config.route_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let store = ParcelStore::from_records(records);
        let metrics = Metrics::new();
        metrics.parcels_suspended.set(store.suspended_count() as i64);

        (
            Self {
                config,
                store,
                sessions: SessionStore::new(),
                clock,
                rng: Mutex::new(rng),
                snapshot_tx,
                snapshot_lock: AsyncMutex::new(()),
                metrics,
            },
            snapshot_rx,
        )
    }
}
