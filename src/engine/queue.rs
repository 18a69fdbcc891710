use tokio::sync::mpsc::error::TrySendError;

use crate::error::AppError;
use crate::state::AppState;

/// Asks the snapshot writer to persist the store. A full queue already holds
/// a pending request, so the signal is dropped.
pub fn request_snapshot(state: &AppState) -> Result<(), AppError> {
    let Some(tx) = &state.snapshot_tx else {
        return Ok(());
    };

    match tx.try_send(()) {
        Ok(()) | Err(TrySendError::Full(())) => Ok(()),
        Err(TrySendError::Closed(())) => Err(AppError::Internal(
            "snapshot queue closed".to_string(),
        )),
    }
}
