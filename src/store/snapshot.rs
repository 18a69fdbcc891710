use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::store::ParcelRecord;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    #[serde(default)]
    records: Vec<ParcelRecord>,
}

/// Reads the snapshot at `path`. A missing file is an empty store.
pub async fn load(path: &Path) -> Result<Vec<ParcelRecord>, AppError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot found; starting empty");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(AppError::Internal(format!(
                "failed to read snapshot {}: {err}",
                path.display()
            )));
        }
    };

    let snapshot: SnapshotFile = serde_json::from_slice(&bytes).map_err(|err| {
        AppError::Internal(format!("invalid snapshot {}: {err}", path.display()))
    })?;

    if snapshot.version != FORMAT_VERSION {
        return Err(AppError::Internal(format!(
            "unsupported snapshot version {} in {}",
            snapshot.version,
            path.display()
        )));
    }

    info!(
        path = %path.display(),
        parcels = snapshot.records.len(),
        "snapshot loaded"
    );
    Ok(snapshot.records)
}

/// Writes to a sibling temp file and renames it over `path`.
pub async fn save(path: &Path, records: Vec<ParcelRecord>) -> Result<(), AppError> {
    let body = serde_json::to_vec_pretty(&SnapshotFile {
        version: FORMAT_VERSION,
        records,
    })
    .map_err(|err| AppError::Internal(format!("failed to encode snapshot: {err}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            AppError::Internal(format!("failed to create {}: {err}", parent.display()))
        })?;
    }

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|err| AppError::Internal(format!("failed to write {}: {err}", tmp.display())))?;
    tokio::fs::rename(&tmp, path).await.map_err(|err| {
        AppError::Internal(format!("failed to replace {}: {err}", path.display()))
    })?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{load, save};
    use crate::models::parcel::{Parcel, ParcelStatus};
    use crate::store::ParcelRecord;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let records = load(&dir.path().join("absent.json")).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn saved_records_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("parcels.json");

        let parcel = Parcel::new(
            "1Z0000000000000003".to_string(),
            "Berlin, Germany".to_string(),
            "Tokyo, Japan".to_string(),
            Vec::new(),
            Utc::now(),
        );
        save(&path, vec![ParcelRecord::new(parcel)]).await.unwrap();

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].parcel.tracking_number, "1Z0000000000000003");
        assert!(!path.with_file_name("parcels.json.tmp").exists());
    }

    #[tokio::test]
    async fn legacy_documents_are_migrated_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        let legacy = r#"{
            "version": 1,
            "records": [
                {
                    "parcel": {
                        "tracking_number": "1zlegacy00000000000",
                        "created_at": "2025-01-01T00:00:00Z",
                        "pickup_location": "Dortmund, Germany",
                        "delivered_location": "London, United Kingdom",
                        "last_updated": "2025-01-01T00:00:00Z"
                    },
                    "history": [
                        {
                            "tracking_number": "1ZLEGACY00000000000",
                            "status": "Parcel received at origin facility",
                            "timestamp": "2025-01-01T00:00:00Z"
                        }
                    ]
                }
            ]
        }"#;
        tokio::fs::write(&path, legacy).await.unwrap();

        let loaded = load(&path).await.unwrap();
        let record = &loaded[0];
        assert!(record.parcel.route.is_empty());
        assert!(!record.parcel.suspended);
        assert_eq!(record.history[0].status, ParcelStatus::Created);
        assert_eq!(record.history[0].location, "");
    }

    #[tokio::test]
    async fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        tokio::fs::write(&path, r#"{"version": 9, "records": []}"#)
            .await
            .unwrap();

        assert!(load(&path).await.is_err());
    }
}
