pub mod snapshot;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::history::HistoryEvent;
use crate::models::parcel::Parcel;

/// A parcel together with its history ledger.
///
/// Both halves live in one map entry so that evaluating progression, which
/// reads the parcel, appends history and moves `last_updated`, happens under a
/// single shard lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub parcel: Parcel,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

impl ParcelRecord {
    pub fn new(parcel: Parcel) -> Self {
        Self {
            parcel,
            history: Vec::new(),
        }
    }

    /// Number of route positions already written to the ledger.
    pub fn recorded_steps(&self) -> usize {
        self.history
            .iter()
            .filter(|event| event.is_route_step())
            .count()
    }

    pub fn append(&mut self, event: HistoryEvent) {
        self.history.push(event);
    }
}

#[derive(Default)]
pub struct ParcelStore {
    records: DashMap<String, ParcelRecord>,
}

impl ParcelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ParcelRecord>) -> Self {
        let store = Self::new();
        for mut record in records {
            record.parcel.tracking_number = record.parcel.tracking_number.to_uppercase();
            record.history.sort_by_key(|event| event.timestamp);
            store
                .records
                .insert(record.parcel.tracking_number.clone(), record);
        }
        store
    }

    pub fn insert(&self, record: ParcelRecord) -> Result<(), AppError> {
        match self.records.entry(record.parcel.tracking_number.clone()) {
            Entry::Occupied(entry) => Err(AppError::Conflict(format!(
                "tracking number {} already exists",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, tracking_number: &str) -> Option<ParcelRecord> {
        self.records
            .get(tracking_number)
            .map(|entry| entry.value().clone())
    }

    /// Runs `f` against the record while holding its entry lock.
    pub fn update<T, F>(&self, tracking_number: &str, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut ParcelRecord) -> Result<T, AppError>,
    {
        let mut record = self.records.get_mut(tracking_number).ok_or_else(|| {
            AppError::NotFound(format!("tracking number {tracking_number} not found"))
        })?;

        f(record.value_mut())
    }

    /// All records, newest parcel first.
    pub fn list(&self) -> Vec<ParcelRecord> {
        let mut records: Vec<ParcelRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.parcel.created_at.cmp(&a.parcel.created_at));
        records
    }

    pub fn snapshot(&self) -> Vec<ParcelRecord> {
        let mut records: Vec<ParcelRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.parcel.created_at.cmp(&b.parcel.created_at));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.records
            .iter()
            .map(|entry| entry.value().history.len())
            .sum()
    }

    pub fn suspended_count(&self) -> usize {
        self.records
            .iter()
            .filter(|entry| entry.value().parcel.suspended)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ParcelRecord, ParcelStore};
    use crate::error::AppError;
    use crate::models::history::HistoryEvent;
    use crate::models::parcel::{Parcel, ParcelStatus};

    fn record(tracking: &str) -> ParcelRecord {
        ParcelRecord::new(Parcel::new(
            tracking.to_string(),
            "Berlin, Germany".to_string(),
            "Tokyo, Japan".to_string(),
            Vec::new(),
            Utc::now(),
        ))
    }

    #[test]
    fn duplicate_tracking_number_is_a_conflict() {
        let store = ParcelStore::new();
        store.insert(record("1ZAAAA")).unwrap();

        let err = store.insert(record("1ZAAAA")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_unknown_parcel_is_not_found() {
        let store = ParcelStore::new();
        let err = store.update("1ZNOPE", |_| Ok(())).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn audit_markers_do_not_count_as_recorded_steps() {
        let mut rec = record("1ZBBBB");
        for status in [
            ParcelStatus::Created,
            ParcelStatus::Suspended,
            ParcelStatus::Resumed,
            ParcelStatus::InTransit,
        ] {
            rec.append(HistoryEvent {
                tracking_number: "1ZBBBB".to_string(),
                location: "Berlin, Germany".to_string(),
                status,
                step_number: 0,
                timestamp: Utc::now(),
            });
        }

        assert_eq!(rec.history.len(), 4);
        assert_eq!(rec.recorded_steps(), 2);
    }

    #[test]
    fn loaded_records_are_keyed_uppercase() {
        let mut rec = record("1ZCCCC");
        rec.parcel.tracking_number = "1zcccc".to_string();

        let store = ParcelStore::from_records(vec![rec]);
        assert!(store.get("1ZCCCC").is_some());
    }
}
