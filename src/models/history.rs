use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::parcel::ParcelStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEvent {
    pub tracking_number: String,
    #[serde(default)]
    pub location: String,
    pub status: ParcelStatus,
    #[serde(default)]
    pub step_number: usize,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEvent {
    pub fn is_route_step(&self) -> bool {
        self.status.is_route_step()
    }
}
