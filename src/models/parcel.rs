use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParcelStatus {
    #[serde(alias = "Parcel received at origin facility")]
    Created,
    // Legacy customs label maps to a transit step, not to Suspended.
    #[serde(
        rename = "In Transit",
        alias = "Parcel in transit",
        alias = "Parcel in customs custody"
    )]
    InTransit,
    #[serde(alias = "Parcel delivered")]
    Delivered,
    #[serde(alias = "Parcel suspended")]
    Suspended,
    #[serde(alias = "Parcel resumed")]
    Resumed,
}

impl ParcelStatus {
    /// Suspended and Resumed are audit markers, never route positions.
    pub fn is_route_step(self) -> bool {
        !matches!(self, ParcelStatus::Suspended | ParcelStatus::Resumed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParcelStatus::Created => "Created",
            ParcelStatus::InTransit => "In Transit",
            ParcelStatus::Delivered => "Delivered",
            ParcelStatus::Suspended => "Suspended",
            ParcelStatus::Resumed => "Resumed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteStep {
    pub location: String,
    pub status: ParcelStatus,
    #[serde(default)]
    pub customs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub tracking_number: String,
    pub created_at: DateTime<Utc>,
    pub pickup_location: String,
    pub delivered_location: String,
    #[serde(default)]
    pub route: Vec<RouteStep>,
    #[serde(default)]
    pub current_step: usize,
    #[serde(default)]
    pub current_location: String,
    #[serde(default)]
    pub suspended: bool,
    pub last_updated: DateTime<Utc>,
}

impl Parcel {
    pub fn new(
        tracking_number: String,
        pickup_location: String,
        delivered_location: String,
        route: Vec<RouteStep>,
        now: DateTime<Utc>,
    ) -> Self {
        let current_location = route
            .first()
            .map(|step| step.location.clone())
            .unwrap_or_else(|| pickup_location.clone());

        Self {
            tracking_number: tracking_number.to_uppercase(),
            created_at: now,
            pickup_location,
            delivered_location,
            route,
            current_step: 0,
            current_location,
            suspended: false,
            last_updated: now,
        }
    }

    pub fn is_delivered(&self) -> bool {
        !self.route.is_empty() && self.current_step >= self.route.len() - 1
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_updated {
            self.last_updated = now;
        }
    }
}
