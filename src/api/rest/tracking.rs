use std::sync::Arc;

use axum::Form;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::progression;
use crate::engine::queue::request_snapshot;
use crate::engine::tracking_number::normalize;
use crate::error::AppError;
use crate::models::history::HistoryEvent;
use crate::models::parcel::RouteStep;
use crate::state::AppState;
use crate::store::ParcelRecord;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/track", post(submit_tracking))
        .route("/track/:tracking_number", get(track))
}

#[derive(Deserialize)]
pub struct TrackForm {
    #[serde(rename = "trackingNumber", default)]
    pub tracking_number: String,
}

#[derive(Debug, Serialize)]
pub struct TrackingView {
    pub tracking_number: String,
    pub pickup_location: String,
    pub delivered_location: String,
    pub created_at: DateTime<Utc>,
    pub current_location: String,
    pub current_step: usize,
    pub is_delivered: bool,
    pub suspended: bool,
    pub route: Vec<RouteStep>,
    pub history: Vec<HistoryEvent>,
}

impl TrackingView {
    fn from_record(record: &ParcelRecord) -> Self {
        let parcel = &record.parcel;
        let mut history = record.history.clone();
        history.sort_by_key(|event| event.timestamp);

        Self {
            tracking_number: parcel.tracking_number.clone(),
            pickup_location: parcel.pickup_location.clone(),
            delivered_location: parcel.delivered_location.clone(),
            created_at: parcel.created_at,
            current_location: parcel.current_location.clone(),
            current_step: parcel.current_step,
            is_delivered: parcel.is_delivered(),
            suspended: parcel.suspended,
            route: parcel.route.clone(),
            history,
        }
    }
}

async fn submit_tracking(Form(form): Form<TrackForm>) -> Result<Redirect, AppError> {
    let tracking_number = normalize(&form.tracking_number);

    if tracking_number.is_empty() {
        return Err(AppError::BadRequest(
            "trackingNumber cannot be empty".to_string(),
        ));
    }

    if !tracking_number.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AppError::BadRequest(
            "trackingNumber must be alphanumeric".to_string(),
        ));
    }

    Ok(Redirect::to(&format!("/track/{tracking_number}")))
}

async fn track(
    State(state): State<Arc<AppState>>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingView>, AppError> {
    let tracking_number = normalize(&tracking_number);
    let now = state.clock.now();
    let policy = state.config.policy;

    let result = state.store.update(&tracking_number, |record| {
        let appended = progression::advance(policy, record, now);
        Ok((TrackingView::from_record(record), appended))
    });

    let (view, appended) = match result {
        Ok(found) => {
            state
                .metrics
                .tracking_lookups_total
                .with_label_values(&["found"])
                .inc();
            found
        }
        Err(err) => {
            state
                .metrics
                .tracking_lookups_total
                .with_label_values(&["not_found"])
                .inc();
            return Err(err);
        }
    };

    if !appended.is_empty() {
        for event in &appended {
            state.metrics.record_history(event.status.as_str());
        }
        request_snapshot(&state)?;

        info!(
            tracking_number = %view.tracking_number,
            current_step = view.current_step,
            appended = appended.len(),
            "parcel advanced"
        );
    }

    Ok(Json(view))
}
