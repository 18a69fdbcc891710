pub mod admin;
pub mod tracking;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};

use crate::catalog::{self, CatalogEntry};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .merge(tracking::router())
        .merge(admin::router(&static_dir))
        .route("/locations", get(locations))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
}

#[derive(Serialize)]
struct LocationView {
    label: String,
    #[serde(flatten)]
    entry: CatalogEntry,
}

async fn locations() -> Json<Vec<LocationView>> {
    Json(
        catalog::CATALOG
            .iter()
            .map(|entry| LocationView {
                label: entry.label(),
                entry: *entry,
            })
            .collect(),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    parcels: usize,
    history_events: usize,
    admin_sessions: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        parcels: state.store.len(),
        history_events: state.store.history_len(),
        admin_sessions: state.sessions.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
