use std::path::Path as FsPath;
use std::sync::Arc;

use axum::Form;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::middleware;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, get_service, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeFile;
use tracing::{info, warn};

use crate::auth::{self, AdminSession, LOGIN_PATH, session};
use crate::catalog;
use crate::engine::queue::request_snapshot;
use crate::engine::{progression, route, tracking_number};
use crate::error::AppError;
use crate::models::history::HistoryEvent;
use crate::models::parcel::{Parcel, ParcelStatus};
use crate::state::AppState;
use crate::store::ParcelRecord;

pub fn router(static_dir: &FsPath) -> Router<Arc<AppState>> {
    let guarded = Router::new()
        .route("/admin", get(list_parcels))
        .route("/admin/generate", post(generate_parcel))
        .route("/admin/suspend/:tracking_number", post(suspend_parcel))
        .route("/admin/resume/:tracking_number", post(resume_parcel))
        .route_layer(middleware::from_fn(auth::redirect_unauthorized));

    Router::new()
        .route(
            LOGIN_PATH,
            get_service(ServeFile::new(static_dir.join("login.html"))).post(login),
        )
        .route("/admin/logout", get(logout))
        .merge(guarded)
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct GenerateForm {
    #[serde(rename = "pickupLocation", default)]
    pub pickup_location: String,
    #[serde(rename = "deliveredLocation", default)]
    pub delivered_location: String,
}

#[derive(Debug, Serialize)]
pub struct AdminParcelView {
    pub tracking_number: String,
    pub created_at: DateTime<Utc>,
    pub pickup_location: String,
    pub delivered_location: String,
    pub current_location: String,
    pub current_step: usize,
    pub route_length: usize,
    pub is_delivered: bool,
    pub suspended: bool,
}

pub const LOGIN_FAILED_PATH: &str = "/admin/login?error=invalid_credentials";

async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if !auth::verify_credentials(&state.config, &form.username, &form.password) {
        warn!(username = %form.username, "admin login rejected");
        if auth::wants_json(&headers) {
            return Err(AppError::InvalidCredentials);
        }
        return Ok(Redirect::to(LOGIN_FAILED_PATH).into_response());
    }

    let now = state.clock.now();
    let ttl = state.config.session_ttl;
    let id = state.sessions.create(now, now + ttl);
    let token = session::issue_token(&state.config.session_secret, &id, now, now + ttl)?;
    let cookie = session::set_cookie(&token, ttl.num_seconds());
    info!(username = %form.username, "admin logged in");

    Ok(([(SET_COOKIE, cookie)], Redirect::to("/admin")).into_response())
}

async fn logout(
    State(state): State<Arc<AppState>>,
    admin: Option<AdminSession>,
) -> Response {
    if let Some(admin) = admin {
        state.sessions.destroy(&admin.id);
        info!("admin logged out");
    }

    (
        [(SET_COOKIE, session::clear_cookie())],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

async fn list_parcels(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> Json<Vec<AdminParcelView>> {
    let now = state.clock.now();
    let policy = state.config.policy;

    let parcels = state
        .store
        .list()
        .iter()
        .map(|record| {
            let evaluation =
                progression::evaluate(policy, &record.parcel, record.recorded_steps(), now);
            admin_view(&record.parcel, evaluation.current_step)
        })
        .collect();

    Json(parcels)
}

fn admin_view(parcel: &Parcel, current_step: usize) -> AdminParcelView {
    let current_location = parcel
        .route
        .get(current_step)
        .map(|step| step.location.clone())
        .unwrap_or_else(|| parcel.current_location.clone());

    AdminParcelView {
        tracking_number: parcel.tracking_number.clone(),
        created_at: parcel.created_at,
        pickup_location: parcel.pickup_location.clone(),
        delivered_location: parcel.delivered_location.clone(),
        current_location,
        current_step,
        route_length: parcel.route.len(),
        is_delivered: !parcel.route.is_empty() && current_step >= parcel.route.len() - 1,
        suspended: parcel.suspended,
    }
}

async fn generate_parcel(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Form(form): Form<GenerateForm>,
) -> Result<Redirect, AppError> {
    let pickup = catalog_label(&form.pickup_location, "pickupLocation")?;
    let destination = catalog_label(&form.delivered_location, "deliveredLocation")?;

    if pickup == destination {
        return Err(AppError::BadRequest(
            "pickupLocation and deliveredLocation must differ".to_string(),
        ));
    }

    let now = state.clock.now();
    let (tracking, route) = {
        let mut rng = state.rng.lock();
        let tracking = tracking_number::generate(&mut *rng);
        let route =
            route::generate_route(&pickup, &destination, state.config.route_stops, &mut *rng);
        (tracking, route)
    };

    let parcel = Parcel::new(tracking, pickup, destination, route, now);
    let mut record = ParcelRecord::new(parcel);
    let first = progression::step_event(&record.parcel, 0, now);
    record.append(first);

    let tracking = record.parcel.tracking_number.clone();
    let route_length = record.parcel.route.len();

    if let Err(err) = state.store.insert(record) {
        warn!(tracking_number = %tracking, error = %err, "tracking number collision");
        return Err(err);
    }

    state.metrics.parcels_created_total.inc();
    state.metrics.record_history(ParcelStatus::Created.as_str());
    request_snapshot(&state)?;

    info!(tracking_number = %tracking, route_length, "parcel generated");

    Ok(Redirect::to("/admin"))
}

fn catalog_label(raw: &str, field: &str) -> Result<String, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }

    catalog::find(raw)
        .map(|entry| entry.label())
        .ok_or_else(|| AppError::BadRequest(format!("{field} is not a known location: {raw}")))
}

async fn suspend_parcel(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(tracking): Path<String>,
) -> Result<Redirect, AppError> {
    set_suspended(&state, &tracking, true)?;
    state.metrics.parcels_suspended.inc();
    Ok(Redirect::to("/admin"))
}

async fn resume_parcel(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    Path(tracking): Path<String>,
) -> Result<Redirect, AppError> {
    set_suspended(&state, &tracking, false)?;
    state.metrics.parcels_suspended.dec();
    Ok(Redirect::to("/admin"))
}

/// Flips the flag and writes a Suspended/Resumed audit marker in one update.
fn set_suspended(state: &AppState, raw: &str, suspended: bool) -> Result<(), AppError> {
    let tracking = tracking_number::normalize(raw);
    let now = state.clock.now();
    let status = if suspended {
        ParcelStatus::Suspended
    } else {
        ParcelStatus::Resumed
    };

    state.store.update(&tracking, |record| {
        if record.parcel.suspended == suspended {
            let current = if suspended { "suspended" } else { "active" };
            return Err(AppError::Conflict(format!(
                "parcel {tracking} is already {current}"
            )));
        }

        let parcel = &mut record.parcel;
        parcel.suspended = suspended;
        parcel.touch(now);

        let marker = HistoryEvent {
            tracking_number: parcel.tracking_number.clone(),
            location: parcel.current_location.clone(),
            status,
            step_number: parcel.current_step,
            timestamp: now,
        };
        record.append(marker);
        Ok(())
    })?;

    state.metrics.record_history(status.as_str());
    request_snapshot(state)?;

    info!(tracking_number = %tracking, suspended, "parcel suspension changed");
    Ok(())
}
