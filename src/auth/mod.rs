pub mod session;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::{ACCEPT, COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/admin/login";

pub fn verify_credentials(config: &Config, username: &str, password: &str) -> bool {
    let user_ok = username.as_bytes().ct_eq(config.admin_user.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(config.admin_pass.as_bytes());
    (user_ok & pass_ok).into()
}

/// Proof that the request carries a live admin session.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession {
    pub id: Uuid,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let headers = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok());

        let now = state.clock.now();
        let id = session::find_cookie(headers)
            .and_then(|value| session::verify_token(&state.config.session_secret, value, now))
            .ok_or(AppError::Unauthorized)?;

        if !state.sessions.is_live(&id, now) {
            return Err(AppError::Unauthorized);
        }

        Ok(Self { id })
    }
}

pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"))
}

/// Browsers get sent to the login page; JSON clients keep the 401.
pub async fn redirect_unauthorized(request: Request, next: Next) -> Response {
    let json_client = wants_json(request.headers());

    let response = next.run(request).await;

    if response.status() == StatusCode::UNAUTHORIZED && !json_client {
        return Redirect::to(LOGIN_PATH).into_response();
    }

    response
}
