use chrono::{DateTime, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const COOKIE_NAME: &str = "tracker_session";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Session id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Server-side record of logged-in admin sessions, keyed by id with their expiry.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, DateTime<Utc>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session valid until `expires_at`, dropping any that lapsed before `now`.
    pub fn create(&self, now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Uuid {
        self.sessions.retain(|_, expiry| *expiry > now);

        let id = Uuid::new_v4();
        self.sessions.insert(id, expires_at);
        id
    }

    pub fn is_live(&self, id: &Uuid, now: DateTime<Utc>) -> bool {
        self.sessions
            .get(id)
            .is_some_and(|expiry| *expiry.value() > now)
    }

    pub fn destroy(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

pub fn issue_token(
    secret: &str,
    id: &Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = SessionClaims {
        sub: id.to_string(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AppError::Internal(format!("failed to sign session token: {err}")))
}

/// Session id carried by `token`, if the signature holds and `exp` is after `now`.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Option<Uuid> {
    let mut validation = Validation::new(Algorithm::HS256);
    // exp is compared against the application clock below
    validation.validate_exp = false;

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;

    if data.claims.exp <= now.timestamp() {
        return None;
    }

    Uuid::parse_str(&data.claims.sub).ok()
}

pub fn set_cookie(value: &str, max_age_secs: i64) -> String {
    format!("{COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn clear_cookie() -> String {
    format!("{COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Finds our cookie in one or more `Cookie` header values.
pub fn find_cookie<'a, I>(headers: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value)
}
