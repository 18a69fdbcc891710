use std::env;
use std::path::PathBuf;

use chrono::Duration;

use crate::catalog::CATALOG;
use crate::engine::progression::ProgressionPolicy;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub storage: StorageBackend,
    pub session_secret: String,
    pub session_ttl: Duration,
    pub admin_user: String,
    pub admin_pass: String,
    pub policy: ProgressionPolicy,
    pub route_stops: usize,
    pub route_seed: Option<u64>,
    pub snapshot_queue_size: usize,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let http_port = match env::var("HTTP_PORT") {
            Ok(_) => parse_or_default("HTTP_PORT", 3000)?,
            Err(_) => parse_or_default("PORT", 3000)?,
        };

        let interval_hours: i64 = parse_or_default("ADVANCE_INTERVAL_HOURS", 24)?;
        if interval_hours <= 0 {
            return Err(AppError::Internal(
                "invalid ADVANCE_INTERVAL_HOURS: must be > 0".to_string(),
            ));
        }

        let policy = match env::var("PROGRESSION_POLICY").as_deref() {
            Ok("elapsed-days") => ProgressionPolicy::ElapsedDays,
            Ok("interval") | Err(_) => ProgressionPolicy::Interval {
                every: Duration::hours(interval_hours),
            },
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid PROGRESSION_POLICY: {other}"
                )));
            }
        };

        let storage = parse_storage(
            &env::var("DATABASE_URL").unwrap_or_else(|_| "memory://".to_string()),
        )?;

        let session_ttl_minutes: i64 = parse_or_default("SESSION_TTL_MINUTES", 480)?;
        if session_ttl_minutes <= 0 {
            return Err(AppError::Internal(
                "invalid SESSION_TTL_MINUTES: must be > 0".to_string(),
            ));
        }

        let route_seed = match env::var("ROUTE_SEED") {
            Ok(_) => Some(parse_or_default("ROUTE_SEED", 0u64)?),
            Err(_) => None,
        };

        Ok(Self {
            http_port,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            storage,
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| "fallbacksecret".to_string()),
            session_ttl: Duration::minutes(session_ttl_minutes),
            admin_user: env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string()),
            admin_pass: env::var("ADMIN_PASS").unwrap_or_else(|_| "admin".to_string()),
            policy,
            route_stops: validate_route_stops(parse_or_default("ROUTE_STOPS", 5)?)?,
            route_seed,
            snapshot_queue_size: parse_or_default("SNAPSHOT_QUEUE_SIZE", 64)?,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("static")),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            storage: StorageBackend::Memory,
            session_secret: "fallbacksecret".to_string(),
            session_ttl: Duration::hours(8),
            admin_user: "admin".to_string(),
            admin_pass: "admin".to_string(),
            policy: ProgressionPolicy::default(),
            route_stops: 5,
            route_seed: None,
            snapshot_queue_size: 64,
            static_dir: PathBuf::from("static"),
        }
    }
}

pub fn parse_storage(url: &str) -> Result<StorageBackend, AppError> {
    if url.is_empty() || url == "memory://" {
        return Ok(StorageBackend::Memory);
    }

    match url.strip_prefix("file://") {
        Some(path) if !path.is_empty() => Ok(StorageBackend::File(PathBuf::from(path))),
        _ => Err(AppError::Internal(format!(
            "invalid DATABASE_URL: expected memory:// or file://<path>, got {url}"
        ))),
    }
}

/// Transit stops plus the customs checkpoint must fit in the catalog minus both endpoints.
pub fn validate_route_stops(stops: usize) -> Result<usize, AppError> {
    let max = CATALOG.len() - 3;
    if stops > max {
        return Err(AppError::Internal(format!(
            "invalid ROUTE_STOPS: {stops} exceeds {max}"
        )));
    }
    Ok(stops)
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
