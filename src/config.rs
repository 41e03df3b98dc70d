// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::error::AppError;

/// Every attempt is scored as a percentage.
pub const MAX_SCORE: i32 = 100;

/// Sanity cap on the duration of a single attempt (2 hours).
pub const MAX_TIME_SPENT_SECONDS: i32 = 7200;

pub const MIN_TOTAL_QUESTIONS: i32 = 1;
pub const MAX_TOTAL_QUESTIONS: i32 = 100;

pub const MIN_PASS_THRESHOLD: i32 = 0;
pub const MAX_PASS_THRESHOLD: i32 = 100;

/// Authoring-side cap on an assessment time limit (3 hours).
pub const MIN_TIME_LIMIT_MINUTES: i32 = 1;
pub const MAX_TIME_LIMIT_MINUTES: i32 = 180;

/// Length of the hex identifier of the question document in the external store.
pub const EXTERNAL_DOCUMENT_ID_LEN: usize = 24;

/// Mirrors `assessment_attempt.idempotency_key VARCHAR(64)`.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 64;

/// Window used by the active-user statistic.
pub const ACTIVE_USER_WINDOW_DAYS: i32 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub connect_retries: u32,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            rust_log,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            acquire_timeout_secs: parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 3)?,
            connect_retries: parse_or("DATABASE_CONNECT_RETRIES", 5)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    parse_setting(key, env::var(key).ok(), default)
}

fn parse_setting<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}
