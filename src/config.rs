//! Application configuration loaded from environment variables.
//!
//! Everything is loaded once at startup and cloned into the shared state, so
//! handlers and the accounting engine never reach for ambient globals.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Redis connection URL for the record store
    pub redis_url: String,
    /// Allowed CORS origin (`*` allows any origin)
    pub cors_origin: String,

    // --- Secrets ---
    /// Static credential: username
    pub app_username: String,
    /// Static credential: password
    pub app_password: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Accounting / persistence constants ---
    /// Sliding TTL applied to each record write, in seconds
    pub record_ttl_seconds: u64,
    /// Fixed reference zone for day bucketing, as hours east of UTC
    pub utc_offset_hours: i32,
    /// Ledger retention window in calendar months
    pub retention_months: u32,
}

/// 180 days, matching the longest-lived variant of the record TTL.
const DEFAULT_RECORD_TTL_SECONDS: u64 = 15_552_000;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            app_username: env::var("APP_USERNAME")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("APP_USERNAME"))?,
            app_password: env::var("APP_PASSWORD")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("APP_PASSWORD"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            record_ttl_seconds: env::var("RECORD_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RECORD_TTL_SECONDS),
            utc_offset_hours: env::var("UTC_OFFSET_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            retention_months: env::var("RETENTION_MONTHS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            cors_origin: "*".to_string(),
            app_username: "testuser".to_string(),
            app_password: "testpass".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            record_ttl_seconds: DEFAULT_RECORD_TTL_SECONDS,
            utc_offset_hours: 8,
            retention_months: 6,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
