//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use chrono::FixedOffset;
use serde::Deserialize;

/// Largest UTC offset any real timezone uses, in minutes.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `ESTATE_UTC_OFFSET_MINUTES` (optional): offset applied to local-time
///   inputs, defaults to 60 (West Africa Time)
/// - `ACCESS_LOG_DEFAULT_LIMIT` (optional): audit page size, defaults to 50
/// - `SEED_ADMIN_EMAIL`, `SEED_ADMIN_TOKEN` (optional): when both are set, a
///   super admin with that bearer token is ensured at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_offset_minutes")]
    pub estate_utc_offset_minutes: i32,

    #[serde(default = "default_log_limit")]
    pub access_log_default_limit: i64,

    #[serde(default)]
    pub seed_admin_email: Option<String>,

    #[serde(default)]
    pub seed_admin_token: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

/// West Africa Time, UTC+1.
fn default_offset_minutes() -> i32 {
    60
}

fn default_log_limit() -> i64 {
    50
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// The estate's fixed UTC offset, or `None` if it is out of range.
    pub fn estate_offset(&self) -> Option<FixedOffset> {
        if self.estate_utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(self.estate_utc_offset_minutes * 60)
    }

    /// Seed credentials, only when both halves are present and non-empty.
    pub fn seed_admin(&self) -> Option<(&str, &str)> {
        match (&self.seed_admin_email, &self.seed_admin_token) {
            (Some(email), Some(token)) if !email.trim().is_empty() && !token.is_empty() => {
                Some((email.trim(), token.as_str()))
            }
            _ => None,
        }
    }
}
