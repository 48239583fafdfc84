//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup. The JWT signing key is the only
//! required secret; everything else has a local-development default.

use chrono::Weekday;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::stats::DEFAULT_WEEKLY_GOAL;
use crate::services::progress::StreakAnchor;

/// Which session store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Remote document store (Cloud Firestore)
    Firestore,
    /// Local embedded relational store
    Sqlite,
    /// In-process maps, lost on restart
    Memory,
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Firestore => "firestore",
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Server ---
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// HS256 key verifying caller tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Storage ---
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    /// SQLite connection string (SQLite backend)
    pub sqlite_path: String,

    // --- Engine ---
    /// Designated rest day; must have no exercises in the plan
    pub rest_day: Weekday,
    /// Where the backward streak walk begins
    pub streak_anchor: StreakAnchor,
    /// Interval of the background progress refresh
    pub refresh_interval: Duration,
    /// Weekly goal given to freshly initialized stats
    pub weekly_goal: u32,
}

impl Config {
    /// Deterministic config for tests (in-memory store).
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            sqlite_path: "sqlite::memory:".to_string(),
            rest_day: Weekday::Sun,
            streak_anchor: StreakAnchor::Today,
            refresh_interval: Duration::from_secs(30),
            weekly_goal: DEFAULT_WEEKLY_GOAL,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),

            store_backend: parse_or("STORE_BACKEND", StoreBackend::Sqlite)?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            sqlite_path: env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "sqlite://daily_workout.db".to_string()),

            rest_day: parse_or("REST_DAY", Weekday::Sun)?,
            streak_anchor: parse_or("STREAK_ANCHOR", StreakAnchor::Today)?,
            refresh_interval: Duration::from_secs(parse_or("REFRESH_INTERVAL_SECS", 30u64)?),
            weekly_goal: parse_or("WEEKLY_GOAL", DEFAULT_WEEKLY_GOAL)?,
        })
    }
}

/// Parse an optional environment variable, using `default` when unset.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
