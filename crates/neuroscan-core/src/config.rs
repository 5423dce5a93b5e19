//! Configuration module
//!
//! All knobs come from the environment (a `.env` file is honored by the
//! binary before this runs). Defaults mirror production behavior: batches of
//! 5 scans, 10-second poll interval, 60 poll attempts, 3 processing attempts
//! per scan.

use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ANALYSIS_MODEL_URL: &str = "http://localhost:8001";
const DEFAULT_BATCH_LIMIT: i64 = 5;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;
const DEFAULT_MAX_SCAN_RETRIES: i32 = 3;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Shared secret for the cron trigger. Empty/unset disables the check.
    pub cron_secret: Option<String>,
    /// Base URL of the external analysis service.
    pub analysis_model_url: String,
    /// Scans claimed per trigger invocation.
    pub batch_limit: i64,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub max_scan_retries: i32,
    /// When set, transient poll failures draw from this separate budget
    /// instead of consuming attempts from `max_poll_attempts`.
    pub transient_poll_budget: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let cron_secret = env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());

        Ok(Self {
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_url,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DB_TIMEOUT_SECS),
            cron_secret,
            analysis_model_url: env::var("ANALYSIS_MODEL_URL")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_MODEL_URL.to_string()),
            batch_limit: env::var("SCAN_BATCH_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BATCH_LIMIT),
            poll_interval: Duration::from_secs(
                env::var("POLL_INTERVAL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            max_poll_attempts: env::var("MAX_POLL_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS),
            max_scan_retries: env::var("MAX_SCAN_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SCAN_RETRIES),
            transient_poll_budget: env::var("TRANSIENT_POLL_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok()),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.analysis_model_url.is_empty() {
            anyhow::bail!("ANALYSIS_MODEL_URL must not be empty");
        }
        if self.batch_limit <= 0 {
            anyhow::bail!("SCAN_BATCH_LIMIT must be positive, got {}", self.batch_limit);
        }
        if self.max_poll_attempts == 0 {
            anyhow::bail!("MAX_POLL_ATTEMPTS must be positive");
        }
        if self.poll_interval.is_zero() {
            anyhow::bail!("POLL_INTERVAL_SECONDS must be positive");
        }
        if self.max_scan_retries <= 0 {
            anyhow::bail!(
                "MAX_SCAN_RETRIES must be positive, got {}",
                self.max_scan_retries
            );
        }
        Ok(())
    }
}
