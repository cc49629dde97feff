//! Application configuration.
//!
//! Environment variables override defaults; nothing is required, so the
//! binary runs against a local Redis out of the box.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default values for configuration.
mod defaults {
    pub fn redis_url() -> String {
        "redis://127.0.0.1:6379".to_string()
    }

    pub fn lock_ttl_ms() -> u64 {
        30_000
    }

    pub fn processing_delay_ms() -> u64 {
        2_000
    }
}

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Connection URL of the coordination store.
    #[serde(default = "defaults::redis_url")]
    pub redis_url: String,
    /// TTL applied to every lock key, in milliseconds.
    #[serde(default = "defaults::lock_ttl_ms")]
    pub lock_ttl_ms: u64,
    /// Fixed repository write delay, in milliseconds.
    #[serde(default = "defaults::processing_delay_ms")]
    pub processing_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: defaults::redis_url(),
            lock_ttl_ms: defaults::lock_ttl_ms(),
            processing_delay_ms: defaults::processing_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// Recognized variables: `REDIS_URL`, `LOCK_TTL_MS`,
    /// `PROCESSING_DELAY_MS`.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| defaults::redis_url()),
            lock_ttl_ms: env_u64("LOCK_TTL_MS", defaults::lock_ttl_ms())?,
            processing_delay_ms: env_u64("PROCESSING_DELAY_MS", defaults::processing_delay_ms())?,
        })
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
                reason: format!("must be a non-negative integer number of milliseconds: {e}"),
            }),
        },
        Err(_) => Ok(default),
    }
}
