//! Central module for client-wide configuration settings.
//!
//! This module handles loading the API location, the local store location
//! and the key protecting the secure store.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub store_url: String,
    pub store_max_connections: u32,
    pub store_acquire_timeout_seconds: u64,
    pub encryption_key: String,
    pub request_timeout_seconds: Option<u64>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_url = env::var("API_URL").context("API_URL not set")?;

        let store_url = env::var("STORE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://livewatch.db?mode=rwc".to_string());

        let store_max_connections = env::var("STORE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u32>()
            .context("STORE_MAX_CONNECTIONS must be a valid number")?;

        let store_acquire_timeout_seconds = env::var("STORE_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("STORE_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let encryption_key =
            env::var("STORE_ENCRYPTION_KEY").context("STORE_ENCRYPTION_KEY not set")?;

        let request_timeout_seconds = match env::var("REQUEST_TIMEOUT_SECONDS") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .context("REQUEST_TIMEOUT_SECONDS must be a valid number")?,
            ),
            Err(_) => None,
        };

        Ok(Config {
            api_url,
            store_url,
            store_max_connections,
            store_acquire_timeout_seconds,
            encryption_key,
            request_timeout_seconds,
        })
    }

    /// Builds a configuration for an in-memory store, pointing at `api_url`.
    pub fn in_memory(api_url: impl Into<String>, encryption_key: impl Into<String>) -> Self {
        Config {
            api_url: api_url.into(),
            store_url: "sqlite::memory:".to_string(),
            store_max_connections: 1,
            store_acquire_timeout_seconds: 3,
            encryption_key: encryption_key.into(),
            request_timeout_seconds: None,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}
