//! Durable key-value storage for the client.
//!
//! This module opens the SQLite pool backing local state and defines the
//! [`KeyValueStore`] seam that the session store is written against. Two
//! namespaces live in the same table: `local` for ordinary state and
//! `secure` for values that go through [`EncryptedStore`].

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::time::Duration;

pub mod encrypted;
pub mod memory;
pub mod sqlite;

pub use encrypted::EncryptedStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Namespace for ordinary local state (cached profile, onboarding flag).
pub const LOCAL_NAMESPACE: &str = "local";
/// Namespace for credentials; values stored here are encrypted.
pub const SECURE_NAMESPACE: &str = "secure";

/// Asynchronous string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Opens the connection pool and applies embedded migrations.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.store_max_connections)
            .acquire_timeout(Duration::from_secs(config.store_acquire_timeout_seconds))
            .connect(&config.store_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Database { pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store scoped to the `local` namespace.
    pub fn local_store(&self) -> SqliteStore {
        SqliteStore::new(self.pool.clone(), LOCAL_NAMESPACE)
    }

    /// Encrypted store scoped to the `secure` namespace.
    pub fn secure_store(&self, encryption_key: &str) -> Result<EncryptedStore<SqliteStore>> {
        let inner = SqliteStore::new(self.pool.clone(), SECURE_NAMESPACE);
        Ok(EncryptedStore::new(inner, encryption_key)?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Store connection pool closed");
    }
}
