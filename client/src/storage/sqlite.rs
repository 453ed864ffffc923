//! SQLite-backed key-value store.

use super::KeyValueStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Key-value store over the `kv_entries` table, scoped to one namespace.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Shared SQLite connection pool
    pool: SqlitePool,
    namespace: String,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (namespace, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(namespace, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.namespace)
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE namespace = ? AND key = ?")
            .bind(&self.namespace)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::{Database, LOCAL_NAMESPACE, SECURE_NAMESPACE};

    async fn database() -> Database {
        let config = Config::in_memory("http://localhost", "test-key");
        Database::new(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_overwrite_remove() {
        let db = database().await;
        let store = db.local_store();

        assert_eq!(store.get("user").await.unwrap(), None);

        store.set("user", "first").await.unwrap();
        store.set("user", "second").await.unwrap();
        assert_eq!(store.get("user").await.unwrap().as_deref(), Some("second"));

        store.remove("user").await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);

        // Removing twice is fine
        store.remove("user").await.unwrap();
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let db = database().await;
        let local = SqliteStore::new(db.pool().clone(), LOCAL_NAMESPACE);
        let secure = SqliteStore::new(db.pool().clone(), SECURE_NAMESPACE);

        local.set("token", "plain").await.unwrap();
        assert_eq!(secure.get("token").await.unwrap(), None);
        assert_eq!(local.namespace(), "local");
    }
}
