//! Assembles the client core from a [`Config`].

use crate::auth::AuthController;
use crate::config::Config;
use crate::errors::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::session::SessionStore;
use crate::storage::Database;
use crate::streams::StreamFetcher;
use std::sync::Arc;

/// Everything a shell needs to drive the client.
pub struct ClientContext {
    pub database: Database,
    pub session: SessionStore,
    pub api: ApiClient,
    pub auth: AuthController,
    pub streams: StreamFetcher,
}

impl ClientContext {
    pub async fn new(config: &Config) -> ClientResult<Self> {
        let database = Database::new(config).await?;

        let secure = database
            .secure_store(&config.encryption_key)
            .map_err(|e| ClientError::validation(format!("STORE_ENCRYPTION_KEY: {}", e)))?;
        let session = SessionStore::new(Arc::new(secure), Arc::new(database.local_store()));

        let api = ApiClient::new(config, session.clone())?;
        let auth = AuthController::new(api.clone());
        let streams = StreamFetcher::new(api.clone());

        Ok(Self {
            database,
            session,
            api,
            auth,
            streams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::Route;
    use crate::session::Session;

    #[tokio::test]
    async fn test_context_persists_through_sqlite() {
        let config = Config::in_memory("http://127.0.0.1:9", "context-key");
        let context = ClientContext::new(&config).await.unwrap();

        context
            .session
            .save(&Session::new("opaque-token", None))
            .await
            .unwrap();
        context.session.mark_onboarding_seen().await.unwrap();

        assert_eq!(
            context.session.launch_route().await.unwrap(),
            Route::LiveMonitoring
        );
        assert_eq!(
            context.api.session().token().await.unwrap().as_deref(),
            Some("opaque-token")
        );

        // The secure namespace holds ciphertext only
        let raw: String = sqlx::query_scalar(
            "SELECT value FROM kv_entries WHERE namespace = 'secure' AND key = 'token'",
        )
        .fetch_one(context.database.pool())
        .await
        .unwrap();
        assert_ne!(raw, "opaque-token");
    }
}
