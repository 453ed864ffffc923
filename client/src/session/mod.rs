//! Persistence of the authenticated session.
//!
//! Token and role live in the secure store, the profile in ordinary local
//! storage. A missing token means no session, whatever else is stored.

pub mod models;

use crate::auth::token;
use crate::errors::{ClientError, ClientResult};
use crate::routes::Route;
use crate::storage::KeyValueStore;
use crate::utils::crypto::CryptoError;
pub use models::{Session, UserProfile};
use std::sync::Arc;
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "token";
pub const ROLE_KEY: &str = "role";
pub const USER_KEY: &str = "user";
pub const ONBOARDING_KEY: &str = "hasSeenSplash";

/// Reads and writes session materials across the secure and local stores.
#[derive(Clone)]
pub struct SessionStore {
    secure: Arc<dyn KeyValueStore>,
    local: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(secure: Arc<dyn KeyValueStore>, local: Arc<dyn KeyValueStore>) -> Self {
        Self { secure, local }
    }

    /// Persists token, role and profile.
    ///
    /// The token goes in last, so a failed save never leaves a usable
    /// session behind.
    pub async fn save(&self, session: &Session) -> ClientResult<()> {
        match &session.profile {
            Some(profile) => {
                let json = serde_json::to_string(profile)
                    .map_err(|e| ClientError::decode(format!("Profile encoding failed: {}", e)))?;
                self.local.set(USER_KEY, &json).await?;
            }
            None => self.local.remove(USER_KEY).await?,
        }

        self.secure.set(ROLE_KEY, &session.role).await?;
        self.secure.set(TOKEN_KEY, &session.token).await?;

        debug!(role = %session.role, "Session saved");
        Ok(())
    }

    /// Loads the stored session, or `None` when no token is stored.
    pub async fn load(&self) -> ClientResult<Option<Session>> {
        let Some(token) = self.token().await? else {
            return Ok(None);
        };

        let role = self.read_secure(ROLE_KEY).await?.unwrap_or_default();
        let profile = self.profile().await?;

        Ok(Some(Session {
            token,
            role,
            profile,
        }))
    }

    /// Stored bearer token. A token that no longer decrypts counts as absent.
    pub async fn token(&self) -> ClientResult<Option<String>> {
        Ok(self
            .read_secure(TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty()))
    }

    /// Role of the signed-in user; `None` without a token.
    pub async fn role(&self) -> ClientResult<Option<String>> {
        if self.token().await?.is_none() {
            return Ok(None);
        }
        self.read_secure(ROLE_KEY).await
    }

    /// Cached profile; `None` without a token or when the cache is unreadable.
    pub async fn profile(&self) -> ClientResult<Option<UserProfile>> {
        if self.token().await?.is_none() {
            return Ok(None);
        }

        let Some(raw) = self.local.get(USER_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!("Discarding unreadable cached profile: {}", e);
                Ok(None)
            }
        }
    }

    /// Removes token, role and profile.
    ///
    /// Every key is attempted even when an earlier removal fails; the first
    /// failure is returned.
    pub async fn clear(&self) -> ClientResult<()> {
        let results = [
            self.secure.remove(TOKEN_KEY).await,
            self.secure.remove(ROLE_KEY).await,
            self.local.remove(USER_KEY).await,
        ];

        for result in results {
            result?;
        }

        debug!("Session cleared");
        Ok(())
    }

    /// Reads a secure value, dropping the secure keys when it cannot be
    /// decrypted (rotated key or corrupted ciphertext).
    async fn read_secure(&self, key: &str) -> ClientResult<Option<String>> {
        match self.secure.get(key).await {
            Ok(value) => Ok(value),
            Err(e) if e.downcast_ref::<CryptoError>().is_some() => {
                warn!(key, "Discarding unreadable secure session data: {}", e);
                self.secure.remove(TOKEN_KEY).await?;
                self.secure.remove(ROLE_KEY).await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn has_seen_onboarding(&self) -> ClientResult<bool> {
        Ok(self.local.get(ONBOARDING_KEY).await?.is_some())
    }

    pub async fn mark_onboarding_seen(&self) -> ClientResult<()> {
        self.local.set(ONBOARDING_KEY, "true").await?;
        Ok(())
    }

    /// Picks the first screen to show on launch.
    pub async fn launch_route(&self) -> ClientResult<Route> {
        if !self.has_seen_onboarding().await? {
            return Ok(Route::Onboarding);
        }

        match self.token().await? {
            Some(t) if !token::is_expired(&t) => Ok(Route::LiveMonitoring),
            _ => Ok(Route::Login),
        }
    }
}
