//! Data structures for the authenticated identity held by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile as returned by the login endpoints and cached locally.
///
/// Only `id` is required; the server may omit the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Token, role and cached profile of the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub role: String,
    pub profile: Option<UserProfile>,
}

impl Session {
    /// Builds a session from a login response; the role falls back to an
    /// empty string when the server sent no profile.
    pub fn new(token: impl Into<String>, profile: Option<UserProfile>) -> Self {
        let role = profile
            .as_ref()
            .map(|p| p.role.clone())
            .unwrap_or_default();

        Self {
            token: token.into(),
            role,
            profile,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}
