//! Wire types for the authentication endpoints.

use crate::http::ApiResponse;
use crate::session::UserProfile;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Body of `POST /admin/login`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(min = 1, message = "Push token is required"))]
    pub push_token: String,
}

/// Body of `POST /admin/verify-2fa`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Verify2faRequest {
    /// Temporary token handed out by the first login step.
    #[validate(length(min = 1, message = "Verification session is missing"))]
    pub token: String,

    #[validate(length(min = 1, message = "Verification code is required"))]
    pub otp: String,
}

/// `data` member of both login responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default, deserialize_with = "lenient_profile")]
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    #[serde(rename = "tempToken")]
    pub temp_token: Option<String>,
    #[serde(rename = "require2FA", default)]
    pub require_2fa: bool,
}

pub type LoginResponse = ApiResponse<LoginData>;

/// Decodes `user` without letting a mismatched profile fail the response.
fn lenient_profile<'de, D>(deserializer: D) -> Result<Option<UserProfile>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    match serde_json::from_value(raw) {
        Ok(profile) => Ok(Some(profile)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable user profile in login response: {}", e);
            Ok(None)
        }
    }
}
