//! Client-wide error types.
//!
//! Every fallible operation in the client core returns [`ClientError`].
//! Operation boundaries (login, verification, stream fetches, downloads)
//! convert these into user-facing notices instead of propagating them.

use serde::Deserialize;
use thiserror::Error;

/// Generic client error used across all components.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally, before any request was issued.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: anyhow::Error,
    },

    /// A success response whose body did not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// A platform service (push, media library) failed.
    #[error("Platform error: {message}")]
    Platform { message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Shape of the JSON body the API returns alongside error statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// Returns the HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Picks the message to show the user.
    ///
    /// Server-provided messages win; everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::Http { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
            _ => fallback.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errors)| {
                errors.iter().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string())
                })
            })
            .collect();
        messages.sort();
        ClientError::validation(messages.join(", "))
    }
}
