//! Inspection of bearer tokens issued by the API.
//!
//! The client never verifies signatures; it only reads the payload to learn
//! when a token stops being useful.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Claims the API places in its tokens. All of them are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub id: Option<serde_json::Value>,
    pub role: Option<String>,
}

/// Reads the payload of a JWT without checking its signature.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    match decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!("Token payload not decodable: {}", e);
            None
        }
    }
}

/// Days until the token expires, never negative.
///
/// Tokens without an `exp` claim (or that cannot be decoded) count as one day.
pub fn expiry_in_days(token: &str) -> f64 {
    match decode_claims(token).and_then(|c| c.exp) {
        Some(exp) => {
            let remaining = (exp - Utc::now().timestamp()) as f64;
            (remaining / SECONDS_PER_DAY).max(0.0)
        }
        None => 1.0,
    }
}

/// True only when the token carries an `exp` claim in the past.
pub fn is_expired(token: &str) -> bool {
    decode_claims(token)
        .and_then(|c| c.exp)
        .is_some_and(|exp| exp <= Utc::now().timestamp())
}
