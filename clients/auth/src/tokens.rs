//! Access token inspection
//!
//! The client never holds the signing key, so tokens are only peeked at:
//! the payload is decoded without signature verification to read the
//! expiry. The backend stays the authority on whether a token is valid.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Claims the client cares about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiration time
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued at time
    #[serde(default)]
    pub iat: Option<i64>,
    /// Role name, when the backend embeds it
    #[serde(default)]
    pub role: Option<String>,
}

/// Decode the claims of a JWT without verifying its signature
pub fn peek_claims(token: &str) -> AuthResult<Claims> {
    let header = decode_header(token).map_err(|e| AuthError::Decode(e.to_string()))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::Decode(e.to_string()))?;
    Ok(data.claims)
}

/// Expiry of a token, if it is a JWT carrying `exp`
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = peek_claims(token).ok()?.exp?;
    Utc.timestamp_opt(exp, 0).single()
}

/// True when the token expires within `leeway` of `now`.
///
/// Opaque tokens and tokens without `exp` are never reported expired.
pub fn is_expired(token: &str, now: DateTime<Utc>, leeway: Duration) -> bool {
    match expires_at(token) {
        Some(exp) => {
            let expired = exp <= now + leeway;
            if expired {
                debug!("Access token expired at {}", exp);
            }
            expired
        }
        None => false,
    }
}
