//! HS256 request token for the Kling API.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Validity window on either side of "now", in seconds. The API only checks
/// that the token is currently valid, so a generous window avoids clock-skew
/// rejections.
const VALIDITY_WINDOW_SECS: u64 = 10 * 24 * 3600;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    exp: u64,
    nbf: u64,
}

/// Sign a bearer token for one API call from the account key pair.
pub fn sign_request_token(
    access_key: &str,
    secret_key: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let claims = Claims {
        iss: access_key.to_string(),
        exp: now + VALIDITY_WINDOW_SECS,
        nbf: now.saturating_sub(VALIDITY_WINDOW_SECS),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )
}
