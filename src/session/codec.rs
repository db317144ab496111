//! Signed, expiring encoding of [`SessionData`] for the session cookie.
//!
//! The cookie value is an HS256 token signed with the configured secret.
//! Decoding rejects bad signatures and anything past its expiry, so a
//! stale or tampered cookie simply reads as "no session".

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::SessionData;

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    exp: i64,
    iat: i64,
    #[serde(flatten)]
    data: SessionData,
}

pub fn encode_session(secret: &str, data: &SessionData, duration: chrono::Duration) -> String {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        exp: now + duration.num_seconds(),
        iat: now,
        data: data.clone(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode session token")
}

pub fn decode_session(secret: &str, token: &str) -> Option<SessionData> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|t| t.claims.data)
}
