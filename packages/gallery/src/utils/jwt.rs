use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Name of the cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "gallery_session";

/// How long an admin session stays valid.
pub const SESSION_TTL_HOURS: i64 = 8;

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Admin username
    pub admin: bool,
    pub iat: usize,
    pub exp: usize, // Expiration timestamp
}

/// Sign a new admin session token.
pub fn sign(username: &str, secret: &str) -> Result<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(SESSION_TTL_HOURS))
        .context("session expiry out of range")?
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        admin: true,
        iat: now.timestamp() as usize,
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a session token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
