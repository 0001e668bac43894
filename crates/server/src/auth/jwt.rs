use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::UserRole;

/// Token type discriminator. Prevents using a refresh token as an access token.
const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// JWT claims stored in access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier so two tokens minted in the same second
    /// still hash differently.
    pub jti: String,
    /// "access" or "refresh".
    pub typ: String,
}

/// Compute the SHA-256 hash of a raw JWT string, hex-encoded.
/// Only this hash of a refresh token is persisted.
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn jwt_secret() -> Result<String, jsonwebtoken::errors::Error> {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => Ok(secret),
        _ => Err(jsonwebtoken::errors::ErrorKind::InvalidKeyFormat.into()),
    }
}

pub fn access_token_expiry_minutes() -> i64 {
    crate::config::env_or("JWT_ACCESS_TOKEN_EXPIRY_MINUTES", 15)
}

pub fn refresh_token_expiry_days() -> i64 {
    crate::config::env_or("JWT_REFRESH_TOKEN_EXPIRY_DAYS", 7)
}

fn sign(claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
}

fn mint(
    user_id: i64,
    email: &str,
    role: UserRole,
    typ: &str,
    expires_at: chrono::DateTime<Utc>,
) -> Claims {
    Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.as_str().to_string(),
        iat: Utc::now().timestamp(),
        exp: expires_at.timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
        typ: typ.to_string(),
    }
}

pub fn create_access_token(
    user_id: i64,
    email: &str,
    role: UserRole,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expires_at = Utc::now() + Duration::minutes(access_token_expiry_minutes());
    sign(&mint(user_id, email, role, TOKEN_TYPE_ACCESS, expires_at))
}

pub fn create_refresh_token(
    user_id: i64,
    email: &str,
    role: UserRole,
) -> Result<(String, chrono::DateTime<Utc>), jsonwebtoken::errors::Error> {
    let expires_at = Utc::now() + Duration::days(refresh_token_expiry_days());
    let token = sign(&mint(user_id, email, role, TOKEN_TYPE_REFRESH, expires_at))?;
    Ok((token, expires_at))
}

fn decode_claims(token: &str, expected_typ: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.typ != expected_typ {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(token_data.claims)
}

/// Validate an access token. Refresh tokens are rejected.
pub fn validate_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode_claims(token, TOKEN_TYPE_ACCESS)
}

/// Validate a refresh token. Access tokens are rejected.
pub fn validate_refresh_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode_claims(token, TOKEN_TYPE_REFRESH)
}
