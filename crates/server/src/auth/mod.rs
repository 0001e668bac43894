pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod password;

use shared_types::{AppError, AuthResponse, AuthUser, UserRole};
use sqlx::{Pool, Postgres};

use crate::repo::refresh_token;

/// Issue a fresh access/refresh pair for `user` and persist the refresh
/// token's hash.
pub async fn issue_session(pool: &Pool<Postgres>, user: AuthUser) -> Result<AuthResponse, AppError> {
    let access_token = jwt::create_access_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))?;
    let (refresh_token, expires_at) = jwt::create_refresh_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to sign refresh token: {e}")))?;

    refresh_token::store(pool, user.id, &jwt::hash_token(&refresh_token), expires_at).await?;

    Ok(AuthResponse {
        user,
        access_token,
        refresh_token,
    })
}

/// Role carried in the token, rejecting tokens minted with an unknown role.
pub fn role_of(claims: &jwt::Claims) -> Result<UserRole, AppError> {
    UserRole::parse(&claims.role).ok_or_else(|| AppError::unauthorized("Invalid token role"))
}
