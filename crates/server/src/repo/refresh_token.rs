use chrono::{DateTime, Utc};
use shared_types::AppError;
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

/// Persist the hash of a newly issued refresh token.
pub async fn store(
    pool: &Pool<Postgres>,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Revoke a live refresh token and return its owner.
///
/// The revoke is a single conditional update, so a token can be exchanged
/// at most once even under concurrent refresh calls.
pub async fn consume(pool: &Pool<Postgres>, token_hash: &str) -> Result<Option<i64>, AppError> {
    sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE refresh_tokens SET revoked = TRUE
        WHERE token_hash = $1 AND revoked = FALSE AND expires_at > NOW()
        RETURNING user_id
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Revoke every refresh token of a user. Returns how many were live.
pub async fn revoke_all(pool: &Pool<Postgres>, user_id: i64) -> Result<u64, AppError> {
    let result =
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE")
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}

/// Delete expired and revoked tokens. Returns how many rows were removed.
pub async fn purge_stale(pool: &Pool<Postgres>) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE revoked OR expires_at < NOW()")
        .execute(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    Ok(result.rows_affected())
}
