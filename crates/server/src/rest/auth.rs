use axum::{extract::State, http::StatusCode, Json};
use sqlx::{Pool, Postgres};

use shared_types::{
    AppError, AuthResponse, AuthUser, LoginRequest, RefreshRequest, RegisterRequest,
};

use crate::auth::extractors::AuthRequired;
use crate::auth::{issue_session, jwt, password as pw};
use crate::error_convert::ValidateRequest;
use crate::repo::{refresh_token, user as user_repo};

const BAD_CREDENTIALS: &str = "Invalid email or password";
const BAD_REFRESH: &str = "Invalid or expired refresh token";

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 403, description = "Role cannot self-register", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn register(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate_request()?;

    let flags = crate::config::feature_flags();
    if !payload.role.self_registrable(flags.staff_self_registration) {
        return Err(AppError::forbidden(format!(
            "{} accounts are created by the court clerk",
            payload.role
        )));
    }

    let password_hash =
        pw::hash_password(&payload.password).map_err(|e| AppError::internal(e.to_string()))?;

    let user = user_repo::create(
        &pool,
        user_repo::NewUser {
            email: &payload.email,
            password_hash: &password_hash,
            display_name: &payload.display_name,
            role: payload.role,
            phone_number: payload.phone_number.as_deref(),
            specialization: payload.specialization.as_deref(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "user registered");
    let session = issue_session(&pool, user.to_auth_user()?).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn login(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate_request()?;

    let user = user_repo::find_by_email(&pool, &payload.email).await?;
    let valid = pw::check_credentials(
        &payload.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
    );
    let user = match user {
        Some(user) if valid => user,
        _ => return Err(AppError::unauthorized(BAD_CREDENTIALS)),
    };

    let session = issue_session(&pool, user.to_auth_user()?).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = AuthResponse),
        (status = 401, description = "Invalid or revoked refresh token", body = AppError)
    ),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, payload))]
pub async fn refresh(
    State(pool): State<Pool<Postgres>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claims = jwt::validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AppError::unauthorized(BAD_REFRESH))?;

    // Revoke-on-use: the old token is dead whether or not the rest succeeds.
    let owner = refresh_token::consume(&pool, &jwt::hash_token(&payload.refresh_token))
        .await?
        .ok_or_else(|| AppError::unauthorized(BAD_REFRESH))?;
    if owner != claims.sub {
        return Err(AppError::unauthorized(BAD_REFRESH));
    }

    // Reload so a changed role or profile is reflected in the new tokens.
    let user = user_repo::find_by_id(&pool, owner)
        .await?
        .ok_or_else(|| AppError::unauthorized(BAD_REFRESH))?;

    let session = issue_session(&pool, user.to_auth_user()?).await?;
    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "All refresh tokens revoked"),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
#[tracing::instrument(skip(pool, auth), fields(user_id = auth.0.id))]
pub async fn logout(
    State(pool): State<Pool<Postgres>>,
    auth: AuthRequired,
) -> Result<StatusCode, AppError> {
    let revoked = refresh_token::revoke_all(&pool, auth.0.id).await?;
    tracing::debug!(revoked, "refresh tokens revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthUser),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<AuthUser>, AppError> {
    let record = user_repo::find_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;
    Ok(Json(record.to_auth_user()?))
}
