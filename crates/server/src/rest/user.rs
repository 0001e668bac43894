use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, AppError, AuthUser, CreateUserRequest, LawyerSearchParams,
    PaginatedResponse, UpdateProfileRequest, UserRole, UserSummary,
};

use crate::auth::extractors::{AuthRequired, ClerkOnly};
use crate::auth::password as pw;
use crate::error_convert::ValidateRequest;
use crate::repo::user as user_repo;

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Own profile", body = AuthUser),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_profile(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<AuthUser>, AppError> {
    let record = user_repo::find_by_id(&pool, user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))?;
    Ok(Json(record.to_auth_user()?))
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AuthUser),
        (status = 400, description = "Empty display name", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
#[tracing::instrument(skip(pool, user, payload), fields(user_id = user.id))]
pub async fn update_profile(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AuthUser>, AppError> {
    if let Some(ref name) = payload.display_name {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("display_name must not be empty"));
        }
    }
    payload.validate_request()?;

    let record = user_repo::update_profile(&pool, user.id, &payload).await?;
    Ok(Json(record.to_auth_user()?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = UserSummary),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(viewer): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<UserSummary>, AppError> {
    let id = super::parse_user_id(&id)?;
    let record = user_repo::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;

    let with_email = viewer.role.is_staff() || viewer.id == id;
    Ok(Json(record.to_summary(with_email)?))
}

#[utoipa::path(
    get,
    path = "/api/lawyers",
    params(LawyerSearchParams),
    responses(
        (status = 200, description = "Lawyer directory", body = PaginatedResponse<UserSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_lawyers(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(viewer): AuthRequired,
    Query(params): Query<LawyerSearchParams>,
) -> Result<Json<PaginatedResponse<UserSummary>>, AppError> {
    let (page, limit) = normalize_pagination(params.page, params.limit);
    let (rows, total) = user_repo::search_lawyers(&pool, params.q.as_deref(), page, limit).await?;

    let with_email = viewer.role.is_staff();
    let data = rows
        .iter()
        .map(|r| r.to_summary(with_email))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(PaginatedResponse::new(data, page, limit, total)))
}

#[utoipa::path(
    get,
    path = "/api/judges",
    responses(
        (status = 200, description = "All judges", body = Vec<UserSummary>),
        (status = 403, description = "Clerks only", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_judges(
    State(pool): State<Pool<Postgres>>,
    _clerk: ClerkOnly,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let judges = user_repo::list_by_role(&pool, UserRole::Judge)
        .await?
        .iter()
        .map(|r| r.to_summary(true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(judges))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = AuthUser),
        (status = 403, description = "Clerks only", body = AppError),
        (status = 409, description = "Email already registered", body = AppError),
        (status = 422, description = "Validation error", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
#[tracing::instrument(skip(pool, clerk, payload), fields(clerk_id = clerk.0.id))]
pub async fn create_user(
    State(pool): State<Pool<Postgres>>,
    clerk: ClerkOnly,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AuthUser>), AppError> {
    payload.validate_request()?;

    let password_hash =
        pw::hash_password(&payload.password).map_err(|e| AppError::internal(e.to_string()))?;

    let record = user_repo::create(
        &pool,
        user_repo::NewUser {
            email: &payload.email,
            password_hash: &password_hash,
            display_name: &payload.display_name,
            role: payload.role,
            phone_number: None,
            specialization: None,
        },
    )
    .await?;

    tracing::info!(user_id = record.id, role = %payload.role, "account created by clerk");
    Ok((StatusCode::CREATED, Json(record.to_auth_user()?)))
}
