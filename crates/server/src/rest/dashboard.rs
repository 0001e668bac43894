use axum::{extract::State, Json};
use sqlx::{Pool, Postgres};

use shared_types::{AppError, DashboardStats};

use crate::auth::extractors::AuthRequired;
use crate::repo::dashboard;

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Landing-page numbers for the caller", body = DashboardStats),
        (status = 401, description = "Not authenticated", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(dashboard::stats(&pool, user.role, user.id).await?))
}
