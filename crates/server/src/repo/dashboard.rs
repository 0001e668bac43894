use shared_types::{AppError, DashboardStats, UserRole};
use sqlx::{Pool, Postgres};

use crate::access::CaseAccess;
use crate::error_convert::SqlxErrorExt;
use crate::repo::{case as case_repo, case_request, chat};

/// Landing-page numbers for one user.
pub async fn stats(
    pool: &Pool<Postgres>,
    role: UserRole,
    user_id: i64,
) -> Result<DashboardStats, AppError> {
    let access = CaseAccess::for_user(role, user_id);

    let cases_by_status = case_repo::count_by_status(pool, &access).await?;

    let upcoming_hearings: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM hearings h JOIN cases c ON c.id = h.case_id \
         WHERE {} AND h.status = 'scheduled' \
           AND h.scheduled_at >= NOW() AND h.scheduled_at < NOW() + INTERVAL '7 days'",
        CaseAccess::sql_predicate(1)
    ))
    .bind(access.scope.as_str())
    .bind(access.user_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let pending_requests = match case_request::request_scope(role) {
        Some(scope) => sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM case_requests WHERE {} AND status = 'pending'",
            case_request::REQUEST_SCOPE_PREDICATE
        ))
        .bind(scope)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?,
        None => 0,
    };

    let unread_messages = chat::unread_total(pool, user_id).await?;

    Ok(DashboardStats {
        role,
        cases_by_status,
        upcoming_hearings,
        pending_requests,
        unread_messages,
    })
}
