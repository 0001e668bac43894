use chrono::{Datelike, Utc};
use shared_types::{
    format_case_number, page_offset, AppError, Case, CaseSearchParams, StatusCount,
    UpdateCaseRequest, VerdictOutcome,
};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::access::CaseAccess;
use crate::error_convert::SqlxErrorExt;

pub const CASE_COLUMNS: &str = "c.id, c.case_number, c.title, c.description, c.category, \
    c.status, c.plaintiff_id, c.defendant_id, c.plaintiff_lawyer_id, c.defendant_lawyer_id, \
    c.judge_id, c.review_note, c.verdict_outcome, c.verdict_summary, c.verdict_at, \
    c.filed_at, c.updated_at, c.closed_at";

/// Fields of a newly filed case. Parties must already be validated.
pub struct NewCase<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub plaintiff_id: i64,
    pub defendant_id: i64,
    pub plaintiff_lawyer_id: i64,
}

/// File a case in `pending` with the next docket number.
/// Runs on a connection so it can join the caller's transaction.
pub async fn insert(conn: &mut PgConnection, new: NewCase<'_>) -> Result<Case, AppError> {
    let seq: i64 = sqlx::query_scalar("SELECT nextval('case_number_seq')")
        .fetch_one(&mut *conn)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
    let case_number = format_case_number(Utc::now().year(), seq);

    sqlx::query_as::<_, Case>(&format!(
        r#"
        INSERT INTO cases AS c
            (case_number, title, description, category, plaintiff_id, defendant_id,
             plaintiff_lawyer_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(&case_number)
    .bind(new.title.trim())
    .bind(new.description)
    .bind(new.category)
    .bind(new.plaintiff_id)
    .bind(new.defendant_id)
    .bind(new.plaintiff_lawyer_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// File a case outside any other transaction.
pub async fn create(pool: &Pool<Postgres>, new: NewCase<'_>) -> Result<Case, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let case = insert(&mut tx, new).await?;
    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(case)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!("SELECT {CASE_COLUMNS} FROM cases c WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Load a case the caller can see, or 404.
pub async fn find_visible(
    pool: &Pool<Postgres>,
    access: &CaseAccess,
    id: Uuid,
) -> Result<Case, AppError> {
    let case = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {id} not found")))?;
    access.ensure_visible(case)
}

/// Row-lock a case inside a transaction.
pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        "SELECT {CASE_COLUMNS} FROM cases c WHERE c.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Role-scoped, filtered, paginated case search, newest first.
pub async fn search(
    pool: &Pool<Postgres>,
    access: &CaseAccess,
    params: &CaseSearchParams,
    page: i64,
    limit: i64,
) -> Result<(Vec<Case>, i64), AppError> {
    let pattern = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));

    let filter = format!(
        "{} \
         AND ($3::text IS NULL OR c.status = $3) \
         AND ($4::text IS NULL OR c.category = $4) \
         AND ($5::text IS NULL OR c.title ILIKE $5 OR c.case_number ILIKE $5)",
        CaseAccess::sql_predicate(1)
    );

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM cases c WHERE {filter}"))
        .bind(access.scope.as_str())
        .bind(access.user_id)
        .bind(params.status.as_deref())
        .bind(params.category.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, Case>(&format!(
        "SELECT {CASE_COLUMNS} FROM cases c WHERE {filter} \
         ORDER BY c.filed_at DESC, c.id DESC LIMIT $6 OFFSET $7"
    ))
    .bind(access.scope.as_str())
    .bind(access.user_id)
    .bind(params.status.as_deref())
    .bind(params.category.as_deref())
    .bind(pattern.as_deref())
    .bind(limit)
    .bind(page_offset(page, limit))
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

/// Edit a case that has not been reviewed yet. `None` if it left `pending`.
pub async fn update_details(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: &UpdateCaseRequest,
) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        r#"
        UPDATE cases AS c SET
            title = COALESCE($2, c.title),
            description = COALESCE($3, c.description),
            category = COALESCE($4, c.category),
            updated_at = NOW()
        WHERE c.id = $1 AND c.status = 'pending'
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(req.description.as_deref())
    .bind(req.category.as_deref())
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Clerk review. Only a `pending` case moves; `None` if another review won.
pub async fn review(
    pool: &Pool<Postgres>,
    id: Uuid,
    approved: bool,
    judge_id: Option<i64>,
    note: Option<&str>,
) -> Result<Option<Case>, AppError> {
    let status = if approved { "approved" } else { "rejected" };
    sqlx::query_as::<_, Case>(&format!(
        r#"
        UPDATE cases AS c SET
            status = $2,
            judge_id = COALESCE($3, c.judge_id),
            review_note = $4,
            updated_at = NOW()
        WHERE c.id = $1 AND c.status = 'pending'
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(judge_id)
    .bind(note)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Reassign the presiding judge of a case that is still open.
pub async fn assign_judge(
    pool: &Pool<Postgres>,
    id: Uuid,
    judge_id: i64,
) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        r#"
        UPDATE cases AS c SET judge_id = $2, updated_at = NOW()
        WHERE c.id = $1 AND c.status NOT IN ('closed', 'rejected')
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(judge_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// `approved -> in_progress`, a no-op for any other status.
pub async fn mark_in_progress(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE cases SET status = 'in_progress', updated_at = NOW() \
         WHERE id = $1 AND status = 'approved'",
    )
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Record a defense lawyer on a case that has none.
/// `None` when the seat was taken or the case is no longer open.
pub async fn set_defense_lawyer(
    conn: &mut PgConnection,
    id: Uuid,
    lawyer_id: i64,
) -> Result<Option<Case>, AppError> {
    sqlx::query_as::<_, Case>(&format!(
        r#"
        UPDATE cases AS c SET defendant_lawyer_id = $2, updated_at = NOW()
        WHERE c.id = $1
          AND c.defendant_lawyer_id IS NULL
          AND c.plaintiff_lawyer_id IS DISTINCT FROM $2
          AND c.status NOT IN ('closed', 'rejected')
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(lawyer_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Close a case with a verdict and cancel its remaining hearings.
///
/// Both writes share one transaction. `None` when the case is not an open
/// case presided over by `judge_id`.
pub async fn close_with_verdict(
    pool: &Pool<Postgres>,
    id: Uuid,
    judge_id: i64,
    outcome: VerdictOutcome,
    summary: &str,
) -> Result<Option<(Case, u64)>, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let closed = sqlx::query_as::<_, Case>(&format!(
        r#"
        UPDATE cases AS c SET
            status = 'closed',
            verdict_outcome = $3,
            verdict_summary = $4,
            verdict_at = NOW(),
            closed_at = NOW(),
            updated_at = NOW()
        WHERE c.id = $1 AND c.judge_id = $2 AND c.status IN ('approved', 'in_progress')
        RETURNING {CASE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(judge_id)
    .bind(outcome.as_str())
    .bind(summary.trim())
    .fetch_optional(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let Some(case) = closed else {
        return Ok(None);
    };

    let cancelled = sqlx::query(
        "UPDATE hearings SET status = 'cancelled', updated_at = NOW() \
         WHERE case_id = $1 AND status = 'scheduled'",
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .rows_affected();

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(Some((case, cancelled)))
}

/// Case counts per status within the caller's scope.
pub async fn count_by_status(
    pool: &Pool<Postgres>,
    access: &CaseAccess,
) -> Result<Vec<StatusCount>, AppError> {
    sqlx::query_as::<_, StatusCount>(&format!(
        "SELECT c.status AS status, COUNT(*) AS count FROM cases c WHERE {} \
         GROUP BY c.status ORDER BY c.status",
        CaseAccess::sql_predicate(1)
    ))
    .bind(access.scope.as_str())
    .bind(access.user_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
