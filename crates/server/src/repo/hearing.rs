use chrono::{DateTime, Utc};
use shared_types::{
    AppError, Hearing, HearingReschedule, HearingSearchParams, HearingStatus,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::access::CaseAccess;
use crate::error_convert::SqlxErrorExt;
use crate::repo::case as case_repo;

const HEARING_COLUMNS: &str = "h.id, h.case_id, h.scheduled_at, h.duration_minutes, h.courtroom, \
    h.purpose, h.status, h.notes, h.reschedule_count, h.created_by, h.created_at, h.updated_at";

const RESCHEDULE_COLUMNS: &str =
    "id, hearing_id, sequence, previous_at, new_at, reason, rescheduled_by, created_at";

pub struct NewHearing<'a> {
    pub case_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub courtroom: &'a str,
    pub purpose: &'a str,
    pub created_by: i64,
}

/// Put a hearing on the calendar.
///
/// The case row is locked while its status is checked, and the first hearing
/// of an approved case moves it to `in_progress` in the same transaction.
pub async fn schedule(pool: &Pool<Postgres>, new: NewHearing<'_>) -> Result<Hearing, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let case = case_repo::lock(&mut tx, new.case_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case {} not found", new.case_id)))?;
    let status = case.status()?;
    if !status.accepts_hearings() {
        return Err(AppError::conflict(format!(
            "Hearings cannot be scheduled on a {} case",
            status.as_str()
        )));
    }

    let hearing = sqlx::query_as::<_, Hearing>(&format!(
        r#"
        INSERT INTO hearings AS h
            (case_id, scheduled_at, duration_minutes, courtroom, purpose, created_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {HEARING_COLUMNS}
        "#
    ))
    .bind(new.case_id)
    .bind(new.scheduled_at)
    .bind(new.duration_minutes)
    .bind(new.courtroom.trim())
    .bind(new.purpose.trim())
    .bind(new.created_by)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    case_repo::mark_in_progress(&mut tx, new.case_id).await?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(hearing)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Hearing>, AppError> {
    sqlx::query_as::<_, Hearing>(&format!("SELECT {HEARING_COLUMNS} FROM hearings h WHERE h.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_by_case(pool: &Pool<Postgres>, case_id: Uuid) -> Result<Vec<Hearing>, AppError> {
    sqlx::query_as::<_, Hearing>(&format!(
        "SELECT {HEARING_COLUMNS} FROM hearings h WHERE h.case_id = $1 \
         ORDER BY h.scheduled_at ASC, h.id ASC"
    ))
    .bind(case_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Hearings on cases the caller can see, in time order.
pub async fn search(
    pool: &Pool<Postgres>,
    access: &CaseAccess,
    params: &HearingSearchParams,
) -> Result<Vec<Hearing>, AppError> {
    sqlx::query_as::<_, Hearing>(&format!(
        "SELECT {HEARING_COLUMNS} FROM hearings h JOIN cases c ON c.id = h.case_id \
         WHERE {} \
           AND ($3::text IS NULL OR h.status = $3) \
           AND ($4::timestamptz IS NULL OR h.scheduled_at >= $4) \
           AND ($5::timestamptz IS NULL OR h.scheduled_at < $5) \
         ORDER BY h.scheduled_at ASC, h.id ASC",
        CaseAccess::sql_predicate(1)
    ))
    .bind(access.scope.as_str())
    .bind(access.user_id)
    .bind(params.status.as_deref())
    .bind(params.from)
    .bind(params.to)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn history(
    pool: &Pool<Postgres>,
    hearing_id: Uuid,
) -> Result<Vec<HearingReschedule>, AppError> {
    sqlx::query_as::<_, HearingReschedule>(&format!(
        "SELECT {RESCHEDULE_COLUMNS} FROM hearing_reschedules \
         WHERE hearing_id = $1 ORDER BY sequence ASC"
    ))
    .bind(hearing_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Move a scheduled hearing and append to its history.
///
/// The hearing row is held `FOR UPDATE` for the whole transaction, so
/// concurrent reschedules serialize and each gets the next sequence number.
pub async fn reschedule(
    pool: &Pool<Postgres>,
    id: Uuid,
    new_at: DateTime<Utc>,
    reason: &str,
    rescheduled_by: i64,
) -> Result<(Hearing, HearingReschedule), AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let current = sqlx::query_as::<_, Hearing>(&format!(
        "SELECT {HEARING_COLUMNS} FROM hearings h WHERE h.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found(format!("Hearing {id} not found")))?;

    if current.status != HearingStatus::Scheduled.as_str() {
        return Err(AppError::conflict(format!(
            "Only scheduled hearings can be rescheduled (hearing is {})",
            current.status
        )));
    }
    if current.scheduled_at == new_at {
        return Err(AppError::bad_request("New time is the same as the current time"));
    }

    let sequence = current.reschedule_count + 1;

    let entry = sqlx::query_as::<_, HearingReschedule>(&format!(
        r#"
        INSERT INTO hearing_reschedules
            (hearing_id, sequence, previous_at, new_at, reason, rescheduled_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RESCHEDULE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(sequence)
    .bind(current.scheduled_at)
    .bind(new_at)
    .bind(reason.trim())
    .bind(rescheduled_by)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    let hearing = sqlx::query_as::<_, Hearing>(&format!(
        r#"
        UPDATE hearings AS h SET scheduled_at = $2, reschedule_count = $3, updated_at = NOW()
        WHERE h.id = $1
        RETURNING {HEARING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(new_at)
    .bind(sequence)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok((hearing, entry))
}

/// Close out a scheduled hearing. `None` if it already left `scheduled`.
pub async fn update_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: HearingStatus,
    notes: Option<&str>,
) -> Result<Option<Hearing>, AppError> {
    sqlx::query_as::<_, Hearing>(&format!(
        r#"
        UPDATE hearings AS h SET status = $2, notes = COALESCE($3, h.notes), updated_at = NOW()
        WHERE h.id = $1 AND h.status = 'scheduled'
        RETURNING {HEARING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(notes)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
