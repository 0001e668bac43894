use shared_types::{AppError, CreateEvidenceRequest, Evidence, Side};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const EVIDENCE_COLUMNS: &str =
    "id, case_id, submitted_by, side, title, description, evidence_type, file_url, created_at";

pub async fn create(
    pool: &Pool<Postgres>,
    case_id: Uuid,
    submitted_by: i64,
    side: Side,
    req: &CreateEvidenceRequest,
) -> Result<Evidence, AppError> {
    sqlx::query_as::<_, Evidence>(&format!(
        r#"
        INSERT INTO evidence
            (case_id, submitted_by, side, title, description, evidence_type, file_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {EVIDENCE_COLUMNS}
        "#
    ))
    .bind(case_id)
    .bind(submitted_by)
    .bind(side.as_str())
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(&req.evidence_type)
    .bind(req.file_url.as_deref())
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Evidence>, AppError> {
    sqlx::query_as::<_, Evidence>(&format!("SELECT {EVIDENCE_COLUMNS} FROM evidence WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_by_case(pool: &Pool<Postgres>, case_id: Uuid) -> Result<Vec<Evidence>, AppError> {
    sqlx::query_as::<_, Evidence>(&format!(
        "SELECT {EVIDENCE_COLUMNS} FROM evidence WHERE case_id = $1 ORDER BY created_at ASC, id ASC"
    ))
    .bind(case_id)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Delete an exhibit submitted by `submitted_by` on a case that is still open.
pub async fn delete(pool: &Pool<Postgres>, id: Uuid, submitted_by: i64) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM evidence e
        USING cases c
        WHERE e.id = $1 AND e.submitted_by = $2
          AND c.id = e.case_id AND c.status NOT IN ('closed', 'rejected')
        "#,
    )
    .bind(id)
    .bind(submitted_by)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok(result.rows_affected() > 0)
}
