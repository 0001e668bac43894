use shared_types::{
    AppError, Case, CaseRequest, CaseRequestKind, CaseRequestListParams, UserRole,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;
use crate::repo::case::{self as case_repo, NewCase};

const REQUEST_COLUMNS: &str = "id, kind, status, client_id, lawyer_id, case_id, title, \
    description, category, defendant_id, response_note, created_at, responded_at";

/// Validated fields of a new request.
pub struct NewCaseRequest<'a> {
    pub kind: CaseRequestKind,
    pub client_id: i64,
    pub lawyer_id: i64,
    pub case_id: Option<Uuid>,
    pub title: String,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub defendant_id: Option<i64>,
}

pub async fn create(
    pool: &Pool<Postgres>,
    new: NewCaseRequest<'_>,
) -> Result<CaseRequest, AppError> {
    sqlx::query_as::<_, CaseRequest>(&format!(
        r#"
        INSERT INTO case_requests
            (kind, client_id, lawyer_id, case_id, title, description, category, defendant_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(new.kind.as_str())
    .bind(new.client_id)
    .bind(new.lawyer_id)
    .bind(new.case_id)
    .bind(new.title.trim())
    .bind(new.description)
    .bind(new.category)
    .bind(new.defendant_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<CaseRequest>, AppError> {
    sqlx::query_as::<_, CaseRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM case_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Which requests a role sees: sent (client), received (lawyer), all (clerk).
/// Judges have no view of requests.
pub fn request_scope(role: UserRole) -> Option<&'static str> {
    match role {
        UserRole::Client => Some("client"),
        UserRole::Lawyer => Some("lawyer"),
        UserRole::Clerk => Some("all"),
        UserRole::Judge => None,
    }
}

pub const REQUEST_SCOPE_PREDICATE: &str = "($1 = 'all' \
    OR ($1 = 'client' AND client_id = $2) \
    OR ($1 = 'lawyer' AND lawyer_id = $2))";

pub async fn list(
    pool: &Pool<Postgres>,
    scope: &str,
    user_id: i64,
    params: &CaseRequestListParams,
) -> Result<Vec<CaseRequest>, AppError> {
    sqlx::query_as::<_, CaseRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM case_requests \
         WHERE {REQUEST_SCOPE_PREDICATE} \
           AND ($3::text IS NULL OR status = $3) \
           AND ($4::text IS NULL OR kind = $4) \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(scope)
    .bind(user_id)
    .bind(params.status.as_deref())
    .bind(params.kind.as_deref())
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Accept a pending request and apply its side effect in one transaction.
///
/// - `new_case`: files the case (client as plaintiff, lawyer as counsel) and
///   links it to the request.
/// - `defense`: seats the lawyer as defense counsel.
///
/// Returns 409 when the request is no longer pending or the defense seat
/// was taken; nothing is written in that case.
pub async fn accept(
    pool: &Pool<Postgres>,
    id: Uuid,
    lawyer_id: i64,
) -> Result<(CaseRequest, Case), AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let request = sqlx::query_as::<_, CaseRequest>(&format!(
        r#"
        UPDATE case_requests SET status = 'accepted', responded_at = NOW()
        WHERE id = $1 AND lawyer_id = $2 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(lawyer_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::conflict("Request has already been answered"))?;

    let (request, case) = match request.kind()? {
        CaseRequestKind::NewCase => {
            let defendant_id = request
                .defendant_id
                .ok_or_else(|| AppError::internal("new_case request without defendant"))?;
            let category = request.category.as_deref().unwrap_or("other");
            let case = case_repo::insert(
                &mut tx,
                NewCase {
                    title: &request.title,
                    description: &request.description,
                    category,
                    plaintiff_id: request.client_id,
                    defendant_id,
                    plaintiff_lawyer_id: lawyer_id,
                },
            )
            .await?;

            let linked = sqlx::query_as::<_, CaseRequest>(&format!(
                "UPDATE case_requests SET case_id = $2 WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
            ))
            .bind(id)
            .bind(case.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
            (linked, case)
        }
        CaseRequestKind::Defense => {
            let case_id = request
                .case_id
                .ok_or_else(|| AppError::internal("defense request without case"))?;
            let case = case_repo::set_defense_lawyer(&mut tx, case_id, lawyer_id)
                .await?
                .ok_or_else(|| {
                    AppError::conflict("Case already has defense counsel or is no longer open")
                })?;
            (request, case)
        }
    };

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok((request, case))
}

/// Recipient lawyer declines. `None` if the request is no longer pending.
pub async fn reject(
    pool: &Pool<Postgres>,
    id: Uuid,
    lawyer_id: i64,
    note: Option<&str>,
) -> Result<Option<CaseRequest>, AppError> {
    sqlx::query_as::<_, CaseRequest>(&format!(
        r#"
        UPDATE case_requests SET status = 'rejected', response_note = $3, responded_at = NOW()
        WHERE id = $1 AND lawyer_id = $2 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(lawyer_id)
    .bind(note)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Sender client withdraws. `None` if the request is no longer pending.
pub async fn withdraw(
    pool: &Pool<Postgres>,
    id: Uuid,
    client_id: i64,
) -> Result<Option<CaseRequest>, AppError> {
    sqlx::query_as::<_, CaseRequest>(&format!(
        r#"
        UPDATE case_requests SET status = 'withdrawn', responded_at = NOW()
        WHERE id = $1 AND client_id = $2 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(client_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
