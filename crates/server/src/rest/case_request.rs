use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_valid_case_category, validate_parties, AppError, CaseRequest, CaseRequestKind,
    CaseRequestListParams, CaseRequestResponse, CaseRequestStatus, RespondCaseRequest,
    SubmitCaseRequest, UserRole, CASE_CATEGORIES,
};

use super::parse_uuid;
use crate::access::CaseAccess;
use crate::auth::extractors::{
    AuthRequired, ClientOnly, CurrentUser, LawyerOnly, RequestParticipant, RoleRequired,
};
use crate::repo::{case as case_repo, case_request as request_repo, user as user_repo};

/// Sender, recipient and clerks see a request; anyone else gets 404.
fn ensure_visible(request: CaseRequest, user: &CurrentUser) -> Result<CaseRequest, AppError> {
    let visible = user.role == UserRole::Clerk
        || request.client_id == user.id
        || request.lawyer_id == user.id;
    if visible {
        Ok(request)
    } else {
        Err(AppError::not_found(format!("Case request {} not found", request.id)))
    }
}

fn ensure_pending(request: &CaseRequest, next: CaseRequestStatus) -> Result<(), AppError> {
    let current = request.status()?;
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::conflict(format!(
            "Request is already {}",
            current.as_str()
        )))
    }
}

async fn load_visible(
    pool: &Pool<Postgres>,
    id: &str,
    user: &CurrentUser,
) -> Result<CaseRequest, AppError> {
    let uuid = parse_uuid(id)?;
    let request = request_repo::find_by_id(pool, uuid)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Case request {id} not found")))?;
    ensure_visible(request, user)
}

#[utoipa::path(
    post,
    path = "/api/case-requests",
    request_body = SubmitCaseRequest,
    responses(
        (status = 201, description = "Request sent", body = CaseRequestResponse),
        (status = 400, description = "Invalid request", body = AppError),
        (status = 403, description = "Clients only", body = AppError),
        (status = 409, description = "Duplicate pending request or case already defended", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "case-requests"
)]
#[tracing::instrument(skip(pool, client, body), fields(client_id = client.id))]
pub async fn submit_request(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(client): ClientOnly,
    Json(body): Json<SubmitCaseRequest>,
) -> Result<(StatusCode, Json<CaseRequestResponse>), AppError> {
    user_repo::require_role(&pool, body.lawyer_id, UserRole::Lawyer, "lawyer_id").await?;

    let new = match body.kind {
        CaseRequestKind::NewCase => {
            let title = body
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| AppError::bad_request("title is required for a new case"))?;
            let category = body
                .category
                .as_deref()
                .ok_or_else(|| AppError::bad_request("category is required for a new case"))?;
            if !is_valid_case_category(category) {
                return Err(AppError::bad_request(format!(
                    "Invalid category: {category}. Valid values: {}",
                    CASE_CATEGORIES.join(", ")
                )));
            }
            let defendant_id = body
                .defendant_id
                .ok_or_else(|| AppError::bad_request("defendant_id is required for a new case"))?;
            validate_parties(client.id, defendant_id, Some(body.lawyer_id), None)?;
            user_repo::require_role(&pool, defendant_id, UserRole::Client, "defendant_id").await?;

            request_repo::NewCaseRequest {
                kind: body.kind,
                client_id: client.id,
                lawyer_id: body.lawyer_id,
                case_id: None,
                title: title.to_string(),
                description: &body.description,
                category: Some(category),
                defendant_id: Some(defendant_id),
            }
        }
        CaseRequestKind::Defense => {
            let case_id = body
                .case_id
                .ok_or_else(|| AppError::bad_request("case_id is required for a defense request"))?;
            let case =
                case_repo::find_visible(&pool, &CaseAccess::of(&client), case_id).await?;
            if case.defendant_id != client.id {
                return Err(AppError::bad_request(
                    "Only the defendant can request defense counsel",
                ));
            }
            if case.status()?.is_terminal() {
                return Err(AppError::conflict(format!(
                    "Case {} is {}",
                    case.case_number, case.status
                )));
            }
            if case.defendant_lawyer_id.is_some() {
                return Err(AppError::conflict("Case already has defense counsel"));
            }
            validate_parties(
                case.plaintiff_id,
                case.defendant_id,
                case.plaintiff_lawyer_id,
                Some(body.lawyer_id),
            )?;

            let title = body
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or(case.title);

            request_repo::NewCaseRequest {
                kind: body.kind,
                client_id: client.id,
                lawyer_id: body.lawyer_id,
                case_id: Some(case_id),
                title,
                description: &body.description,
                category: None,
                defendant_id: None,
            }
        }
    };

    let request = request_repo::create(&pool, new).await?;
    tracing::info!(request_id = %request.id, kind = %request.kind, "case request submitted");
    Ok((StatusCode::CREATED, Json(CaseRequestResponse::from(request))))
}

#[utoipa::path(
    get,
    path = "/api/case-requests",
    params(CaseRequestListParams),
    responses(
        (status = 200, description = "Requests visible to the caller", body = Vec<CaseRequestResponse>),
        (status = 403, description = "Judges have no requests", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "case-requests"
)]
pub async fn list_requests(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(user): RequestParticipant,
    Query(params): Query<CaseRequestListParams>,
) -> Result<Json<Vec<CaseRequestResponse>>, AppError> {
    let scope = request_repo::request_scope(user.role)
        .ok_or_else(|| AppError::forbidden("Case requests are not available to judges"))?;
    let rows = request_repo::list(&pool, scope, user.id, &params).await?;
    Ok(Json(rows.into_iter().map(CaseRequestResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/case-requests/{id}",
    params(("id" = String, Path, description = "Case request UUID")),
    responses(
        (status = 200, description = "Case request", body = CaseRequestResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "case-requests"
)]
pub async fn get_request(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<CaseRequestResponse>, AppError> {
    let request = load_visible(&pool, &id, &user).await?;
    Ok(Json(CaseRequestResponse::from(request)))
}

/// Accepting a request returns the updated request plus the affected case.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct AcceptCaseRequestResponse {
    pub request: CaseRequestResponse,
    pub case: shared_types::CaseResponse,
}

#[utoipa::path(
    post,
    path = "/api/case-requests/{id}/accept",
    params(("id" = String, Path, description = "Case request UUID")),
    responses(
        (status = 200, description = "Accepted", body = AcceptCaseRequestResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Already answered", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "case-requests"
)]
#[tracing::instrument(skip(pool, lawyer), fields(lawyer_id = lawyer.id))]
pub async fn accept_request(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(lawyer): LawyerOnly,
    Path(id): Path<String>,
) -> Result<Json<AcceptCaseRequestResponse>, AppError> {
    let request = load_visible(&pool, &id, &lawyer).await?;
    if request.lawyer_id != lawyer.id {
        return Err(AppError::not_found(format!("Case request {id} not found")));
    }
    ensure_pending(&request, CaseRequestStatus::Accepted)?;

    let (request, case) = request_repo::accept(&pool, request.id, lawyer.id).await?;
    tracing::info!(request_id = %request.id, case_id = %case.id, "case request accepted");

    Ok(Json(AcceptCaseRequestResponse {
        request: CaseRequestResponse::from(request),
        case: case.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/case-requests/{id}/reject",
    request_body = RespondCaseRequest,
    params(("id" = String, Path, description = "Case request UUID")),
    responses(
        (status = 200, description = "Rejected", body = CaseRequestResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Already answered", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "case-requests"
)]
pub async fn reject_request(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(lawyer): LawyerOnly,
    Path(id): Path<String>,
    Json(body): Json<RespondCaseRequest>,
) -> Result<Json<CaseRequestResponse>, AppError> {
    let request = load_visible(&pool, &id, &lawyer).await?;
    if request.lawyer_id != lawyer.id {
        return Err(AppError::not_found(format!("Case request {id} not found")));
    }
    ensure_pending(&request, CaseRequestStatus::Rejected)?;

    let note = body.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let updated = request_repo::reject(&pool, request.id, lawyer.id, note)
        .await?
        .ok_or_else(|| AppError::conflict("Request has already been answered"))?;
    Ok(Json(CaseRequestResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/case-requests/{id}/withdraw",
    params(("id" = String, Path, description = "Case request UUID")),
    responses(
        (status = 200, description = "Withdrawn", body = CaseRequestResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Already answered", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "case-requests"
)]
pub async fn withdraw_request(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(client): ClientOnly,
    Path(id): Path<String>,
) -> Result<Json<CaseRequestResponse>, AppError> {
    let request = load_visible(&pool, &id, &client).await?;
    if request.client_id != client.id {
        return Err(AppError::not_found(format!("Case request {id} not found")));
    }
    ensure_pending(&request, CaseRequestStatus::Withdrawn)?;

    let updated = request_repo::withdraw(&pool, request.id, client.id)
        .await?
        .ok_or_else(|| AppError::conflict("Request has already been answered"))?;
    Ok(Json(CaseRequestResponse::from(updated)))
}
