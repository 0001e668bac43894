use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_valid_case_category, normalize_pagination, validate_parties, AppError, AssignJudgeRequest,
    CaseResponse, CaseSearchParams, CaseStatistics, CaseStatus, CreateCaseRequest,
    IssueVerdictRequest, PaginatedResponse, ReviewCaseRequest, UpdateCaseRequest, UserRole,
    CASE_CATEGORIES,
};

use super::parse_uuid;
use crate::access::CaseAccess;
use crate::auth::extractors::{AuthRequired, ClerkOnly, JudgeOnly, LawyerOnly, RoleRequired};
use crate::error_convert::ValidateRequest;
use crate::repo::{case as case_repo, user as user_repo};

fn check_category(category: &str) -> Result<(), AppError> {
    if is_valid_case_category(category) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "Invalid category: {category}. Valid values: {}",
            CASE_CATEGORIES.join(", ")
        )))
    }
}

#[utoipa::path(
    post,
    path = "/api/cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case filed", body = CaseResponse),
        (status = 400, description = "Invalid parties or category", body = AppError),
        (status = 403, description = "Lawyers only", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, lawyer, body), fields(lawyer_id = lawyer.id))]
pub async fn create_case(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(lawyer): LawyerOnly,
    Json(body): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<CaseResponse>), AppError> {
    body.validate_request()?;
    if body.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    check_category(&body.category)?;
    validate_parties(body.plaintiff_id, body.defendant_id, Some(lawyer.id), None)?;
    user_repo::require_role(&pool, body.plaintiff_id, UserRole::Client, "plaintiff_id").await?;
    user_repo::require_role(&pool, body.defendant_id, UserRole::Client, "defendant_id").await?;

    let case = case_repo::create(
        &pool,
        case_repo::NewCase {
            title: &body.title,
            description: &body.description,
            category: &body.category,
            plaintiff_id: body.plaintiff_id,
            defendant_id: body.defendant_id,
            plaintiff_lawyer_id: lawyer.id,
        },
    )
    .await?;

    tracing::info!(case_number = %case.case_number, "case filed");
    Ok((StatusCode::CREATED, Json(CaseResponse::from(case))))
}

#[utoipa::path(
    get,
    path = "/api/cases",
    params(CaseSearchParams),
    responses(
        (status = 200, description = "Cases visible to the caller", body = PaginatedResponse<CaseResponse>),
        (status = 400, description = "Invalid filter", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn search_cases(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<CaseSearchParams>,
) -> Result<Json<PaginatedResponse<CaseResponse>>, AppError> {
    if let Some(ref status) = params.status {
        if CaseStatus::parse(status).is_none() {
            return Err(AppError::bad_request(format!("Invalid status: {status}")));
        }
    }
    if let Some(ref category) = params.category {
        check_category(category)?;
    }

    let (page, limit) = normalize_pagination(params.page, params.limit);
    let access = CaseAccess::of(&user);
    let (rows, total) = case_repo::search(&pool, &access, &params, page, limit).await?;

    Ok(Json(
        PaginatedResponse::new(rows, page, limit, total).map(CaseResponse::from),
    ))
}

#[utoipa::path(
    get,
    path = "/api/cases/statistics",
    responses(
        (status = 200, description = "Case counts per status", body = CaseStatistics)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn case_statistics(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<CaseStatistics>, AppError> {
    let by_status = case_repo::count_by_status(&pool, &CaseAccess::of(&user)).await?;
    let total = by_status.iter().map(|s| s.count).sum();
    Ok(Json(CaseStatistics { total, by_status }))
}

#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case", body = CaseResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn get_case(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = case_repo::find_visible(&pool, &CaseAccess::of(&user), uuid).await?;
    Ok(Json(CaseResponse::from(case)))
}

#[utoipa::path(
    patch,
    path = "/api/cases/{id}",
    request_body = UpdateCaseRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case updated", body = CaseResponse),
        (status = 403, description = "Not the filing lawyer", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case already reviewed", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, lawyer, body), fields(lawyer_id = lawyer.id))]
pub async fn update_case(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(lawyer): LawyerOnly,
    Path(id): Path<String>,
    Json(body): Json<UpdateCaseRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = case_repo::find_visible(&pool, &CaseAccess::of(&lawyer), uuid).await?;
    if case.plaintiff_lawyer_id != Some(lawyer.id) {
        return Err(AppError::forbidden("Only the filing lawyer can edit this case"));
    }
    if case.status()? != CaseStatus::Pending {
        return Err(AppError::conflict("Only pending cases can be edited"));
    }
    if let Some(ref title) = body.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
    }
    if let Some(ref category) = body.category {
        check_category(category)?;
    }

    let updated = case_repo::update_details(&pool, uuid, &body)
        .await?
        .ok_or_else(|| AppError::conflict("Only pending cases can be edited"))?;
    Ok(Json(CaseResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/cases/{id}/review",
    request_body = ReviewCaseRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case reviewed", body = CaseResponse),
        (status = 400, description = "Approval without a judge", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case already reviewed", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, clerk, body), fields(clerk_id = clerk.id))]
pub async fn review_case(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(clerk): ClerkOnly,
    Path(id): Path<String>,
    Json(body): Json<ReviewCaseRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = case_repo::find_visible(&pool, &CaseAccess::of(&clerk), uuid).await?;

    let next = if body.approved {
        CaseStatus::Approved
    } else {
        CaseStatus::Rejected
    };
    case.status()?.ensure_transition(next)?;

    let judge_id = if body.approved {
        let judge_id = body
            .judge_id
            .ok_or_else(|| AppError::bad_request("judge_id is required to approve a case"))?;
        user_repo::require_role(&pool, judge_id, UserRole::Judge, "judge_id").await?;
        Some(judge_id)
    } else {
        None
    };

    let note = body.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let reviewed = case_repo::review(&pool, uuid, body.approved, judge_id, note)
        .await?
        .ok_or_else(|| AppError::conflict("Case has already been reviewed"))?;

    tracing::info!(case_number = %reviewed.case_number, status = %reviewed.status, "case reviewed");
    Ok(Json(CaseResponse::from(reviewed)))
}

#[utoipa::path(
    put,
    path = "/api/cases/{id}/judge",
    request_body = AssignJudgeRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Judge assigned", body = CaseResponse),
        (status = 400, description = "Not a judge", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case is closed or rejected", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, clerk, body), fields(clerk_id = clerk.id))]
pub async fn assign_judge(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(clerk): ClerkOnly,
    Path(id): Path<String>,
    Json(body): Json<AssignJudgeRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = case_repo::find_visible(&pool, &CaseAccess::of(&clerk), uuid).await?;
    if case.status()?.is_terminal() {
        return Err(AppError::conflict(format!("Case is {}", case.status)));
    }
    user_repo::require_role(&pool, body.judge_id, UserRole::Judge, "judge_id").await?;

    let updated = case_repo::assign_judge(&pool, uuid, body.judge_id)
        .await?
        .ok_or_else(|| AppError::conflict("Case is no longer open"))?;
    Ok(Json(CaseResponse::from(updated)))
}

#[utoipa::path(
    post,
    path = "/api/cases/{id}/verdict",
    request_body = IssueVerdictRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Case closed", body = CaseResponse),
        (status = 400, description = "Empty summary", body = AppError),
        (status = 404, description = "Not found or not assigned", body = AppError),
        (status = 409, description = "Case not open", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
#[tracing::instrument(skip(pool, judge, body), fields(judge_id = judge.id))]
pub async fn issue_verdict(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(judge): JudgeOnly,
    Path(id): Path<String>,
    Json(body): Json<IssueVerdictRequest>,
) -> Result<Json<CaseResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let case = case_repo::find_visible(&pool, &CaseAccess::of(&judge), uuid).await?;
    if body.summary.trim().is_empty() {
        return Err(AppError::bad_request("summary must not be empty"));
    }
    case.status()?.ensure_transition(CaseStatus::Closed)?;

    let (closed, cancelled) =
        case_repo::close_with_verdict(&pool, uuid, judge.id, body.outcome, &body.summary)
            .await?
            .ok_or_else(|| AppError::conflict("Case is no longer open"))?;

    tracing::info!(
        case_number = %closed.case_number,
        outcome = body.outcome.as_str(),
        cancelled_hearings = cancelled,
        "verdict issued"
    );
    Ok(Json(CaseResponse::from(closed)))
}
