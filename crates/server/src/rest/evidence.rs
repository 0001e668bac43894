use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    is_valid_evidence_type, AppError, CreateEvidenceRequest, EvidenceResponse, EVIDENCE_TYPES,
};

use super::{parse_uuid, relabel_not_found};
use crate::access::CaseAccess;
use crate::auth::extractors::{AuthRequired, Litigant, RoleRequired};
use crate::error_convert::ValidateRequest;
use crate::repo::{case as case_repo, evidence as evidence_repo};

#[utoipa::path(
    post,
    path = "/api/cases/{id}/evidence",
    request_body = CreateEvidenceRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 201, description = "Evidence submitted", body = EvidenceResponse),
        (status = 400, description = "Invalid evidence type", body = AppError),
        (status = 403, description = "Not on either side of the case", body = AppError),
        (status = 404, description = "Case not found", body = AppError),
        (status = 409, description = "Case is closed or rejected", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "evidence"
)]
#[tracing::instrument(skip(pool, user, body), fields(user_id = user.id))]
pub async fn submit_evidence(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(user): Litigant,
    Path(id): Path<String>,
    Json(body): Json<CreateEvidenceRequest>,
) -> Result<(StatusCode, Json<EvidenceResponse>), AppError> {
    let case_id = parse_uuid(&id)?;
    let case = case_repo::find_visible(&pool, &CaseAccess::of(&user), case_id).await?;
    let side = case
        .side_of(user.id)
        .ok_or_else(|| AppError::forbidden("Only parties and their counsel can submit evidence"))?;
    if case.status()?.is_terminal() {
        return Err(AppError::conflict(format!("Case is {}", case.status)));
    }

    body.validate_request()?;
    if !is_valid_evidence_type(&body.evidence_type) {
        return Err(AppError::bad_request(format!(
            "Invalid evidence_type: {}. Valid values: {}",
            body.evidence_type,
            EVIDENCE_TYPES.join(", ")
        )));
    }

    let evidence = evidence_repo::create(&pool, case_id, user.id, side, &body).await?;
    tracing::info!(evidence_id = %evidence.id, side = side.as_str(), "evidence submitted");
    Ok((StatusCode::CREATED, Json(EvidenceResponse::from(evidence))))
}

#[utoipa::path(
    get,
    path = "/api/cases/{id}/evidence",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Evidence on the case", body = Vec<EvidenceResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "evidence"
)]
pub async fn list_case_evidence(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Vec<EvidenceResponse>>, AppError> {
    let case_id = parse_uuid(&id)?;
    case_repo::find_visible(&pool, &CaseAccess::of(&user), case_id).await?;
    let rows = evidence_repo::list_by_case(&pool, case_id).await?;
    Ok(Json(rows.into_iter().map(EvidenceResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/evidence/{id}",
    params(("id" = String, Path, description = "Evidence UUID")),
    responses(
        (status = 200, description = "Evidence", body = EvidenceResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "evidence"
)]
pub async fn get_evidence(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<EvidenceResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let not_found = || AppError::not_found(format!("Evidence {id} not found"));

    let evidence = evidence_repo::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(not_found)?;
    case_repo::find_visible(&pool, &CaseAccess::of(&user), evidence.case_id)
        .await
        .map_err(relabel_not_found(not_found))?;
    Ok(Json(EvidenceResponse::from(evidence)))
}

#[utoipa::path(
    delete,
    path = "/api/evidence/{id}",
    params(("id" = String, Path, description = "Evidence UUID")),
    responses(
        (status = 204, description = "Evidence deleted"),
        (status = 403, description = "Not the submitter", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Case is closed or rejected", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "evidence"
)]
#[tracing::instrument(skip(pool, user), fields(user_id = user.id))]
pub async fn delete_evidence(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_uuid(&id)?;
    let not_found = || AppError::not_found(format!("Evidence {id} not found"));

    let evidence = evidence_repo::find_by_id(&pool, uuid)
        .await?
        .ok_or_else(not_found)?;
    case_repo::find_visible(&pool, &CaseAccess::of(&user), evidence.case_id)
        .await
        .map_err(relabel_not_found(not_found))?;
    if evidence.submitted_by != user.id {
        return Err(AppError::forbidden("Only the submitter can delete evidence"));
    }

    if evidence_repo::delete(&pool, uuid, user.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::conflict("Evidence on a closed or rejected case cannot be deleted"))
    }
}
