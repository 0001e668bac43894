use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    AppError, Hearing, HearingRescheduleResponse, HearingResponse, HearingSearchParams,
    HearingStatus, RescheduleHearingRequest, ScheduleHearingRequest, UpdateHearingStatusRequest,
    DEFAULT_HEARING_MINUTES, MAX_HEARING_MINUTES, MIN_HEARING_MINUTES,
};

use super::{parse_uuid, relabel_not_found};
use crate::access::CaseAccess;
use crate::auth::extractors::{AuthRequired, CurrentUser, RoleRequired, StaffOnly};
use crate::repo::{case as case_repo, hearing as hearing_repo};

fn ensure_future(at: DateTime<Utc>) -> Result<(), AppError> {
    if at > Utc::now() {
        Ok(())
    } else {
        Err(AppError::bad_request("scheduled_at must be in the future"))
    }
}

fn effective_duration(requested: Option<i32>) -> Result<i32, AppError> {
    let minutes = requested.unwrap_or(DEFAULT_HEARING_MINUTES);
    if (MIN_HEARING_MINUTES..=MAX_HEARING_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(AppError::bad_request(format!(
            "duration_minutes must be between {MIN_HEARING_MINUTES} and {MAX_HEARING_MINUTES}"
        )))
    }
}

/// Load a hearing whose case the caller can see, or 404.
async fn load_visible(
    pool: &Pool<Postgres>,
    user: &CurrentUser,
    id: Uuid,
) -> Result<Hearing, AppError> {
    let hearing = hearing_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Hearing {id} not found")))?;
    case_repo::find_visible(pool, &CaseAccess::of(user), hearing.case_id)
        .await
        .map_err(relabel_not_found(|| {
            AppError::not_found(format!("Hearing {id} not found"))
        }))?;
    Ok(hearing)
}

#[utoipa::path(
    post,
    path = "/api/cases/{id}/hearings",
    request_body = ScheduleHearingRequest,
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 201, description = "Hearing scheduled", body = HearingResponse),
        (status = 400, description = "Invalid time or duration", body = AppError),
        (status = 404, description = "Case not found", body = AppError),
        (status = 409, description = "Case does not accept hearings", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
#[tracing::instrument(skip(pool, staff, body), fields(user_id = staff.id))]
pub async fn schedule_hearing(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(staff): StaffOnly,
    Path(id): Path<String>,
    Json(body): Json<ScheduleHearingRequest>,
) -> Result<(StatusCode, Json<HearingResponse>), AppError> {
    let case_id = parse_uuid(&id)?;
    // Judges only see cases assigned to them, so this also gates the judge.
    case_repo::find_visible(&pool, &CaseAccess::of(&staff), case_id).await?;

    ensure_future(body.scheduled_at)?;
    let duration_minutes = effective_duration(body.duration_minutes)?;
    if body.courtroom.trim().is_empty() {
        return Err(AppError::bad_request("courtroom must not be empty"));
    }
    if body.purpose.trim().is_empty() {
        return Err(AppError::bad_request("purpose must not be empty"));
    }

    let hearing = hearing_repo::schedule(
        &pool,
        hearing_repo::NewHearing {
            case_id,
            scheduled_at: body.scheduled_at,
            duration_minutes,
            courtroom: &body.courtroom,
            purpose: &body.purpose,
            created_by: staff.id,
        },
    )
    .await?;

    tracing::info!(hearing_id = %hearing.id, case_id = %case_id, "hearing scheduled");
    Ok((StatusCode::CREATED, Json(HearingResponse::from(hearing))))
}

#[utoipa::path(
    get,
    path = "/api/cases/{id}/hearings",
    params(("id" = String, Path, description = "Case UUID")),
    responses(
        (status = 200, description = "Hearings of the case in time order", body = Vec<HearingResponse>),
        (status = 404, description = "Case not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
pub async fn list_case_hearings(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Vec<HearingResponse>>, AppError> {
    let case_id = parse_uuid(&id)?;
    case_repo::find_visible(&pool, &CaseAccess::of(&user), case_id).await?;
    let rows = hearing_repo::list_by_case(&pool, case_id).await?;
    Ok(Json(rows.into_iter().map(HearingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/hearings",
    params(HearingSearchParams),
    responses(
        (status = 200, description = "Hearings on visible cases", body = Vec<HearingResponse>),
        (status = 400, description = "Invalid status filter", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
pub async fn search_hearings(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Query(params): Query<HearingSearchParams>,
) -> Result<Json<Vec<HearingResponse>>, AppError> {
    if let Some(ref status) = params.status {
        if HearingStatus::parse(status).is_none() {
            return Err(AppError::bad_request(format!("Invalid status: {status}")));
        }
    }
    let rows = hearing_repo::search(&pool, &CaseAccess::of(&user), &params).await?;
    Ok(Json(rows.into_iter().map(HearingResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/hearings/{id}",
    params(("id" = String, Path, description = "Hearing UUID")),
    responses(
        (status = 200, description = "Hearing with reschedule history", body = HearingResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
pub async fn get_hearing(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<HearingResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let hearing = load_visible(&pool, &user, uuid).await?;
    let history = hearing_repo::history(&pool, uuid).await?;

    let mut response = HearingResponse::from(hearing);
    response.history = Some(history.into_iter().map(HearingRescheduleResponse::from).collect());
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/hearings/{id}/history",
    params(("id" = String, Path, description = "Hearing UUID")),
    responses(
        (status = 200, description = "Reschedule history, oldest first", body = Vec<HearingRescheduleResponse>),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
pub async fn hearing_history(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Vec<HearingRescheduleResponse>>, AppError> {
    let uuid = parse_uuid(&id)?;
    load_visible(&pool, &user, uuid).await?;
    let history = hearing_repo::history(&pool, uuid).await?;
    Ok(Json(history.into_iter().map(HearingRescheduleResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/hearings/{id}/reschedule",
    request_body = RescheduleHearingRequest,
    params(("id" = String, Path, description = "Hearing UUID")),
    responses(
        (status = 200, description = "Hearing moved", body = HearingResponse),
        (status = 400, description = "Invalid time or empty reason", body = AppError),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Hearing is no longer scheduled", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
#[tracing::instrument(skip(pool, staff, body), fields(user_id = staff.id))]
pub async fn reschedule_hearing(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(staff): StaffOnly,
    Path(id): Path<String>,
    Json(body): Json<RescheduleHearingRequest>,
) -> Result<Json<HearingResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    load_visible(&pool, &staff, uuid).await?;

    ensure_future(body.scheduled_at)?;
    if body.reason.trim().is_empty() {
        return Err(AppError::bad_request("reason must not be empty"));
    }

    let (hearing, entry) =
        hearing_repo::reschedule(&pool, uuid, body.scheduled_at, &body.reason, staff.id).await?;
    tracing::info!(hearing_id = %hearing.id, sequence = entry.sequence, "hearing rescheduled");

    let history = hearing_repo::history(&pool, uuid).await?;
    let mut response = HearingResponse::from(hearing);
    response.history = Some(history.into_iter().map(HearingRescheduleResponse::from).collect());
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/hearings/{id}/status",
    request_body = UpdateHearingStatusRequest,
    params(("id" = String, Path, description = "Hearing UUID")),
    responses(
        (status = 200, description = "Status updated", body = HearingResponse),
        (status = 404, description = "Not found", body = AppError),
        (status = 409, description = "Hearing is no longer scheduled", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "hearings"
)]
#[tracing::instrument(skip(pool, staff, body), fields(user_id = staff.id))]
pub async fn update_hearing_status(
    State(pool): State<Pool<Postgres>>,
    RoleRequired(staff): StaffOnly,
    Path(id): Path<String>,
    Json(body): Json<UpdateHearingStatusRequest>,
) -> Result<Json<HearingResponse>, AppError> {
    let uuid = parse_uuid(&id)?;
    let hearing = load_visible(&pool, &staff, uuid).await?;

    let current = HearingStatus::parse(&hearing.status)
        .ok_or_else(|| AppError::internal(format!("Unknown hearing status: {}", hearing.status)))?;
    if !current.can_transition_to(body.status) {
        return Err(AppError::conflict(format!(
            "Hearing cannot move from {} to {}",
            current.as_str(),
            body.status.as_str()
        )));
    }

    let notes = body.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let updated = hearing_repo::update_status(&pool, uuid, body.status, notes)
        .await?
        .ok_or_else(|| AppError::conflict("Hearing is no longer scheduled"))?;
    Ok(Json(HearingResponse::from(updated)))
}
