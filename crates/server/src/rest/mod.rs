pub mod auth;
pub mod case;
pub mod case_request;
pub mod chat;
pub mod dashboard;
pub mod evidence;
pub mod hearing;
pub mod user;

use axum::{routing::{get, patch, post, put}, Router};
use shared_types::{AppError, AppErrorKind};
use uuid::Uuid;

use crate::db::AppState;

/// Parse a UUID path segment, rejecting malformed ids with 400.
pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("Invalid UUID format"))
}

/// Parse a numeric user id path segment.
pub(crate) fn parse_user_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::bad_request("Invalid user id"))
}

/// Swap a parent case's 404 for the child record's own 404. Any other
/// failure passes through untouched.
pub(crate) fn relabel_not_found(
    not_found: impl FnOnce() -> AppError,
) -> impl FnOnce(AppError) -> AppError {
    move |err| match err.kind {
        AppErrorKind::NotFound => not_found(),
        _ => err,
    }
}

/// Credential endpoints. Kept separate so they can carry their own rate limit.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
}

/// Build the domain REST router (everything except the credential endpoints).
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Users
        .route("/api/users", post(user::create_user))
        .route("/api/users/me", get(user::get_profile).put(user::update_profile))
        .route("/api/users/{id}", get(user::get_user))
        .route("/api/lawyers", get(user::list_lawyers))
        .route("/api/judges", get(user::list_judges))
        // Case requests
        .route("/api/case-requests", get(case_request::list_requests).post(case_request::submit_request))
        .route("/api/case-requests/{id}", get(case_request::get_request))
        .route("/api/case-requests/{id}/accept", post(case_request::accept_request))
        .route("/api/case-requests/{id}/reject", post(case_request::reject_request))
        .route("/api/case-requests/{id}/withdraw", post(case_request::withdraw_request))
        // Cases
        .route("/api/cases/statistics", get(case::case_statistics))
        .route("/api/cases", get(case::search_cases).post(case::create_case))
        .route("/api/cases/{id}", get(case::get_case).patch(case::update_case))
        .route("/api/cases/{id}/review", post(case::review_case))
        .route("/api/cases/{id}/judge", put(case::assign_judge))
        .route("/api/cases/{id}/verdict", post(case::issue_verdict))
        // Hearings
        .route("/api/cases/{id}/hearings", get(hearing::list_case_hearings).post(hearing::schedule_hearing))
        .route("/api/hearings", get(hearing::search_hearings))
        .route("/api/hearings/{id}", get(hearing::get_hearing))
        .route("/api/hearings/{id}/history", get(hearing::hearing_history))
        .route("/api/hearings/{id}/reschedule", post(hearing::reschedule_hearing))
        .route("/api/hearings/{id}/status", patch(hearing::update_hearing_status))
        // Evidence
        .route("/api/cases/{id}/evidence", get(evidence::list_case_evidence).post(evidence::submit_evidence))
        .route("/api/evidence/{id}", get(evidence::get_evidence).delete(evidence::delete_evidence))
        // Chats
        .route("/api/chats", get(chat::list_chats).post(chat::start_chat))
        .route("/api/chats/{id}/messages", get(chat::list_messages).post(chat::send_message))
        .route("/api/chats/{id}/read", post(chat::mark_read))
        .route("/api/chats/{id}/stream", get(chat::stream_chat))
        // Dashboard
        .route("/api/dashboard", get(dashboard::get_dashboard))
}

/// Build the full REST router with rate limiting applied to the credential endpoints.
pub fn api_router_with_rate_limit(
    rate_limit: crate::rate_limit::RateLimitState,
) -> Router<AppState> {
    auth_router()
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            crate::rate_limit::rate_limit_middleware,
        ))
        .merge(api_router())
}
