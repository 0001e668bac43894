use axum::Router;
use shared_types::{
    // Accounts
    AppError, AppErrorKind, AuthResponse, AuthUser, CreateUserRequest, LoginRequest,
    RefreshRequest, RegisterRequest, UpdateProfileRequest, UserRole, UserSummary,
    // Common types
    PaginationMeta, StatusCount,
    // Case request types
    CaseRequestKind, CaseRequestResponse, CaseRequestStatus, RespondCaseRequest,
    SubmitCaseRequest,
    // Case types
    AssignJudgeRequest, CaseResponse, CaseStatistics, CaseStatus, CreateCaseRequest,
    IssueVerdictRequest, ReviewCaseRequest, Side, UpdateCaseRequest, VerdictOutcome,
    VerdictResponse,
    // Hearing types
    HearingRescheduleResponse, HearingResponse, HearingStatus, RescheduleHearingRequest,
    ScheduleHearingRequest, UpdateHearingStatusRequest,
    // Evidence types
    CreateEvidenceRequest, EvidenceResponse,
    // Chat types
    ChatEvent, ChatMessageResponse, ChatSummary, SendMessageRequest, StartChatRequest,
    // Dashboard
    DashboardStats,
};
use sqlx::{Pool, Postgres};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health::{self, HealthResponse};
use crate::rest;
use crate::rest::case_request::AcceptCaseRequestResponse;

/// Registers the `bearer_auth` scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        rest::auth::register,
        rest::auth::login,
        rest::auth::refresh,
        rest::auth::logout,
        rest::auth::me,
        // Users
        rest::user::get_profile,
        rest::user::update_profile,
        rest::user::get_user,
        rest::user::list_lawyers,
        rest::user::list_judges,
        rest::user::create_user,
        // Case requests
        rest::case_request::submit_request,
        rest::case_request::list_requests,
        rest::case_request::get_request,
        rest::case_request::accept_request,
        rest::case_request::reject_request,
        rest::case_request::withdraw_request,
        // Cases
        rest::case::create_case,
        rest::case::search_cases,
        rest::case::case_statistics,
        rest::case::get_case,
        rest::case::update_case,
        rest::case::review_case,
        rest::case::assign_judge,
        rest::case::issue_verdict,
        // Hearings
        rest::hearing::schedule_hearing,
        rest::hearing::list_case_hearings,
        rest::hearing::search_hearings,
        rest::hearing::get_hearing,
        rest::hearing::hearing_history,
        rest::hearing::reschedule_hearing,
        rest::hearing::update_hearing_status,
        // Evidence
        rest::evidence::submit_evidence,
        rest::evidence::list_case_evidence,
        rest::evidence::get_evidence,
        rest::evidence::delete_evidence,
        // Chats
        rest::chat::start_chat,
        rest::chat::list_chats,
        rest::chat::list_messages,
        rest::chat::send_message,
        rest::chat::mark_read,
        rest::chat::stream_chat,
        // Dashboard
        rest::dashboard::get_dashboard,
        // Health
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind,
        AuthResponse, AuthUser, CreateUserRequest, LoginRequest, RefreshRequest,
        RegisterRequest, UpdateProfileRequest, UserRole, UserSummary,
        PaginationMeta, StatusCount,
        CaseRequestKind, CaseRequestResponse, CaseRequestStatus, RespondCaseRequest,
        SubmitCaseRequest, AcceptCaseRequestResponse,
        AssignJudgeRequest, CaseResponse, CaseStatistics, CaseStatus, CreateCaseRequest,
        IssueVerdictRequest, ReviewCaseRequest, Side, UpdateCaseRequest, VerdictOutcome,
        VerdictResponse,
        HearingRescheduleResponse, HearingResponse, HearingStatus, RescheduleHearingRequest,
        ScheduleHearingRequest, UpdateHearingStatusRequest,
        CreateEvidenceRequest, EvidenceResponse,
        ChatEvent, ChatMessageResponse, ChatSummary, SendMessageRequest, StartChatRequest,
        DashboardStats,
        HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "users", description = "Profiles and user directories"),
        (name = "case-requests", description = "Client requests for representation"),
        (name = "cases", description = "Case filing, review and verdicts"),
        (name = "hearings", description = "Hearing calendar and rescheduling history"),
        (name = "evidence", description = "Exhibits submitted by either side"),
        (name = "chats", description = "One-to-one messaging with live updates"),
        (name = "dashboard", description = "Role-scoped landing-page numbers"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "CourtWise API",
        description = "Court case management: representation requests, cases, hearings, evidence and messaging",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build the HTTP app: REST routes, health check and API docs.
///
/// Credential endpoints are rate limited per client address using
/// `AUTH_RATE_LIMIT`. The auth middleware that decodes bearer tokens is
/// applied by the caller so tests and `main` share the same wiring.
pub fn api_router(pool: Pool<Postgres>) -> Router {
    let state = AppState::new(pool);
    let (max_requests, window) = crate::config::auth_rate_limit();
    let rate_limit = crate::rate_limit::RateLimitState::new(max_requests, window);

    Router::new()
        .merge(rest::api_router_with_rate_limit(rate_limit))
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
