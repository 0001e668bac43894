use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::Stream;
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_message_body, AppError, ChatEvent, ChatMessageResponse, ChatSummary,
    MessageListParams, SendMessageRequest, StartChatRequest, MAX_MESSAGE_CHARS,
};

use super::parse_uuid;
use crate::access::CaseAccess;
use crate::auth::extractors::AuthRequired;
use crate::realtime::{chat_event_stream, ChatHub};
use crate::repo::{case as case_repo, chat as chat_repo, user as user_repo};

#[utoipa::path(
    post,
    path = "/api/chats",
    request_body = StartChatRequest,
    responses(
        (status = 200, description = "Existing chat", body = ChatSummary),
        (status = 201, description = "Chat created", body = ChatSummary),
        (status = 400, description = "Cannot chat with yourself", body = AppError),
        (status = 404, description = "Unknown participant", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
#[tracing::instrument(skip(pool, user, body), fields(user_id = user.id))]
pub async fn start_chat(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Json(body): Json<StartChatRequest>,
) -> Result<(StatusCode, Json<ChatSummary>), AppError> {
    if body.participant_id == user.id {
        return Err(AppError::bad_request("Cannot start a chat with yourself"));
    }
    user_repo::find_by_id(&pool, body.participant_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", body.participant_id)))?;
    if let Some(case_id) = body.case_id {
        case_repo::find_visible(&pool, &CaseAccess::of(&user), case_id).await?;
    }

    let (chat, created) =
        chat_repo::find_or_create(&pool, user.id, body.participant_id, body.case_id).await?;
    let summary = chat_repo::summary_for(&pool, chat.id, user.id).await?;

    let status = if created {
        tracing::info!(chat_id = %chat.id, "chat created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(summary)))
}

#[utoipa::path(
    get,
    path = "/api/chats",
    responses(
        (status = 200, description = "Caller's chats, most recent first", body = Vec<ChatSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn list_chats(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
) -> Result<Json<Vec<ChatSummary>>, AppError> {
    Ok(Json(chat_repo::list_for_user(&pool, user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/chats/{id}/messages",
    params(("id" = String, Path, description = "Chat UUID"), MessageListParams),
    responses(
        (status = 200, description = "Messages, oldest first", body = Vec<ChatMessageResponse>),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn list_messages(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Query(params): Query<MessageListParams>,
) -> Result<Json<Vec<ChatMessageResponse>>, AppError> {
    let chat_id = parse_uuid(&id)?;
    chat_repo::find_for_participant(&pool, chat_id, user.id).await?;
    let rows =
        chat_repo::list_messages(&pool, chat_id, params.before, params.effective_limit()).await?;
    Ok(Json(rows.into_iter().map(ChatMessageResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/chats/{id}/messages",
    request_body = SendMessageRequest,
    params(("id" = String, Path, description = "Chat UUID")),
    responses(
        (status = 201, description = "Message sent", body = ChatMessageResponse),
        (status = 400, description = "Empty or oversized body", body = AppError),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
#[tracing::instrument(skip(pool, hub, user, body), fields(user_id = user.id))]
pub async fn send_message(
    State(pool): State<Pool<Postgres>>,
    State(hub): State<ChatHub>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessageResponse>), AppError> {
    let chat_id = parse_uuid(&id)?;
    chat_repo::find_for_participant(&pool, chat_id, user.id).await?;

    let text = normalize_message_body(&body.body).ok_or_else(|| {
        AppError::bad_request(format!(
            "Message must be between 1 and {MAX_MESSAGE_CHARS} characters"
        ))
    })?;

    let message = chat_repo::insert_message(&pool, chat_id, user.id, text).await?;
    let response = ChatMessageResponse::from(message);

    let delivered = hub.publish(ChatEvent::MessageCreated {
        message: response.clone(),
    });
    tracing::debug!(chat_id = %chat_id, delivered, "message published");

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/chats/{id}/read",
    params(("id" = String, Path, description = "Chat UUID")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn mark_read(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let chat_id = parse_uuid(&id)?;
    chat_repo::find_for_participant(&pool, chat_id, user.id).await?;
    chat_repo::mark_read(&pool, chat_id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/chats/{id}/stream",
    params(("id" = String, Path, description = "Chat UUID")),
    responses(
        (status = 200, description = "Server-sent chat events", content_type = "text/event-stream", body = ChatEvent),
        (status = 404, description = "Not found", body = AppError)
    ),
    security(("bearer_auth" = [])),
    tag = "chats"
)]
pub async fn stream_chat(
    State(pool): State<Pool<Postgres>>,
    State(hub): State<ChatHub>,
    AuthRequired(user): AuthRequired,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let chat_id = parse_uuid(&id)?;
    chat_repo::find_for_participant(&pool, chat_id, user.id).await?;

    // Subscribe before returning so nothing sent after this point is missed.
    let rx = hub.subscribe();
    tracing::debug!(chat_id = %chat_id, user_id = user.id, "chat stream opened");
    Ok(Sse::new(chat_event_stream(rx, chat_id.to_string())).keep_alive(KeepAlive::default()))
}
