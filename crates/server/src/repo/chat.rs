use chrono::{DateTime, Utc};
use shared_types::{
    ordered_pair, AppError, Chat, ChatMessage, ChatMessageResponse, ChatSummary, UserRole,
    UserSummary,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

const CHAT_COLUMNS: &str = "id, user_a, user_b, case_id, created_at, last_message_at";
const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, body, created_at";

/// Get the chat between two users, creating it on first contact.
/// The bool is `true` when the chat was created by this call.
pub async fn find_or_create(
    pool: &Pool<Postgres>,
    a: i64,
    b: i64,
    case_id: Option<Uuid>,
) -> Result<(Chat, bool), AppError> {
    let (user_a, user_b) = ordered_pair(a, b);

    let inserted = sqlx::query_as::<_, Chat>(&format!(
        r#"
        INSERT INTO chats (user_a, user_b, case_id) VALUES ($1, $2, $3)
        ON CONFLICT (user_a, user_b) DO NOTHING
        RETURNING {CHAT_COLUMNS}
        "#
    ))
    .bind(user_a)
    .bind(user_b)
    .bind(case_id)
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    if let Some(chat) = inserted {
        return Ok((chat, true));
    }

    let existing = sqlx::query_as::<_, Chat>(&format!(
        "SELECT {CHAT_COLUMNS} FROM chats WHERE user_a = $1 AND user_b = $2"
    ))
    .bind(user_a)
    .bind(user_b)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((existing, false))
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Chat>, AppError> {
    sqlx::query_as::<_, Chat>(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Load a chat the user takes part in, or 404.
pub async fn find_for_participant(
    pool: &Pool<Postgres>,
    id: Uuid,
    user_id: i64,
) -> Result<Chat, AppError> {
    find_by_id(pool, id)
        .await?
        .filter(|chat| chat.has_participant(user_id))
        .ok_or_else(|| AppError::not_found(format!("Chat {id} not found")))
}

#[derive(Debug, sqlx::FromRow)]
struct ChatListRow {
    id: Uuid,
    case_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    other_id: i64,
    other_name: String,
    other_role: String,
    other_bio: Option<String>,
    other_specialization: Option<String>,
    last_id: Option<Uuid>,
    last_sender_id: Option<i64>,
    last_body: Option<String>,
    last_created_at: Option<DateTime<Utc>>,
    unread_count: i64,
}

impl ChatListRow {
    fn into_summary(self) -> Result<ChatSummary, AppError> {
        let role = UserRole::parse(&self.other_role)
            .ok_or_else(|| AppError::internal(format!("Unknown role for user {}", self.other_id)))?;
        let last_message = match (self.last_id, self.last_sender_id, self.last_body, self.last_created_at) {
            (Some(id), Some(sender_id), Some(body), Some(at)) => Some(ChatMessageResponse {
                id: id.to_string(),
                chat_id: self.id.to_string(),
                sender_id,
                body,
                created_at: at.to_rfc3339(),
            }),
            _ => None,
        };
        Ok(ChatSummary {
            id: self.id.to_string(),
            other: UserSummary {
                id: self.other_id,
                display_name: self.other_name,
                role,
                email: None,
                bio: self.other_bio,
                specialization: self.other_specialization,
            },
            case_id: self.case_id.map(|id| id.to_string()),
            last_message,
            unread_count: self.unread_count,
            created_at: self.created_at.to_rfc3339(),
        })
    }
}

/// The user's chats, most recently active first.
pub async fn list_for_user(pool: &Pool<Postgres>, user_id: i64) -> Result<Vec<ChatSummary>, AppError> {
    summaries(pool, user_id, None).await
}

/// One chat as the participant `user_id` sees it in their list.
pub async fn summary_for(
    pool: &Pool<Postgres>,
    chat_id: Uuid,
    user_id: i64,
) -> Result<ChatSummary, AppError> {
    summaries(pool, user_id, Some(chat_id))
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found(format!("Chat {chat_id} not found")))
}

async fn summaries(
    pool: &Pool<Postgres>,
    user_id: i64,
    only: Option<Uuid>,
) -> Result<Vec<ChatSummary>, AppError> {
    let rows = sqlx::query_as::<_, ChatListRow>(
        r#"
        SELECT ch.id, ch.case_id, ch.created_at,
               u.id AS other_id, u.display_name AS other_name, u.role AS other_role,
               u.bio AS other_bio, u.specialization AS other_specialization,
               lm.id AS last_id, lm.sender_id AS last_sender_id,
               lm.body AS last_body, lm.created_at AS last_created_at,
               (SELECT COUNT(*) FROM messages m
                 WHERE m.chat_id = ch.id AND m.sender_id <> $1
                   AND m.created_at > COALESCE(r.last_read_at, '-infinity'::timestamptz)
               ) AS unread_count
        FROM chats ch
        JOIN users u ON u.id = CASE WHEN ch.user_a = $1 THEN ch.user_b ELSE ch.user_a END
        LEFT JOIN chat_reads r ON r.chat_id = ch.id AND r.user_id = $1
        LEFT JOIN LATERAL (
            SELECT id, sender_id, body, created_at FROM messages
            WHERE chat_id = ch.id ORDER BY created_at DESC, id DESC LIMIT 1
        ) lm ON TRUE
        WHERE (ch.user_a = $1 OR ch.user_b = $1)
          AND ($2::uuid IS NULL OR ch.id = $2)
        ORDER BY COALESCE(ch.last_message_at, ch.created_at) DESC, ch.id DESC
        "#,
    )
    .bind(user_id)
    .bind(only)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    rows.into_iter().map(ChatListRow::into_summary).collect()
}

/// A page of history, oldest first. `before` pages backwards in time.
pub async fn list_messages(
    pool: &Pool<Postgres>,
    chat_id: Uuid,
    before: Option<DateTime<Utc>>,
    limit: i64,
) -> Result<Vec<ChatMessage>, AppError> {
    let mut rows = sqlx::query_as::<_, ChatMessage>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages \
         WHERE chat_id = $1 AND ($2::timestamptz IS NULL OR created_at < $2) \
         ORDER BY created_at DESC, id DESC LIMIT $3"
    ))
    .bind(chat_id)
    .bind(before)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    rows.reverse();
    Ok(rows)
}

/// Append a message and bump the chat's activity time.
pub async fn insert_message(
    pool: &Pool<Postgres>,
    chat_id: Uuid,
    sender_id: i64,
    body: &str,
) -> Result<ChatMessage, AppError> {
    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;

    let message = sqlx::query_as::<_, ChatMessage>(&format!(
        "INSERT INTO messages (chat_id, sender_id, body) VALUES ($1, $2, $3) \
         RETURNING {MESSAGE_COLUMNS}"
    ))
    .bind(chat_id)
    .bind(sender_id)
    .bind(body)
    .fetch_one(&mut *tx)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    sqlx::query("UPDATE chats SET last_message_at = $2 WHERE id = $1")
        .bind(chat_id)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(message)
}

/// Mark everything in the chat as read for `user_id`.
pub async fn mark_read(pool: &Pool<Postgres>, chat_id: Uuid, user_id: i64) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO chat_reads (chat_id, user_id, last_read_at)
        VALUES ($1, $2, clock_timestamp())
        ON CONFLICT (chat_id, user_id) DO UPDATE SET last_read_at = EXCLUDED.last_read_at
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;
    Ok(())
}

/// Unread messages across all of the user's chats.
pub async fn unread_total(pool: &Pool<Postgres>, user_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages m
        JOIN chats ch ON ch.id = m.chat_id
        LEFT JOIN chat_reads r ON r.chat_id = ch.id AND r.user_id = $1
        WHERE (ch.user_a = $1 OR ch.user_b = $1)
          AND m.sender_id <> $1
          AND m.created_at > COALESCE(r.last_read_at, '-infinity'::timestamptz)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
