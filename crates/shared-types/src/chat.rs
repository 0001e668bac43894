use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserSummary;

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const DEFAULT_MESSAGE_PAGE: i64 = 50;
pub const MAX_MESSAGE_PAGE: i64 = 200;

/// Order a pair of participants the way chats are stored (`user_a < user_b`).
pub fn ordered_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Trim and bound a message body. Returns `None` when it is empty or too long.
pub fn normalize_message_body(body: &str) -> Option<&str> {
    let trimmed = body.trim();
    let chars = trimmed.chars().count();
    if chars == 0 || chars > MAX_MESSAGE_CHARS {
        None
    } else {
        Some(trimmed)
    }
}

/// A one-to-one conversation (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Chat {
    pub id: Uuid,
    pub user_a: i64,
    pub user_b: i64,
    pub case_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }
}

/// A message inside a chat (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatMessageResponse {
    pub id: String,
    pub chat_id: String,
    pub sender_id: i64,
    pub body: String,
    pub created_at: String,
}

impl From<ChatMessage> for ChatMessageResponse {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id.to_string(),
            chat_id: m.chat_id.to_string(),
            sender_id: m.sender_id,
            body: m.body,
            created_at: m.created_at.to_rfc3339(),
        }
    }
}

/// A chat as listed for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatSummary {
    pub id: String,
    pub other: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<ChatMessageResponse>,
    pub unread_count: i64,
    pub created_at: String,
}

/// Event pushed to live subscribers of a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageCreated { message: ChatMessageResponse },
}

impl ChatEvent {
    pub fn chat_id(&self) -> &str {
        match self {
            ChatEvent::MessageCreated { message } => &message.chat_id,
        }
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::MessageCreated { .. } => "message_created",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StartChatRequest {
    pub participant_id: i64,
    #[serde(default)]
    pub case_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendMessageRequest {
    pub body: String,
}

/// Cursor pagination over a chat's history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct MessageListParams {
    /// Only messages strictly older than this instant.
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl MessageListParams {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MESSAGE_PAGE)
            .clamp(1, MAX_MESSAGE_PAGE)
    }
}
