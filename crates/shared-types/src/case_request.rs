use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppError;

/// What a client is asking a lawyer for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseRequestKind {
    /// Represent the client as plaintiff in a case that does not exist yet.
    NewCase,
    /// Defend the client in an existing case where they are the defendant.
    Defense,
}

impl CaseRequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseRequestKind::NewCase => "new_case",
            CaseRequestKind::Defense => "defense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_case" => Some(CaseRequestKind::NewCase),
            "defense" => Some(CaseRequestKind::Defense),
            _ => None,
        }
    }
}

/// Review state of a case request. Only `Pending` can change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl CaseRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseRequestStatus::Pending => "pending",
            CaseRequestStatus::Accepted => "accepted",
            CaseRequestStatus::Rejected => "rejected",
            CaseRequestStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CaseRequestStatus::Pending),
            "accepted" => Some(CaseRequestStatus::Accepted),
            "rejected" => Some(CaseRequestStatus::Rejected),
            "withdrawn" => Some(CaseRequestStatus::Withdrawn),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: CaseRequestStatus) -> bool {
        *self == CaseRequestStatus::Pending && next != CaseRequestStatus::Pending
    }
}

/// A client-to-lawyer representation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CaseRequest {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub client_id: i64,
    pub lawyer_id: i64,
    pub case_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub defendant_id: Option<i64>,
    pub response_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl CaseRequest {
    pub fn kind(&self) -> Result<CaseRequestKind, AppError> {
        CaseRequestKind::parse(&self.kind)
            .ok_or_else(|| AppError::internal(format!("Unknown request kind: {}", self.kind)))
    }

    pub fn status(&self) -> Result<CaseRequestStatus, AppError> {
        CaseRequestStatus::parse(&self.status)
            .ok_or_else(|| AppError::internal(format!("Unknown request status: {}", self.status)))
    }
}

/// API response for a case request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseRequestResponse {
    pub id: String,
    pub kind: String,
    pub status: String,
    pub client_id: i64,
    pub lawyer_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defendant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_note: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<String>,
}

impl From<CaseRequest> for CaseRequestResponse {
    fn from(r: CaseRequest) -> Self {
        Self {
            id: r.id.to_string(),
            kind: r.kind,
            status: r.status,
            client_id: r.client_id,
            lawyer_id: r.lawyer_id,
            case_id: r.case_id.map(|id| id.to_string()),
            title: r.title,
            description: r.description,
            category: r.category,
            defendant_id: r.defendant_id,
            response_note: r.response_note,
            created_at: r.created_at.to_rfc3339(),
            responded_at: r.responded_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Client submitting a request to a lawyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubmitCaseRequest {
    pub lawyer_id: i64,
    pub kind: CaseRequestKind,
    /// Required for `defense`.
    #[serde(default)]
    pub case_id: Option<Uuid>,
    /// Required for `new_case`; defaults to the case title for `defense`.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Required for `new_case`.
    #[serde(default)]
    pub category: Option<String>,
    /// Required for `new_case`.
    #[serde(default)]
    pub defendant_id: Option<i64>,
}

/// Lawyer declining a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RespondCaseRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Query parameters for listing requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CaseRequestListParams {
    pub status: Option<String>,
    pub kind: Option<String>,
}
