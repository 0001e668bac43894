use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Valid evidence types matching the DB CHECK constraint.
pub const EVIDENCE_TYPES: &[&str] = &[
    "document", "photo", "video", "audio", "physical", "testimony", "other",
];

pub fn is_valid_evidence_type(s: &str) -> bool {
    EVIDENCE_TYPES.contains(&s)
}

/// An exhibit submitted on one side of a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Evidence {
    pub id: Uuid,
    pub case_id: Uuid,
    pub submitted_by: i64,
    /// "plaintiff" or "defendant".
    pub side: String,
    pub title: String,
    pub description: String,
    pub evidence_type: String,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvidenceResponse {
    pub id: String,
    pub case_id: String,
    pub submitted_by: i64,
    pub side: String,
    pub title: String,
    pub description: String,
    pub evidence_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: String,
}

impl From<Evidence> for EvidenceResponse {
    fn from(e: Evidence) -> Self {
        Self {
            id: e.id.to_string(),
            case_id: e.case_id.to_string(),
            submitted_by: e.submitted_by,
            side: e.side,
            title: e.title,
            description: e.description,
            evidence_type: e.evidence_type,
            file_url: e.file_url,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreateEvidenceRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "Title is required"))
    )]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub evidence_type: String,
    #[cfg_attr(
        feature = "validation",
        validate(url(message = "file_url must be a valid URL"))
    )]
    #[serde(default)]
    pub file_url: Option<String>,
}
