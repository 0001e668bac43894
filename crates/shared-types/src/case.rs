use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, StatusCount};

// ── Validation constants ────────────────────────────────────────────

/// Valid case categories matching the DB CHECK constraint.
pub const CASE_CATEGORIES: &[&str] = &["civil", "criminal", "family", "property", "labor", "other"];

/// Check whether a category string is a valid case category.
pub fn is_valid_case_category(s: &str) -> bool {
    CASE_CATEGORIES.contains(&s)
}

/// Build the public docket number for a case, e.g. `CW-2026-00042`.
pub fn format_case_number(year: i32, sequence: i64) -> String {
    format!("CW-{}-{:05}", year, sequence)
}

// ── Status machine ──────────────────────────────────────────────────

/// Lifecycle of a case.
///
/// ```text
/// pending ──► approved ──► in_progress ──► closed
///    │            └──────────────────────────▲
///    └──► rejected
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    Approved,
    Rejected,
    InProgress,
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Pending,
        CaseStatus::Approved,
        CaseStatus::Rejected,
        CaseStatus::InProgress,
        CaseStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Approved => "approved",
            CaseStatus::Rejected => "rejected",
            CaseStatus::InProgress => "in_progress",
            CaseStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CaseStatus::Pending),
            "approved" => Some(CaseStatus::Approved),
            "rejected" => Some(CaseStatus::Rejected),
            "in_progress" => Some(CaseStatus::InProgress),
            "closed" => Some(CaseStatus::Closed),
            _ => None,
        }
    }

    /// The single authority on which status changes are legal.
    pub fn can_transition_to(&self, next: CaseStatus) -> bool {
        matches!(
            (self, next),
            (CaseStatus::Pending, CaseStatus::Approved)
                | (CaseStatus::Pending, CaseStatus::Rejected)
                | (CaseStatus::Approved, CaseStatus::InProgress)
                | (CaseStatus::Approved, CaseStatus::Closed)
                | (CaseStatus::InProgress, CaseStatus::Closed)
        )
    }

    /// Closed and rejected cases accept no further filings.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Closed | CaseStatus::Rejected)
    }

    /// Hearings may only be scheduled on an approved or running case.
    pub fn accepts_hearings(&self) -> bool {
        matches!(self, CaseStatus::Approved | CaseStatus::InProgress)
    }

    /// Guard helper returning a conflict error for an illegal transition.
    pub fn ensure_transition(&self, next: CaseStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::conflict(format!(
                "Case cannot move from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

/// Outcome recorded by a judge's verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum VerdictOutcome {
    Plaintiff,
    Defendant,
    Dismissed,
    Settled,
}

impl VerdictOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictOutcome::Plaintiff => "plaintiff",
            VerdictOutcome::Defendant => "defendant",
            VerdictOutcome::Dismissed => "dismissed",
            VerdictOutcome::Settled => "settled",
        }
    }
}

/// Side of the litigation a party or filing belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Plaintiff,
    Defendant,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Plaintiff => "plaintiff",
            Side::Defendant => "defendant",
        }
    }
}

/// Check the party invariants of a case: one plaintiff and one defendant who
/// are different people, and no lawyer on both sides.
pub fn validate_parties(
    plaintiff_id: i64,
    defendant_id: i64,
    plaintiff_lawyer_id: Option<i64>,
    defendant_lawyer_id: Option<i64>,
) -> Result<(), AppError> {
    if plaintiff_id == defendant_id {
        return Err(AppError::bad_request(
            "Plaintiff and defendant must be different parties",
        ));
    }
    if let (Some(p), Some(d)) = (plaintiff_lawyer_id, defendant_lawyer_id) {
        if p == d {
            return Err(AppError::conflict(
                "A lawyer cannot represent both sides of a case",
            ));
        }
    }
    for lawyer in [plaintiff_lawyer_id, defendant_lawyer_id].into_iter().flatten() {
        if lawyer == plaintiff_id || lawyer == defendant_id {
            return Err(AppError::bad_request("A party cannot be counsel on their own case"));
        }
    }
    Ok(())
}

// ── DB row struct ───────────────────────────────────────────────────

/// A case record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Case {
    pub id: Uuid,
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub category: String,
    /// CaseStatus stored as snake_case text.
    pub status: String,
    pub plaintiff_id: i64,
    pub defendant_id: i64,
    pub plaintiff_lawyer_id: Option<i64>,
    pub defendant_lawyer_id: Option<i64>,
    pub judge_id: Option<i64>,
    pub review_note: Option<String>,
    pub verdict_outcome: Option<String>,
    pub verdict_summary: Option<String>,
    pub verdict_at: Option<DateTime<Utc>>,
    pub filed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Case {
    /// Parsed status. Rows are CHECK-constrained, so an unknown value
    /// is reported as an internal error rather than silently mapped.
    pub fn status(&self) -> Result<CaseStatus, AppError> {
        CaseStatus::parse(&self.status)
            .ok_or_else(|| AppError::internal(format!("Unknown case status: {}", self.status)))
    }

    /// The side a user is on, as party or as counsel.
    pub fn side_of(&self, user_id: i64) -> Option<Side> {
        if self.plaintiff_id == user_id || self.plaintiff_lawyer_id == Some(user_id) {
            Some(Side::Plaintiff)
        } else if self.defendant_id == user_id || self.defendant_lawyer_id == Some(user_id) {
            Some(Side::Defendant)
        } else {
            None
        }
    }
}

// ── API response types ──────────────────────────────────────────────

/// API response shape for a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseResponse {
    pub id: String,
    pub case_number: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub plaintiff_id: i64,
    pub defendant_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintiff_lawyer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defendant_lawyer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judge_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<VerdictResponse>,
    pub filed_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

/// Verdict portion of a closed case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VerdictResponse {
    pub outcome: String,
    pub summary: String,
    pub issued_at: String,
}

impl From<Case> for CaseResponse {
    fn from(c: Case) -> Self {
        let verdict = match (c.verdict_outcome, c.verdict_summary, c.verdict_at) {
            (Some(outcome), Some(summary), Some(at)) => Some(VerdictResponse {
                outcome,
                summary,
                issued_at: at.to_rfc3339(),
            }),
            _ => None,
        };
        Self {
            id: c.id.to_string(),
            case_number: c.case_number,
            title: c.title,
            description: c.description,
            category: c.category,
            status: c.status,
            plaintiff_id: c.plaintiff_id,
            defendant_id: c.defendant_id,
            plaintiff_lawyer_id: c.plaintiff_lawyer_id,
            defendant_lawyer_id: c.defendant_lawyer_id,
            judge_id: c.judge_id,
            review_note: c.review_note,
            verdict,
            filed_at: c.filed_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
            closed_at: c.closed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Per-status case counts within the caller's visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseStatistics {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
}

// ── Request types ───────────────────────────────────────────────────

/// Lawyer filing a case directly on behalf of a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(validator::Validate))]
pub struct CreateCaseRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "Title is required"))
    )]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub plaintiff_id: i64,
    pub defendant_id: i64,
}

/// Partial update of a case that is still awaiting review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCaseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// Clerk decision on a filed case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewCaseRequest {
    pub approved: bool,
    /// Required when approving.
    #[serde(default)]
    pub judge_id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Reassign the presiding judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignJudgeRequest {
    pub judge_id: i64,
}

/// Judge's final decision on a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IssueVerdictRequest {
    pub outcome: VerdictOutcome,
    pub summary: String,
}

/// Query parameters for case search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CaseSearchParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
