use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest and longest bookable hearing, in minutes.
pub const MIN_HEARING_MINUTES: i32 = 1;
pub const MAX_HEARING_MINUTES: i32 = 480;
pub const DEFAULT_HEARING_MINUTES: i32 = 60;

/// Hearing status values matching the DB CHECK constraint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum HearingStatus {
    Scheduled,
    Completed,
    Cancelled,
    Adjourned,
}

impl HearingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HearingStatus::Scheduled => "scheduled",
            HearingStatus::Completed => "completed",
            HearingStatus::Cancelled => "cancelled",
            HearingStatus::Adjourned => "adjourned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(HearingStatus::Scheduled),
            "completed" => Some(HearingStatus::Completed),
            "cancelled" => Some(HearingStatus::Cancelled),
            "adjourned" => Some(HearingStatus::Adjourned),
            _ => None,
        }
    }

    /// A hearing leaves `scheduled` exactly once.
    pub fn can_transition_to(&self, next: HearingStatus) -> bool {
        *self == HearingStatus::Scheduled && next != HearingStatus::Scheduled
    }
}

/// A court session tied to one case (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Hearing {
    pub id: Uuid,
    pub case_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub courtroom: String,
    pub purpose: String,
    pub status: String,
    pub notes: Option<String>,
    pub reschedule_count: i32,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in a hearing's rescheduling history (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct HearingReschedule {
    pub id: Uuid,
    pub hearing_id: Uuid,
    pub sequence: i32,
    pub previous_at: DateTime<Utc>,
    pub new_at: DateTime<Utc>,
    pub reason: String,
    pub rescheduled_by: i64,
    pub created_at: DateTime<Utc>,
}

/// API response for a hearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HearingResponse {
    pub id: String,
    pub case_id: String,
    pub scheduled_at: String,
    pub duration_minutes: i32,
    pub courtroom: String,
    pub purpose: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub reschedule_count: i32,
    pub created_by: i64,
    /// Present on single-hearing lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HearingRescheduleResponse>>,
}

impl From<Hearing> for HearingResponse {
    fn from(h: Hearing) -> Self {
        Self {
            id: h.id.to_string(),
            case_id: h.case_id.to_string(),
            scheduled_at: h.scheduled_at.to_rfc3339(),
            duration_minutes: h.duration_minutes,
            courtroom: h.courtroom,
            purpose: h.purpose,
            status: h.status,
            notes: h.notes,
            reschedule_count: h.reschedule_count,
            created_by: h.created_by,
            history: None,
        }
    }
}

/// API response for a reschedule history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HearingRescheduleResponse {
    pub sequence: i32,
    pub previous_at: String,
    pub new_at: String,
    pub reason: String,
    pub rescheduled_by: i64,
    pub created_at: String,
}

impl From<HearingReschedule> for HearingRescheduleResponse {
    fn from(r: HearingReschedule) -> Self {
        Self {
            sequence: r.sequence,
            previous_at: r.previous_at.to_rfc3339(),
            new_at: r.new_at.to_rfc3339(),
            reason: r.reason,
            rescheduled_by: r.rescheduled_by,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Request to put a hearing on the calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScheduleHearingRequest {
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    pub courtroom: String,
    pub purpose: String,
}

/// Request to move a hearing to a new time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RescheduleHearingRequest {
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
}

/// Request to close out a hearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateHearingStatusRequest {
    pub status: HearingStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for the hearing calendar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct HearingSearchParams {
    pub status: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}
