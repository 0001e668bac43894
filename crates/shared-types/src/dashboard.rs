use serde::{Deserialize, Serialize};

use crate::{StatusCount, UserRole};

/// Landing-page numbers for the signed-in user, scoped by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardStats {
    pub role: UserRole,
    pub cases_by_status: Vec<StatusCount>,
    /// Scheduled hearings in the next seven days.
    pub upcoming_hearings: i64,
    /// Requests awaiting an answer that involve this user.
    pub pending_requests: i64,
    pub unread_messages: i64,
}
