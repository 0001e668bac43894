use serde::{Deserialize, Serialize};

/// Court user role controlling which records and operations a user can reach.
///
/// - `Client`: a litigant. Sees cases where they are plaintiff or defendant,
///   solicits lawyers through case requests.
/// - `Lawyer`: counsel. Sees cases they represent, files cases, answers requests.
/// - `Clerk`: court staff. Sees every case, reviews filings, assigns judges.
/// - `Judge`: sees assigned cases, schedules hearings, issues verdicts.
///
/// Roles are disjoint; none implies another.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Lawyer,
    Clerk,
    Judge,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Client,
        UserRole::Lawyer,
        UserRole::Clerk,
        UserRole::Judge,
    ];

    /// Parse from the DB / JWT representation. Unknown values are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "client" => Some(UserRole::Client),
            "lawyer" => Some(UserRole::Lawyer),
            "clerk" => Some(UserRole::Clerk),
            "judge" => Some(UserRole::Judge),
            _ => None,
        }
    }

    /// Lowercase string for database / JWT storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Lawyer => "lawyer",
            UserRole::Clerk => "clerk",
            UserRole::Judge => "judge",
        }
    }

    /// Bit used by role-gated extractors.
    pub fn bit(&self) -> u8 {
        match self {
            UserRole::Client => 1,
            UserRole::Lawyer => 2,
            UserRole::Clerk => 4,
            UserRole::Judge => 8,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Clerk | UserRole::Judge)
    }

    /// Whether a user may pick this role when signing up.
    /// Court staff can only self-register when the deployment allows it.
    pub fn self_registrable(&self, staff_self_registration: bool) -> bool {
        !self.is_staff() || staff_self_registration
    }

    /// Human-readable list of roles encoded in a role mask.
    pub fn describe_mask(mask: u8) -> String {
        let names: Vec<&str> = Self::ALL
            .iter()
            .filter(|r| mask & r.bit() != 0)
            .map(|r| r.as_str())
            .collect();
        names.join(" or ")
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated user info (safe to send to the owner).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    pub created_at: String,
}

/// Public profile of another user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserSummary {
    pub id: i64,
    pub display_name: String,
    pub role: UserRole,
    /// Only disclosed to court staff and to the user themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}
