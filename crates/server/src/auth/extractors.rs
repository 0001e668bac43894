use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::{AppError, UserRole};

use super::jwt::Claims;

pub const ROLE_CLIENT: u8 = 1;
pub const ROLE_LAWYER: u8 = 2;
pub const ROLE_CLERK: u8 = 4;
pub const ROLE_JUDGE: u8 = 8;

/// The authenticated caller, resolved from token claims.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl TryFrom<&Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email.clone(),
            role: super::role_of(claims)?,
        })
    }
}

fn current_user(parts: &Parts) -> Result<CurrentUser, AppError> {
    let claims = parts
        .extensions
        .get::<Claims>()
        .ok_or_else(|| AppError::unauthorized("Authentication required"))?;
    CurrentUser::try_from(claims)
}

/// Extractor that requires authentication. Returns 401 if no valid token.
pub struct AuthRequired(pub CurrentUser);

impl<S: Send + Sync> FromRequestParts<S> for AuthRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts).map(AuthRequired)
    }
}

/// Extractor that requires authentication AND one of the roles in `ROLES`.
/// Returns 401 if unauthenticated, 403 if the caller's role is not in the mask.
///
/// `ROLES` is a bitmask of `ROLE_CLIENT`, `ROLE_LAWYER`, `ROLE_CLERK`, `ROLE_JUDGE`.
/// Roles are not hierarchical: a judge does not pass a clerk gate.
pub struct RoleRequired<const ROLES: u8>(pub CurrentUser);

impl<const ROLES: u8, S: Send + Sync> FromRequestParts<S> for RoleRequired<ROLES> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)?;

        if user.role.bit() & ROLES == 0 {
            return Err(AppError::forbidden(format!(
                "{} role required",
                UserRole::describe_mask(ROLES)
            )));
        }

        Ok(RoleRequired(user))
    }
}

pub type ClientOnly = RoleRequired<ROLE_CLIENT>;
pub type LawyerOnly = RoleRequired<ROLE_LAWYER>;
pub type ClerkOnly = RoleRequired<ROLE_CLERK>;
pub type JudgeOnly = RoleRequired<ROLE_JUDGE>;
pub type StaffOnly = RoleRequired<{ ROLE_CLERK | ROLE_JUDGE }>;
/// Roles that can appear as a side of a case.
pub type Litigant = RoleRequired<{ ROLE_CLIENT | ROLE_LAWYER }>;
/// Everyone except judges.
pub type RequestParticipant = RoleRequired<{ ROLE_CLIENT | ROLE_LAWYER | ROLE_CLERK }>;
