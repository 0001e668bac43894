//! Role-based visibility of cases.
//!
//! Every case-scoped query goes through [`CaseAccess`]: list queries embed
//! [`CaseAccess::sql_predicate`], single-record lookups call
//! [`CaseAccess::ensure_visible`]. A case outside the caller's scope is
//! reported as not found so its existence is not disclosed.

use shared_types::{AppError, Case, UserRole};

use crate::auth::extractors::CurrentUser;

/// Which slice of the case table a role sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseScope {
    /// Clerks: every case.
    All,
    /// Clients: cases where they are plaintiff or defendant.
    Party,
    /// Lawyers: cases where they represent either side.
    Counsel,
    /// Judges: cases assigned to them.
    Bench,
}

impl CaseScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseScope::All => "all",
            CaseScope::Party => "party",
            CaseScope::Counsel => "counsel",
            CaseScope::Bench => "bench",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseAccess {
    pub scope: CaseScope,
    pub user_id: i64,
}

impl CaseAccess {
    pub fn for_user(role: UserRole, user_id: i64) -> Self {
        let scope = match role {
            UserRole::Client => CaseScope::Party,
            UserRole::Lawyer => CaseScope::Counsel,
            UserRole::Judge => CaseScope::Bench,
            UserRole::Clerk => CaseScope::All,
        };
        Self { scope, user_id }
    }

    pub fn of(user: &CurrentUser) -> Self {
        Self::for_user(user.role, user.id)
    }

    /// SQL filter over the case table aliased `c`. Bind `scope.as_str()` at
    /// `$first` and `user_id` at `$first + 1`.
    pub fn sql_predicate(first: usize) -> String {
        let (s, u) = (first, first + 1);
        format!(
            "(${s} = 'all' \
             OR (${s} = 'party' AND (c.plaintiff_id = ${u} OR c.defendant_id = ${u})) \
             OR (${s} = 'counsel' AND (c.plaintiff_lawyer_id = ${u} OR c.defendant_lawyer_id = ${u})) \
             OR (${s} = 'bench' AND c.judge_id = ${u}))"
        )
    }

    pub fn permits(&self, case: &Case) -> bool {
        let me = Some(self.user_id);
        match self.scope {
            CaseScope::All => true,
            CaseScope::Party => case.plaintiff_id == self.user_id || case.defendant_id == self.user_id,
            CaseScope::Counsel => case.plaintiff_lawyer_id == me || case.defendant_lawyer_id == me,
            CaseScope::Bench => case.judge_id == me,
        }
    }

    pub fn ensure_visible(&self, case: Case) -> Result<Case, AppError> {
        if self.permits(&case) {
            Ok(case)
        } else {
            Err(AppError::not_found(format!("Case {} not found", case.id)))
        }
    }
}
