use chrono::{DateTime, Utc};
use shared_types::{
    page_offset, AppError, AuthUser, UpdateProfileRequest, UserRole, UserSummary,
};
use sqlx::{Pool, Postgres};

use crate::error_convert::SqlxErrorExt;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, phone_number, bio, \
                            specialization, created_at";

/// A user row including the password hash. Never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn role(&self) -> Result<UserRole, AppError> {
        UserRole::parse(&self.role)
            .ok_or_else(|| AppError::internal(format!("Unknown role for user {}", self.id)))
    }

    pub fn to_auth_user(&self) -> Result<AuthUser, AppError> {
        Ok(AuthUser {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role()?,
            phone_number: self.phone_number.clone(),
            bio: self.bio.clone(),
            specialization: self.specialization.clone(),
            created_at: self.created_at.to_rfc3339(),
        })
    }

    /// Public profile; `with_email` for staff viewers and the user themselves.
    pub fn to_summary(&self, with_email: bool) -> Result<UserSummary, AppError> {
        Ok(UserSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            role: self.role()?,
            email: with_email.then(|| self.email.clone()),
            bio: self.bio.clone(),
            specialization: self.specialization.clone(),
        })
    }
}

/// Fields for a new account.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub role: UserRole,
    pub phone_number: Option<&'a str>,
    pub specialization: Option<&'a str>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn create(pool: &Pool<Postgres>, user: NewUser<'_>) -> Result<UserRecord, AppError> {
    sqlx::query_as::<_, UserRecord>(&format!(
        r#"
        INSERT INTO users (email, password_hash, display_name, role, phone_number, specialization)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(normalize_email(user.email))
    .bind(user.password_hash)
    .bind(user.display_name.trim())
    .bind(user.role.as_str())
    .bind(user.phone_number)
    .bind(user.specialization)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<UserRecord>, AppError> {
    sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = $1"
    ))
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: i64) -> Result<Option<UserRecord>, AppError> {
    sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Look up a user and require a specific role. `what` names the field in
/// error messages, e.g. "judge_id".
pub async fn require_role(
    pool: &Pool<Postgres>,
    id: i64,
    role: UserRole,
    what: &str,
) -> Result<UserRecord, AppError> {
    let user = find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::bad_request(format!("{what}: user {id} does not exist")))?;
    if user.role()? != role {
        return Err(AppError::bad_request(format!(
            "{what}: user {id} is not a {role}"
        )));
    }
    Ok(user)
}

/// Apply a partial profile update. Absent fields are left unchanged.
pub async fn update_profile(
    pool: &Pool<Postgres>,
    id: i64,
    req: &UpdateProfileRequest,
) -> Result<UserRecord, AppError> {
    sqlx::query_as::<_, UserRecord>(&format!(
        r#"
        UPDATE users SET
            display_name = COALESCE($2, display_name),
            phone_number = COALESCE($3, phone_number),
            bio = COALESCE($4, bio),
            specialization = COALESCE($5, specialization),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(req.display_name.as_deref().map(str::trim))
    .bind(req.phone_number.as_deref())
    .bind(req.bio.as_deref())
    .bind(req.specialization.as_deref())
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?
    .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

/// Page through lawyers, optionally matching name or specialization.
pub async fn search_lawyers(
    pool: &Pool<Postgres>,
    q: Option<&str>,
    page: i64,
    limit: i64,
) -> Result<(Vec<UserRecord>, i64), AppError> {
    let pattern = q
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));

    let filter = "role = 'lawyer' AND ($1::text IS NULL \
                  OR display_name ILIKE $1 OR specialization ILIKE $1)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {filter}"))
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let rows = sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE {filter} \
         ORDER BY display_name ASC, id ASC LIMIT $2 OFFSET $3"
    ))
    .bind(pattern.as_deref())
    .bind(limit)
    .bind(page_offset(page, limit))
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn list_by_role(
    pool: &Pool<Postgres>,
    role: UserRole,
) -> Result<Vec<UserRecord>, AppError> {
    sqlx::query_as::<_, UserRecord>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY display_name ASC, id ASC"
    ))
    .bind(role.as_str())
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
