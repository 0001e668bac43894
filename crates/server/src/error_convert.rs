use shared_types::AppError;

/// Convert a sqlx::Error into an AppError.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation (error code 23505)
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or_default();
                return AppError::conflict(unique_violation_message(constraint));
            }
            // Check constraint violation (23514): the row broke a domain invariant
            if db_err.code().as_deref() == Some("23514") {
                return AppError::bad_request(format!(
                    "Request violates a data constraint ({})",
                    db_err.constraint().unwrap_or("check")
                ));
            }
            tracing::error!(error = %err, "database error");
            AppError::database(err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "database error");
            AppError::database(err.to_string())
        }
    }
}

fn unique_violation_message(constraint: &str) -> &'static str {
    if constraint.contains("email") {
        "An account with this email already exists"
    } else if constraint.contains("one_pending") {
        "A pending request to this lawyer already exists"
    } else if constraint.contains("case_number") {
        "Case number already in use"
    } else {
        "A record with this value already exists"
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}
