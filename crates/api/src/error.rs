use atelier_core::error::CoreError;
use atelier_db::automation::AutomationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `atelier_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<AutomationError> for AppError {
    fn from(err: AutomationError) -> Self {
        match err {
            AutomationError::Core(core) => AppError::Core(core),
            AutomationError::Database(db) => AppError::Database(db),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(errors.to_string()))
    }
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut allowed: Option<Vec<String>> = None;

        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => {
                let status = match core {
                    CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                    CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                    CoreError::InvalidTransition { allowed: targets, .. } => {
                        allowed = Some(targets.clone());
                        StatusCode::CONFLICT
                    }
                    CoreError::TransitionForbidden { allowed: targets, .. } => {
                        allowed = Some(targets.clone());
                        StatusCode::FORBIDDEN
                    }
                    CoreError::AlreadySigned(_) | CoreError::Conflict(_) => StatusCode::CONFLICT,
                    CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                    CoreError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match core {
                    CoreError::NotFound { entity, id } => format!("{entity} with id {id} not found"),
                    CoreError::Validation(msg)
                    | CoreError::Conflict(msg)
                    | CoreError::Unauthorized(msg)
                    | CoreError::Forbidden(msg) => msg.clone(),
                    CoreError::Internal(msg) | CoreError::DependencyUnavailable(msg) => {
                        tracing::error!(error = %msg, code = core.code(), "Internal core error");
                        INTERNAL_MESSAGE.to_string()
                    }
                    other => other.to_string(),
                };
                (status, core.code(), message)
            }

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(allowed) = allowed {
            body["allowed"] = json!(allowed);
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "not_found",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "conflict",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
