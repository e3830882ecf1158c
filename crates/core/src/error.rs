use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot transition from '{from}' to '{to}'. Allowed transitions: {allowed:?}")]
    InvalidTransition {
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("Quote {0} has already been signed")]
    AlreadySigned(DbId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The edge exists but the caller's role may not take it.
    #[error("Role may not move from '{from}' to '{to}'. Allowed transitions: {allowed:?}")]
    TransitionForbidden {
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable snake_case error code reported to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::Validation(_) => "validation_error",
            CoreError::InvalidTransition { .. } => "invalid_transition",
            CoreError::AlreadySigned(_) => "already_signed",
            CoreError::Conflict(_) => "conflict",
            CoreError::Unauthorized(_) => "unauthorized",
            CoreError::Forbidden(_) | CoreError::TransitionForbidden { .. } => "forbidden",
            CoreError::DependencyUnavailable(_) => "dependency_unavailable",
            CoreError::Internal(_) => "internal_error",
        }
    }
}
