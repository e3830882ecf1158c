//! JWT-based authentication extractor for Axum handlers.

use atelier_core::error::CoreError;
use atelier_core::roles::VALID_ROLES;
use atelier_core::types::DbId;
use atelier_db::automation::Actor;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated tenant member extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, tenant_id = %user.tenant_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub tenant_id: DbId,
    /// `owner`, `admin` or `member`.
    pub role: String,
}

impl AuthUser {
    /// The member as seen by the automation layer.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role.clone(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        if !VALID_ROLES.contains(&claims.role.as_str()) {
            return Err(AppError::Core(CoreError::Unauthorized(format!(
                "Unknown role '{}'",
                claims.role
            ))));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        })
    }
}
