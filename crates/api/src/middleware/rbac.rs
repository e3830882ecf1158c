//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use atelier_core::error::CoreError;
use atelier_core::roles;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `owner` or `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequirePrivileged(user): RequirePrivileged) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequirePrivileged(pub AuthUser);

impl FromRequestParts<AppState> for RequirePrivileged {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !roles::is_privileged(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Owner or admin role required".into(),
            )));
        }
        Ok(RequirePrivileged(user))
    }
}
