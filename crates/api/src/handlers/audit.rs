//! Handlers for the tenant audit trail.
//!
//! All endpoints require the owner or admin role.

use atelier_db::jobs;
use atelier_db::models::audit::{AuditLogPage, AuditQuery};
use atelier_db::repositories::AuditLogRepo;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequirePrivileged;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /audit-logs
///
/// Filter by actor, action, entity and time range, newest first.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
    Query(query): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let items = AuditLogRepo::query(&state.pool, user.tenant_id, &query).await?;
    let total = AuditLogRepo::count(&state.pool, user.tenant_id, &query).await?;

    Ok(Json(DataResponse {
        data: AuditLogPage { items, total },
    }))
}

/// GET /audit-logs/integrity
pub async fn check_integrity(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
) -> AppResult<impl IntoResponse> {
    let verification = jobs::verify_audit_chain(&state.pool, user.tenant_id).await?;
    Ok(Json(DataResponse { data: verification }))
}
