//! Handlers for the externally triggered maintenance jobs.
//!
//! All endpoints require the owner or admin role and act on the caller's tenant.

use atelier_db::jobs;
use atelier_events::{EmailDelivery, OutboxDispatcher};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequirePrivileged;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub retention_days: i64,
    pub deleted: u64,
}

/// POST /admin/jobs/stock-alerts
pub async fn sweep_stock_alerts(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
) -> AppResult<impl IntoResponse> {
    let executed = jobs::sweep_stock_alerts(&state.pool, user.tenant_id).await?;
    state.publish(executed.events);
    Ok(Json(DataResponse {
        data: executed.outcome,
    }))
}

/// POST /admin/jobs/audit-retention
pub async fn purge_audit_logs(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
) -> AppResult<impl IntoResponse> {
    let retention_days = state.config.audit_retention_days;
    let deleted = jobs::purge_audit_logs(&state.pool, user.tenant_id, retention_days).await?;
    Ok(Json(DataResponse {
        data: PurgeResponse {
            retention_days,
            deleted,
        },
    }))
}

/// POST /admin/jobs/outbox
///
/// Drains one batch of the caller's pending notifications immediately.
pub async fn drain_outbox(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
) -> AppResult<impl IntoResponse> {
    let dispatcher =
        OutboxDispatcher::new(state.pool.clone(), state.email.clone().map(EmailDelivery::new))
            .with_batch_size(state.config.outbox_batch_size);
    let report = dispatcher.drain_once(Some(user.tenant_id)).await?;
    Ok(Json(DataResponse { data: report }))
}
