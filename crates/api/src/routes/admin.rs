//! Route definitions for administrative jobs.

use axum::routing::post;
use axum::Router;

use crate::handlers::{jobs, numeros};
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
///
/// All routes require the owner or admin role (enforced by handler extractors).
///
/// ```text
/// POST /numeros/repair         -> numeros::repair
/// POST /jobs/stock-alerts      -> jobs::sweep_stock_alerts
/// POST /jobs/audit-retention   -> jobs::purge_audit_logs
/// POST /jobs/outbox            -> jobs::drain_outbox
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/numeros/repair", post(numeros::repair))
        .route("/jobs/stock-alerts", post(jobs::sweep_stock_alerts))
        .route("/jobs/audit-retention", post(jobs::purge_audit_logs))
        .route("/jobs/outbox", post(jobs::drain_outbox))
}
