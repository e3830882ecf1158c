//! Route definitions for the audit trail.

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Audit routes mounted at `/audit-logs`.
///
/// All routes require the owner or admin role (enforced by handler extractors).
///
/// ```text
/// GET  /           -> query_audit_logs
/// GET  /integrity  -> check_integrity
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::query_audit_logs))
        .route("/integrity", get(audit::check_integrity))
}
