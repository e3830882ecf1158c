pub mod admin;
pub mod audit;
pub mod export;
pub mod health;
pub mod invoice;
pub mod notification;
pub mod numero;
pub mod project;
pub mod public;
pub mod quote;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects/{id}/transitions                       allowed next statuses (GET)
/// /projects/{id}/status                            change status (POST)
///
/// /quotes/{id}/sign                                member signature (POST)
/// /quotes/{id}/signing-link                        create public link (POST)
///
/// /public/quotes/sign                              client signature by token (POST, no auth)
///
/// /invoices/{id}/payments                          record payment (POST)
/// /invoices/{id}/refund                            refund (POST, owner/admin)
///
/// /numeros/{document_type}                         reserve a numero (POST)
///
/// /notifications                                   in-app notifications (GET)
///
/// /audit-logs                                      query (GET, owner/admin)
/// /audit-logs/integrity                            hash chain check (GET, owner/admin)
///
/// /exports/fec                                     FEC export (GET, owner/admin)
///
/// /admin/numeros/repair                            numero repair (POST, owner/admin)
/// /admin/jobs/stock-alerts                         stock-alert sweep (POST, owner/admin)
/// /admin/jobs/audit-retention                      audit purge (POST, owner/admin)
/// /admin/jobs/outbox                               force outbox drain (POST, owner/admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/quotes", quote::router())
        .nest("/public", public::router())
        .nest("/invoices", invoice::router())
        .nest("/numeros", numero::router())
        .nest("/notifications", notification::router())
        .nest("/audit-logs", audit::router())
        .nest("/exports", export::router())
        .nest("/admin", admin::router())
}
