//! Route definitions for invoices.

use axum::routing::post;
use axum::Router;

use crate::handlers::invoices;
use crate::state::AppState;

/// Invoice routes mounted at `/invoices`.
///
/// ```text
/// POST /{id}/payments  -> record_payment
/// POST /{id}/refund    -> refund (owner/admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/payments", post(invoices::record_payment))
        .route("/{id}/refund", post(invoices::refund))
}
