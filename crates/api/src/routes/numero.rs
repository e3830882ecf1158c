use axum::routing::post;
use axum::Router;

use crate::handlers::numeros;
use crate::state::AppState;

/// Numbering routes mounted at `/numeros`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{document_type}", post(numeros::generate))
}
