use axum::routing::get;
use axum::Router;

use crate::handlers::exports;
use crate::state::AppState;

/// Export routes mounted at `/exports`.
pub fn router() -> Router<AppState> {
    Router::new().route("/fec", get(exports::export_fec))
}
