//! Route definitions for projects.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Project routes mounted at `/projects`.
///
/// ```text
/// GET  /{id}/transitions  -> list_transitions
/// POST /{id}/status       -> change_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/transitions", get(projects::list_transitions))
        .route("/{id}/status", post(projects::change_status))
}
