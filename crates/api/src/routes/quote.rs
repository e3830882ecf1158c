//! Route definitions for quotes.

use axum::routing::post;
use axum::Router;

use crate::handlers::quotes;
use crate::state::AppState;

/// Quote routes mounted at `/quotes`.
///
/// ```text
/// POST /{id}/sign          -> sign_quote
/// POST /{id}/signing-link  -> create_signing_link
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/sign", post(quotes::sign_quote))
        .route("/{id}/signing-link", post(quotes::create_signing_link))
}
