//! Unauthenticated routes, mounted at `/public`.

use axum::routing::post;
use axum::Router;

use crate::handlers::quotes;
use crate::state::AppState;

/// ```text
/// POST /quotes/sign  -> sign_with_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/quotes/sign", post(quotes::sign_with_token))
}
