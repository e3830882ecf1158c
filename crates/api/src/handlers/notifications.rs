//! Handlers for in-app notifications.

use atelier_db::repositories::NotificationRepo;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<NotificationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let notifications =
        NotificationRepo::list_for_tenant(&state.pool, user.tenant_id, params.unread_only, limit)
            .await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}
