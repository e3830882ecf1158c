//! Handlers for document numbering.

use atelier_core::numbering::DocumentType;
use atelier_db::jobs;
use atelier_db::repositories::NumberingRepo;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequirePrivileged;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NumeroResponse {
    pub document_type: DocumentType,
    pub numero: String,
}

/// POST /numeros/{document_type}
///
/// Reserves the next numero. A reserved value is never handed out again.
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(document_type): Path<String>,
) -> AppResult<impl IntoResponse> {
    let document_type: DocumentType = document_type.parse()?;
    let numero = NumberingRepo::generate_with_pool(&state.pool, user.tenant_id, document_type).await;

    Ok(Json(DataResponse {
        data: NumeroResponse {
            document_type,
            numero,
        },
    }))
}

/// POST /admin/numeros/repair
pub async fn repair(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
) -> AppResult<impl IntoResponse> {
    let repairs = jobs::repair_numeros(&state.pool, user.tenant_id, user.user_id).await?;
    Ok(Json(DataResponse { data: repairs }))
}
