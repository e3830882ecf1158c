//! Handlers for project status changes.

use atelier_core::error::CoreError;
use atelier_core::project_status::{self, ProjectStatus};
use atelier_core::types::DbId;
use atelier_db::automation;
use atelier_db::repositories::ProjectRepo;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /projects/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

/// Statuses the caller may move a project to.
#[derive(Debug, Serialize)]
pub struct TransitionsResponse {
    pub status: ProjectStatus,
    pub allowed: Vec<ProjectStatus>,
}

/// GET /projects/{id}/transitions
pub async fn list_transitions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = ProjectRepo::find_by_id(&state.pool, user.tenant_id, project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "project",
            id: project_id,
        })?;

    Ok(Json(DataResponse {
        data: TransitionsResponse {
            status: project.status,
            allowed: project_status::allowed_targets(project.status, &user.role),
        },
    }))
}

/// POST /projects/{id}/status
///
/// Runs the status automations (invoicing, stock consumption) atomically.
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<DbId>,
    Json(body): Json<ChangeStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let target: ProjectStatus = body.status.parse()?;

    let executed =
        automation::on_status_change(&state.pool, user.tenant_id, project_id, target, &user.actor())
            .await?;
    state.publish(executed.events);

    Ok(Json(DataResponse {
        data: executed.outcome,
    }))
}
