//! Handlers for invoice payments and refunds.

use atelier_core::types::DbId;
use atelier_db::automation;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequirePrivileged;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /invoices/{id}/payments`.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1))]
    pub amount_cents: i64,
}

/// POST /invoices/{id}/payments
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<DbId>,
    Json(body): Json<RecordPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;

    let executed = automation::record_payment(
        &state.pool,
        user.tenant_id,
        invoice_id,
        body.amount_cents,
        &user.actor(),
    )
    .await?;
    state.publish(executed.events);

    Ok(Json(DataResponse {
        data: executed.outcome,
    }))
}

/// POST /invoices/{id}/refund
pub async fn refund(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
    Path(invoice_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let invoice =
        automation::refund_invoice(&state.pool, user.tenant_id, invoice_id, &user.actor()).await?;
    Ok(Json(DataResponse { data: invoice }))
}
