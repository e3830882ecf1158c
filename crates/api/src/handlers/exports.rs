//! Accounting exports.

use atelier_core::error::CoreError;
use atelier_core::fec::{self, FecInvoice};
use atelier_core::invoice::Totals;
use atelier_db::repositories::{InvoiceRepo, TenantRepo};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::RequirePrivileged;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct FecParams {
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
}

/// GET /exports/fec?year=YYYY
///
/// Returns the pipe-separated FEC file as an attachment named after the
/// tenant's SIREN and the closing date (31 December of `year`).
pub async fn export_fec(
    State(state): State<AppState>,
    RequirePrivileged(user): RequirePrivileged,
    Query(params): Query<FecParams>,
) -> AppResult<impl IntoResponse> {
    params.validate()?;

    let siren = TenantRepo::siren(&state.pool, user.tenant_id)
        .await?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("The tenant SIREN is required for a FEC export".into()))?;
    let closing_date = NaiveDate::from_ymd_opt(params.year, 12, 31)
        .ok_or_else(|| CoreError::Validation(format!("Invalid year {}", params.year)))?;

    let invoices: Vec<FecInvoice> = InvoiceRepo::list_for_export(&state.pool, user.tenant_id, params.year)
        .await?
        .into_iter()
        .map(|row| FecInvoice {
            numero: row.numero,
            issued_on: row.issued_on,
            client_ref: fec::client_account_ref(row.client_id),
            client_name: row.client_name,
            totals: Totals {
                ht: row.total_ht_cents,
                tva: row.total_tva_cents,
                ttc: row.total_ttc_cents,
            },
        })
        .collect();

    tracing::info!(
        tenant_id = %user.tenant_id,
        year = params.year,
        invoices = invoices.len(),
        "FEC export generated",
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        fec::file_name(siren.trim(), closing_date)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        fec::render(&invoices),
    ))
}
