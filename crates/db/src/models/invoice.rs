//! Invoice (facture) entity model and DTOs.

use atelier_core::invoice::{InvoiceType, PaymentStatus, Totals};
use atelier_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `invoices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: DbId,
    pub tenant_id: DbId,
    pub numero: String,
    pub project_id: Option<DbId>,
    pub client_id: DbId,
    #[sqlx(try_from = "String")]
    pub invoice_type: InvoiceType,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    pub total_ht_cents: i64,
    pub total_tva_cents: i64,
    pub total_ttc_cents: i64,
    pub amount_paid_cents: i64,
    pub issued_on: NaiveDate,
    pub due_date: NaiveDate,
    pub paid_at: Option<Timestamp>,
    pub refunded_at: Option<Timestamp>,
    pub auto_created: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Invoice {
    pub fn totals(&self) -> Totals {
        Totals {
            ht: self.total_ht_cents,
            tva: self.total_tva_cents,
            ttc: self.total_ttc_cents,
        }
    }
}

/// DTO for inserting an invoice. The numero is generated by the caller.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub project_id: Option<DbId>,
    pub client_id: DbId,
    pub invoice_type: InvoiceType,
    pub totals: Totals,
    pub issued_on: NaiveDate,
    pub due_date: NaiveDate,
    pub auto_created: bool,
}

/// An invoice joined with its client, for the FEC export.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceForExport {
    pub numero: String,
    pub issued_on: NaiveDate,
    pub client_id: DbId,
    pub client_name: String,
    pub total_ht_cents: i64,
    pub total_tva_cents: i64,
    pub total_ttc_cents: i64,
}
