//! Quote (devis) entity model and signing-link rows.

use atelier_core::invoice::Totals;
use atelier_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

pub const QUOTE_STATUS_ACCEPTED: &str = "accepte";

/// A row from the `quotes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quote {
    pub id: DbId,
    pub tenant_id: DbId,
    pub numero: String,
    pub client_id: DbId,
    pub powder_id: Option<DbId>,
    pub status: String,
    pub items: serde_json::Value,
    pub total_ht_cents: i64,
    pub total_tva_cents: i64,
    pub total_ttc_cents: i64,
    pub estimated_consumption_kg: f64,
    pub valid_until: Option<NaiveDate>,
    pub signed_at: Option<Timestamp>,
    pub signed_by: Option<DbId>,
    pub signer_name: Option<String>,
    pub signature_method: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Quote {
    pub fn totals(&self) -> Totals {
        Totals {
            ht: self.total_ht_cents,
            tva: self.total_tva_cents,
            ttc: self.total_ttc_cents,
        }
    }

    /// Project name derived from the quote when signing creates one.
    pub fn project_name(&self) -> String {
        format!("Projet {}", self.numero)
    }
}

/// A row from the `quote_signing_links` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuoteSigningLink {
    pub id: DbId,
    pub tenant_id: DbId,
    pub quote_id: DbId,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub used_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
}
