//! Project entity model and DTOs.

use atelier_core::invoice::Totals;
use atelier_core::project_status::ProjectStatus;
use atelier_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub tenant_id: DbId,
    pub numero: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub client_id: DbId,
    pub powder_id: Option<DbId>,
    pub quote_id: Option<DbId>,
    pub items: serde_json::Value,
    pub deposit_date: Option<NaiveDate>,
    pub promised_date: Option<NaiveDate>,
    pub delivered_date: Option<NaiveDate>,
    pub total_ht_cents: i64,
    pub total_tva_cents: i64,
    pub total_ttc_cents: i64,
    pub estimated_consumption_kg: f64,
    pub stock_consumed: bool,
    pub auto_created: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn totals(&self) -> Totals {
        Totals {
            ht: self.total_ht_cents,
            tva: self.total_tva_cents,
            ttc: self.total_ttc_cents,
        }
    }
}

/// DTO for inserting a project. The numero is generated by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub client_id: DbId,
    pub powder_id: Option<DbId>,
    pub quote_id: Option<DbId>,
    pub items: serde_json::Value,
    pub deposit_date: Option<NaiveDate>,
    pub promised_date: Option<NaiveDate>,
    pub totals: Totals,
    pub estimated_consumption_kg: f64,
    pub auto_created: bool,
}
