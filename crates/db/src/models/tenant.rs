//! Tenant (workshop account) and membership models.

use atelier_core::automation::{self, AutomationSettings};
use atelier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tenants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: DbId,
    pub name: String,
    pub siren: Option<String>,
    pub invoice_trigger_status: String,
    pub payment_terms_days: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tenant {
    pub fn automation_settings(&self) -> AutomationSettings {
        AutomationSettings {
            invoice_trigger: automation::parse_invoice_trigger(&self.invoice_trigger_status),
            payment_terms_days: self.payment_terms_days,
        }
    }
}

/// A row from the `tenant_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenantMember {
    pub tenant_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
}
