//! Powder stock and stock alert models.

use atelier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `powders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Powder {
    pub id: DbId,
    pub tenant_id: DbId,
    pub reference: String,
    pub name: String,
    pub stock_kg: f64,
    pub alert_threshold_kg: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `stock_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockAlert {
    pub id: DbId,
    pub tenant_id: DbId,
    pub powder_id: DbId,
    pub stock_kg: f64,
    pub threshold_kg: f64,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Powder joined with whether it has an open alert (stock sweep input).
#[derive(Debug, Clone, FromRow)]
pub struct PowderAlertState {
    pub id: DbId,
    pub reference: String,
    pub name: String,
    pub stock_kg: f64,
    pub alert_threshold_kg: f64,
    pub open_alert_id: Option<DbId>,
}
