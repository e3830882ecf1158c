//! Powder stock bookkeeping rules.

use serde::Serialize;

/// Reason recorded on a `stock_movements` row.
pub mod movement_reasons {
    pub const CONSUMPTION: &str = "consumption";
}

/// Stock after consuming `consumption_kg`. Stock may go negative, which
/// signals an inventory discrepancy rather than blocking production.
pub fn stock_after_consumption(stock_kg: f64, consumption_kg: f64) -> f64 {
    stock_kg - consumption_kg.max(0.0)
}

/// Whether the stock level warrants an alert.
pub fn is_below_threshold(stock_kg: f64, threshold_kg: f64) -> bool {
    stock_kg < threshold_kg
}

/// What the stock-alert sweep should do for one powder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    /// Stock is low and nothing is open yet.
    Open,
    /// Stock recovered and an alert is still open.
    Resolve,
    Keep,
}

/// Decide the alert action for a powder.
pub fn alert_action(stock_kg: f64, threshold_kg: f64, has_open_alert: bool) -> AlertAction {
    match (is_below_threshold(stock_kg, threshold_kg), has_open_alert) {
        (true, false) => AlertAction::Open,
        (false, true) => AlertAction::Resolve,
        _ => AlertAction::Keep,
    }
}
