//! Invoice types, payment status rules and balance computation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Cents;

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Monetary totals of a quote, project or invoice, in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub ht: Cents,
    pub tva: Cents,
    pub ttc: Cents,
}

impl Totals {
    pub fn new(ht: Cents, tva: Cents) -> Self {
        Self {
            ht,
            tva,
            ttc: ht + tva,
        }
    }

    /// What is left to bill once `paid` is deducted. Never negative, and
    /// `ttc` is always `ht + tva`. When one component is over-deducted the
    /// whole remainder is carried by the other.
    fn remaining_after(self, paid: Totals) -> Totals {
        let ht = self.ht - paid.ht;
        let tva = self.tva - paid.tva;
        let ttc = ht + tva;
        if ttc <= 0 {
            return Totals::default();
        }
        match (ht < 0, tva < 0) {
            (true, _) => Totals::new(0, ttc),
            (_, true) => Totals::new(ttc, 0),
            _ => Totals::new(ht, tva),
        }
    }
}

impl std::iter::Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Self {
        iter.fold(Totals::default(), |acc, t| Totals {
            ht: acc.ht + t.ht,
            tva: acc.tva + t.tva,
            ttc: acc.ttc + t.ttc,
        })
    }
}

// ---------------------------------------------------------------------------
// Invoice type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    /// Deposit invoice issued before work starts.
    Acompte,
    /// Balance invoice after one or more deposits.
    Solde,
    /// Single invoice covering the whole job.
    Complete,
}

impl InvoiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceType::Acompte => "acompte",
            InvoiceType::Solde => "solde",
            InvoiceType::Complete => "complete",
        }
    }
}

impl fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acompte" => Ok(InvoiceType::Acompte),
            "solde" => Ok(InvoiceType::Solde),
            "complete" => Ok(InvoiceType::Complete),
            other => Err(CoreError::Validation(format!("Invalid invoice type '{other}'"))),
        }
    }
}

impl TryFrom<String> for InvoiceType {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// What the automatic invoice for a project should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceInvoice {
    pub invoice_type: InvoiceType,
    pub totals: Totals,
}

/// Compute the automatic invoice given the billable totals and any deposits
/// already invoiced for the project.
pub fn balance_invoice(billable: Totals, deposits: &[Totals]) -> BalanceInvoice {
    if deposits.is_empty() {
        return BalanceInvoice {
            invoice_type: InvoiceType::Complete,
            totals: billable,
        };
    }
    let deposited: Totals = deposits.iter().copied().sum();
    BalanceInvoice {
        invoice_type: InvoiceType::Solde,
        totals: billable.remaining_after(deposited),
    }
}

/// Due date for an invoice issued on `issued_on`.
pub fn due_date(issued_on: NaiveDate, payment_terms_days: i32) -> NaiveDate {
    issued_on + chrono::Duration::days(i64::from(payment_terms_days.max(0)))
}

// ---------------------------------------------------------------------------
// Payment status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Statuses reachable from `self`. Payment status never moves backwards.
    pub fn valid_transitions(self) -> &'static [PaymentStatus] {
        use PaymentStatus::*;
        match self {
            Unpaid => &[Partial, Paid],
            Partial => &[Partial, Paid, Refunded],
            Paid => &[Refunded],
            Refunded => &[],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "partial" => Ok(PaymentStatus::Partial),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::Validation(format!("Invalid payment status '{other}'"))),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

fn validate_payment_transition(from: PaymentStatus, to: PaymentStatus) -> Result<(), CoreError> {
    let allowed = from.valid_transitions();
    if allowed.contains(&to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Result of applying a payment to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplied {
    pub amount_paid: Cents,
    pub status: PaymentStatus,
}

/// Apply a payment of `amount` to an invoice.
pub fn apply_payment(
    current: PaymentStatus,
    total_ttc: Cents,
    already_paid: Cents,
    amount: Cents,
) -> Result<PaymentApplied, CoreError> {
    if amount <= 0 {
        return Err(CoreError::Validation("Payment amount must be positive".into()));
    }
    let amount_paid = already_paid + amount;
    if amount_paid > total_ttc {
        return Err(CoreError::Validation(format!(
            "Payment of {amount} cents exceeds the outstanding balance of {} cents",
            total_ttc - already_paid
        )));
    }
    let status = if amount_paid == total_ttc {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    };
    validate_payment_transition(current, status)?;
    Ok(PaymentApplied {
        amount_paid,
        status,
    })
}

/// Validate a refund of an invoice currently in `current`.
pub fn validate_refund(current: PaymentStatus) -> Result<(), CoreError> {
    validate_payment_transition(current, PaymentStatus::Refunded)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn totals_new_derives_ttc() {
        let t = Totals::new(100_000, 20_000);
        assert_eq!(t.ttc, 120_000);
    }

    #[test]
    fn no_deposit_means_complete_invoice() {
        let billable = Totals::new(100_000, 20_000);
        let inv = balance_invoice(billable, &[]);
        assert_eq!(inv.invoice_type, InvoiceType::Complete);
        assert_eq!(inv.totals, billable);
    }

    #[test]
    fn deposits_are_subtracted_for_solde() {
        let billable = Totals::new(100_000, 20_000);
        let deposit = Totals::new(30_000, 6_000);
        let inv = balance_invoice(billable, &[deposit]);
        assert_eq!(inv.invoice_type, InvoiceType::Solde);
        assert_eq!(inv.totals, Totals::new(70_000, 14_000));
    }

    #[test]
    fn over_deposited_balance_stays_consistent() {
        let billable = Totals::new(100_000, 20_000);
        let deposit = Totals {
            ht: 105_000,
            tva: 15_000,
            ttc: 120_000,
        };
        let inv = balance_invoice(billable, &[deposit]);
        assert_eq!(inv.totals, Totals::default());
        assert_eq!(inv.totals.ttc, inv.totals.ht + inv.totals.tva);
    }

    #[test]
    fn over_deducted_component_is_carried_by_the_other() {
        let billable = Totals::new(100_000, 20_000);
        let deposit = Totals::new(105_000, 5_000);
        let inv = balance_invoice(billable, &[deposit]);
        assert_eq!(inv.totals, Totals::new(0, 10_000));
        assert_eq!(inv.totals.ttc, inv.totals.ht + inv.totals.tva);
    }

    #[test]
    fn oversized_deposits_clamp_to_zero() {
        let inv = balance_invoice(Totals::new(10_000, 2_000), &[Totals::new(50_000, 10_000)]);
        assert_eq!(inv.totals, Totals::default());
    }

    #[test]
    fn due_date_adds_terms() {
        let issued = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(due_date(issued, 30), NaiveDate::from_ymd_opt(2026, 2, 14).unwrap());
        assert_eq!(due_date(issued, -5), issued);
    }

    #[test]
    fn full_payment_marks_paid() {
        let applied = apply_payment(PaymentStatus::Unpaid, 120_000, 0, 120_000).unwrap();
        assert_eq!(applied.status, PaymentStatus::Paid);
        assert_eq!(applied.amount_paid, 120_000);
    }

    #[test]
    fn partial_then_full() {
        let first = apply_payment(PaymentStatus::Unpaid, 120_000, 0, 20_000).unwrap();
        assert_eq!(first.status, PaymentStatus::Partial);
        let second =
            apply_payment(first.status, 120_000, first.amount_paid, 100_000).unwrap();
        assert_eq!(second.status, PaymentStatus::Paid);
    }

    #[test]
    fn overpayment_rejected() {
        let err = apply_payment(PaymentStatus::Unpaid, 1_000, 0, 1_001).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn paid_invoice_cannot_take_more_payments() {
        let err = apply_payment(PaymentStatus::Paid, 1_000, 1_000, 1).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn refunded_is_terminal() {
        assert!(validate_refund(PaymentStatus::Paid).is_ok());
        assert_matches!(
            validate_refund(PaymentStatus::Refunded),
            Err(CoreError::InvalidTransition { .. })
        );
        assert_matches!(
            validate_refund(PaymentStatus::Unpaid),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn zero_payment_rejected() {
        assert!(apply_payment(PaymentStatus::Unpaid, 1_000, 0, 0).is_err());
    }
}
