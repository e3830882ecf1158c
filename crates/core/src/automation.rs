//! Planning of the side effects triggered by project status changes and
//! quote signatures.
//!
//! The repository layer loads the current state, asks this module what to
//! do, then applies the plan inside a single transaction. Keeping the
//! decisions here makes every rule testable without a database.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CoreError;
use crate::project_status::{self, ProjectStatus, TransitionRejection};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Tenant settings
// ---------------------------------------------------------------------------

/// Default payment terms for automatic invoices, in days.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i32 = 30;

/// Per-tenant automation settings (`tenants` columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomationSettings {
    /// Status whose entry creates the automatic invoice (`pret` or `livre`).
    pub invoice_trigger: ProjectStatus,
    pub payment_terms_days: i32,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            invoice_trigger: ProjectStatus::Pret,
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
        }
    }
}

/// Parse a stored invoice trigger. Unknown or unsupported values fall back to
/// `pret` so a misconfigured tenant still gets invoiced.
pub fn parse_invoice_trigger(raw: &str) -> ProjectStatus {
    match raw.parse::<ProjectStatus>() {
        Ok(status) if status.is_invoice_trigger_candidate() => status,
        _ => ProjectStatus::Pret,
    }
}

// ---------------------------------------------------------------------------
// Status change planning
// ---------------------------------------------------------------------------

/// The persisted facts the planner needs about a project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectFacts {
    pub status: ProjectStatus,
    pub has_auto_invoice: bool,
    pub stock_consumed: bool,
    pub powder_id: Option<DbId>,
    pub estimated_consumption_kg: f64,
}

/// What a validated status change must do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusChangePlan {
    pub from: ProjectStatus,
    pub to: ProjectStatus,
    pub create_invoice: bool,
    /// Powder and quantity to consume, when entering production.
    pub consume_stock: Option<(DbId, f64)>,
    pub set_delivered_date: bool,
}

/// Validate the transition and decide its side effects.
pub fn plan_status_change(
    facts: &ProjectFacts,
    target: ProjectStatus,
    role: &str,
    settings: &AutomationSettings,
) -> Result<StatusChangePlan, TransitionRejection> {
    project_status::check_transition(facts.status, target, role)?;

    let create_invoice = target == settings.invoice_trigger && !facts.has_auto_invoice;

    let consume_stock = match facts.powder_id {
        Some(powder_id)
            if target.consumes_material()
                && !facts.stock_consumed
                && facts.estimated_consumption_kg > 0.0 =>
        {
            Some((powder_id, facts.estimated_consumption_kg))
        }
        _ => None,
    };

    Ok(StatusChangePlan {
        from: facts.status,
        to: target,
        create_invoice,
        consume_stock,
        set_delivered_date: target == ProjectStatus::Livre,
    })
}

/// Result of `on_status_change`, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeOutcome {
    pub success: bool,
    pub project_id: DbId,
    pub previous_status: ProjectStatus,
    pub status: ProjectStatus,
    pub facture_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facture_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facture_numero: Option<String>,
    pub stock_updated: bool,
}

// ---------------------------------------------------------------------------
// Quote signature
// ---------------------------------------------------------------------------

/// Refuse to sign a quote twice.
pub fn ensure_unsigned(quote_id: DbId, signed_at: Option<Timestamp>) -> Result<(), CoreError> {
    match signed_at {
        Some(_) => Err(CoreError::AlreadySigned(quote_id)),
        None => Ok(()),
    }
}

/// Quote statuses that can no longer be signed.
pub const CLOSED_QUOTE_STATUSES: [&str; 2] = ["refuse", "expire"];

/// Refuse to sign a quote that is closed or past its validity date. Checked
/// after [`ensure_unsigned`].
pub fn ensure_signable(
    quote_id: DbId,
    status: &str,
    valid_until: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), CoreError> {
    if CLOSED_QUOTE_STATUSES.contains(&status) {
        return Err(CoreError::Conflict(format!(
            "Quote {quote_id} is '{status}' and can no longer be signed"
        )));
    }
    match valid_until {
        Some(limit) if limit < today => Err(CoreError::Conflict(format!(
            "Quote {quote_id} was valid until {limit} and can no longer be signed"
        ))),
        _ => Ok(()),
    }
}

/// Result of `on_quote_signed`, returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteSignedOutcome {
    pub success: bool,
    pub quote_id: DbId,
    pub projet_created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projet_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projet_numero: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project_status::RejectionReason;
    use crate::roles::{ROLE_ADMIN, ROLE_MEMBER};
    use assert_matches::assert_matches;
    use ProjectStatus::*;

    fn facts(status: ProjectStatus) -> ProjectFacts {
        ProjectFacts {
            status,
            has_auto_invoice: false,
            stock_consumed: false,
            powder_id: Some(DbId::from_u128(7)),
            estimated_consumption_kg: 3.5,
        }
    }

    #[test]
    fn reaching_trigger_creates_invoice() {
        let plan = plan_status_change(
            &facts(ControleQualite),
            Pret,
            ROLE_MEMBER,
            &AutomationSettings::default(),
        )
        .unwrap();
        assert!(plan.create_invoice);
        assert!(plan.consume_stock.is_none());
        assert!(!plan.set_delivered_date);
    }

    #[test]
    fn existing_auto_invoice_prevents_duplicate() {
        let mut f = facts(ControleQualite);
        f.has_auto_invoice = true;
        let plan =
            plan_status_change(&f, Pret, ROLE_MEMBER, &AutomationSettings::default()).unwrap();
        assert!(!plan.create_invoice);
    }

    #[test]
    fn livre_trigger_ignores_pret() {
        let settings = AutomationSettings {
            invoice_trigger: Livre,
            ..AutomationSettings::default()
        };
        let at_pret = plan_status_change(&facts(ControleQualite), Pret, ROLE_MEMBER, &settings)
            .unwrap();
        assert!(!at_pret.create_invoice);

        let at_livre = plan_status_change(&facts(Pret), Livre, ROLE_MEMBER, &settings).unwrap();
        assert!(at_livre.create_invoice);
        assert!(at_livre.set_delivered_date);
    }

    #[test]
    fn entering_treatment_consumes_once() {
        let plan = plan_status_change(
            &facts(EnPreparation),
            EnTraitement,
            ROLE_MEMBER,
            &AutomationSettings::default(),
        )
        .unwrap();
        assert_eq!(plan.consume_stock, Some((DbId::from_u128(7), 3.5)));

        let mut rework = facts(ControleQualite);
        rework.stock_consumed = true;
        let plan = plan_status_change(
            &rework,
            EnTraitement,
            ROLE_MEMBER,
            &AutomationSettings::default(),
        )
        .unwrap();
        assert!(plan.consume_stock.is_none());
    }

    #[test]
    fn no_powder_means_no_consumption() {
        let mut f = facts(EnPreparation);
        f.powder_id = None;
        let plan = plan_status_change(&f, EnTraitement, ROLE_MEMBER, &AutomationSettings::default())
            .unwrap();
        assert!(plan.consume_stock.is_none());
    }

    #[test]
    fn invalid_transition_is_rejected_before_planning() {
        let err = plan_status_change(&facts(Pret), Pret, ROLE_MEMBER, &AutomationSettings::default())
            .unwrap_err();
        assert_eq!(err.reason, RejectionReason::InvalidTransition);
    }

    #[test]
    fn cancellation_requires_privilege() {
        let settings = AutomationSettings::default();
        let err = plan_status_change(&facts(Devis), Annule, ROLE_MEMBER, &settings).unwrap_err();
        assert_eq!(err.reason, RejectionReason::InsufficientPermission);
        assert!(plan_status_change(&facts(Devis), Annule, ROLE_ADMIN, &settings).is_ok());
    }

    #[test]
    fn declined_and_lapsed_quotes_are_not_signable() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
        let id = DbId::nil();
        assert!(ensure_signable(id, "envoye", None, today).is_ok());
        assert!(ensure_signable(id, "envoye", Some(today), today).is_ok());
        assert_matches!(
            ensure_signable(id, "refuse", None, today),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            ensure_signable(id, "expire", None, today),
            Err(CoreError::Conflict(_))
        );
        let yesterday = today.pred_opt().unwrap();
        assert_matches!(
            ensure_signable(id, "envoye", Some(yesterday), today),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn trigger_parsing_falls_back_to_pret() {
        assert_eq!(parse_invoice_trigger("livre"), Livre);
        assert_eq!(parse_invoice_trigger("pret"), Pret);
        assert_eq!(parse_invoice_trigger("sechage"), Pret);
        assert_eq!(parse_invoice_trigger("garbage"), Pret);
    }

    #[test]
    fn signed_quote_is_refused() {
        let id = DbId::from_u128(1);
        assert!(ensure_unsigned(id, None).is_ok());
        assert_matches!(
            ensure_unsigned(id, Some(chrono::Utc::now())),
            Err(CoreError::AlreadySigned(q)) if q == id
        );
    }

    #[test]
    fn outcome_omits_absent_invoice() {
        let outcome = StatusChangeOutcome {
            success: true,
            project_id: DbId::nil(),
            previous_status: Sechage,
            status: ControleQualite,
            facture_created: false,
            facture_id: None,
            facture_numero: None,
            stock_updated: false,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("facture_id").is_none());
        assert_eq!(json["status"], "controle_qualite");
    }
}
