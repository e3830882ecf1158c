//! Transactional execution of the workshop automations.
//!
//! Each entry point runs in one database transaction with the target row
//! locked (`SELECT ... FOR UPDATE`). The pure planning lives in
//! `atelier_core::automation`; this module loads the facts, applies the plan
//! and writes the audit trail and outbox rows.
//!
//! Audit and outbox writes run in savepoints. When one fails the savepoint is
//! rolled back, a warning is logged and the primary mutation still commits.

use atelier_core::audit::{self, actions, entities};
use atelier_core::automation::{
    self as plan, ProjectFacts, QuoteSignedOutcome, StatusChangeOutcome,
};
use atelier_core::error::CoreError;
use atelier_core::invoice::{self, PaymentStatus};
use atelier_core::notification::{event_types, NotificationEvent};
use atelier_core::numbering::DocumentType;
use atelier_core::project_status::{ProjectStatus, TransitionRejection};
use atelier_core::roles;
use atelier_core::signing::{self, SignatureMethod};
use atelier_core::types::DbId;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx::{Connection, PgConnection, PgPool};

use crate::models::audit::CreateAuditLog;
use crate::models::invoice::{CreateInvoice, Invoice};
use crate::models::project::{CreateProject, Project};
use crate::models::quote::QuoteSigningLink;
use crate::models::tenant::Tenant;
use crate::repositories::{
    AuditLogRepo, InvoiceRepo, NumberingRepo, OutboxRepo, ProjectRepo, QuoteRepo,
    SigningLinkRepo, StockRepo, TenantRepo,
};

// ---------------------------------------------------------------------------
// Errors and shared types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<TransitionRejection> for AutomationError {
    fn from(rejection: TransitionRejection) -> Self {
        AutomationError::Core(rejection.into())
    }
}

/// The authenticated member performing an operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: DbId,
    pub role: String,
}

/// Who signs a quote.
#[derive(Debug, Clone)]
pub enum Signer {
    /// A logged-in member signing on the client's behalf.
    Member { user_id: DbId, name: String },
    /// The client, through a public signing link.
    PublicLink { name: String },
}

impl Signer {
    fn user_id(&self) -> Option<DbId> {
        match self {
            Signer::Member { user_id, .. } => Some(*user_id),
            Signer::PublicLink { .. } => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Signer::Member { name, .. } | Signer::PublicLink { name } => name,
        }
    }

    fn method(&self) -> SignatureMethod {
        match self {
            Signer::Member { .. } => SignatureMethod::Authenticated,
            Signer::PublicLink { .. } => SignatureMethod::PublicLink,
        }
    }
}

/// A committed operation with the events it enqueued.
///
/// Callers publish `events` on the in-process bus after commit.
#[derive(Debug)]
pub struct Executed<T> {
    pub outcome: T,
    pub events: Vec<NotificationEvent>,
}

// ---------------------------------------------------------------------------
// Best-effort side effects
// ---------------------------------------------------------------------------

/// Append an audit entry in a savepoint. Failures are logged, never returned.
pub(crate) async fn record_audit(conn: &mut PgConnection, tenant_id: DbId, entry: CreateAuditLog) {
    if let Err(e) = try_record_audit(conn, tenant_id, &entry).await {
        tracing::warn!(
            tenant_id = %tenant_id,
            action = entry.action_type,
            entity_id = %entry.entity_id,
            error = %e,
            "Failed to record audit entry",
        );
    }
}

async fn try_record_audit(
    conn: &mut PgConnection,
    tenant_id: DbId,
    entry: &CreateAuditLog,
) -> Result<(), sqlx::Error> {
    let mut savepoint = conn.begin().await?;
    AuditLogRepo::insert(&mut *savepoint, tenant_id, entry).await?;
    savepoint.commit().await
}

/// Enqueue events in a savepoint each. Failures are logged, never returned.
pub(crate) async fn enqueue_events(conn: &mut PgConnection, events: &[NotificationEvent]) {
    for event in events {
        if let Err(e) = try_enqueue(conn, event).await {
            tracing::warn!(
                tenant_id = %event.tenant_id,
                event_type = %event.event_type,
                error = %e,
                "Failed to enqueue notification",
            );
        }
    }
}

async fn try_enqueue(conn: &mut PgConnection, event: &NotificationEvent) -> Result<(), sqlx::Error> {
    let mut savepoint = conn.begin().await?;
    OutboxRepo::enqueue(&mut *savepoint, event).await?;
    savepoint.commit().await
}

async fn load_tenant(conn: &mut PgConnection, tenant_id: DbId) -> Result<Tenant, AutomationError> {
    TenantRepo::find_by_id(conn, tenant_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "tenant",
                id: tenant_id,
            }
            .into()
        })
}

// ---------------------------------------------------------------------------
// Project status change
// ---------------------------------------------------------------------------

/// Move a project to `target`, applying invoicing and stock automations.
pub async fn on_status_change(
    pool: &PgPool,
    tenant_id: DbId,
    project_id: DbId,
    target: ProjectStatus,
    actor: &Actor,
) -> Result<Executed<StatusChangeOutcome>, AutomationError> {
    let mut tx = pool.begin().await?;

    let settings = load_tenant(&mut *tx, tenant_id).await?.automation_settings();
    let project = ProjectRepo::find_for_update(&mut *tx, tenant_id, project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::PROJECT,
            id: project_id,
        })?;

    let facts = ProjectFacts {
        status: project.status,
        has_auto_invoice: InvoiceRepo::has_auto_invoice(&mut *tx, tenant_id, project_id).await?,
        stock_consumed: project.stock_consumed,
        powder_id: project.powder_id,
        estimated_consumption_kg: project.estimated_consumption_kg,
    };
    let plan = plan::plan_status_change(&facts, target, &actor.role, &settings)?;

    let updated = ProjectRepo::update_status(
        &mut *tx,
        tenant_id,
        project_id,
        plan.to,
        plan.set_delivered_date,
    )
    .await?;

    let invoice = if plan.create_invoice {
        Some(create_auto_invoice(&mut *tx, tenant_id, &updated, settings.payment_terms_days).await?)
    } else {
        None
    };

    let mut stock_level = None;
    if let Some((powder_id, quantity_kg)) = plan.consume_stock {
        stock_level = StockRepo::consume_for_project(
            &mut *tx,
            tenant_id,
            powder_id,
            project_id,
            quantity_kg,
            Some(actor.user_id),
        )
        .await?;
        if stock_level.is_some() {
            ProjectRepo::mark_stock_consumed(&mut *tx, tenant_id, project_id).await?;
        }
    }

    record_audit(
        &mut *tx,
        tenant_id,
        CreateAuditLog {
            actor_id: Some(actor.user_id),
            action_type: actions::PROJECT_STATUS_CHANGE,
            entity_type: entities::PROJECT,
            entity_id: project_id,
            details_json: json!({
                "numero": updated.numero,
                "before": { "status": plan.from },
                "after": { "status": plan.to },
                "facture_id": invoice.as_ref().map(|i| i.id),
            }),
        },
    )
    .await;

    if let Some(ref inv) = invoice {
        record_audit(
            &mut *tx,
            tenant_id,
            CreateAuditLog {
                actor_id: Some(actor.user_id),
                action_type: actions::INVOICE_AUTO_CREATE,
                entity_type: entities::INVOICE,
                entity_id: inv.id,
                details_json: audit::before_after(
                    serde_json::Value::Null,
                    json!({
                        "numero": inv.numero,
                        "project_id": project_id,
                        "invoice_type": inv.invoice_type,
                        "total_ttc_cents": inv.total_ttc_cents,
                    }),
                ),
            },
        )
        .await;
    }

    if let (Some((powder_id, quantity_kg)), Some(level)) = (plan.consume_stock, stock_level) {
        record_audit(
            &mut *tx,
            tenant_id,
            CreateAuditLog {
                actor_id: Some(actor.user_id),
                action_type: actions::STOCK_CONSUME,
                entity_type: entities::POWDER,
                entity_id: powder_id,
                details_json: json!({
                    "project_id": project_id,
                    "quantity_kg": quantity_kg,
                    "stock_kg": level,
                }),
            },
        )
        .await;
    }

    let events = status_change_events(tenant_id, &updated, plan.from, invoice.as_ref());
    enqueue_events(&mut *tx, &events).await;

    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant_id,
        project_id = %project_id,
        from = %plan.from,
        to = %plan.to,
        facture_created = invoice.is_some(),
        stock_updated = stock_level.is_some(),
        "Project status changed",
    );

    Ok(Executed {
        outcome: StatusChangeOutcome {
            success: true,
            project_id,
            previous_status: plan.from,
            status: plan.to,
            facture_created: invoice.is_some(),
            facture_id: invoice.as_ref().map(|i| i.id),
            facture_numero: invoice.map(|i| i.numero),
            stock_updated: stock_level.is_some(),
        },
        events,
    })
}

/// Create the automatic balance invoice for a project.
///
/// Totals come from the accepted quote when the project has one, otherwise
/// from the project itself. Deposits already invoiced are subtracted.
async fn create_auto_invoice(
    conn: &mut PgConnection,
    tenant_id: DbId,
    project: &Project,
    payment_terms_days: i32,
) -> Result<Invoice, sqlx::Error> {
    let quote_totals = match project.quote_id {
        Some(quote_id) => QuoteRepo::accepted_totals(&mut *conn, tenant_id, quote_id).await?,
        None => None,
    };
    let billable = quote_totals
        .map(|(ht, tva, ttc)| invoice::Totals { ht, tva, ttc })
        .unwrap_or_else(|| project.totals());
    let deposits = InvoiceRepo::deposit_totals(&mut *conn, tenant_id, project.id).await?;
    let balance = invoice::balance_invoice(billable, &deposits);

    let issued_on = Utc::now().date_naive();
    let numero = NumberingRepo::generate(&mut *conn, tenant_id, DocumentType::Facture).await;

    InvoiceRepo::create(
        conn,
        tenant_id,
        &numero,
        &CreateInvoice {
            project_id: Some(project.id),
            client_id: project.client_id,
            invoice_type: balance.invoice_type,
            totals: balance.totals,
            issued_on,
            due_date: invoice::due_date(issued_on, payment_terms_days),
            auto_created: true,
        },
    )
    .await
}

fn status_change_events(
    tenant_id: DbId,
    project: &Project,
    previous: ProjectStatus,
    invoice: Option<&Invoice>,
) -> Vec<NotificationEvent> {
    let mut events = vec![NotificationEvent::new(event_types::PROJECT_STATUS_CHANGED, tenant_id)
        .with_entity(project.id)
        .with_data(json!({
            "numero": project.numero,
            "name": project.name,
            "previous_status": previous,
            "status": project.status,
        }))];
    if let Some(inv) = invoice {
        events.push(
            NotificationEvent::new(event_types::INVOICE_AUTO_CREATED, tenant_id)
                .with_entity(inv.id)
                .with_data(json!({
                    "numero": inv.numero,
                    "project_id": project.id,
                    "project_numero": project.numero,
                    "invoice_type": inv.invoice_type,
                    "total_ttc_cents": inv.total_ttc_cents,
                })),
        );
    }
    events
}

// ---------------------------------------------------------------------------
// Quote signature
// ---------------------------------------------------------------------------

/// Sign a quote and create its project.
pub async fn on_quote_signed(
    pool: &PgPool,
    tenant_id: DbId,
    quote_id: DbId,
    signer: &Signer,
) -> Result<Executed<QuoteSignedOutcome>, AutomationError> {
    let mut tx = pool.begin().await?;
    let executed = sign_quote(&mut *tx, tenant_id, quote_id, signer).await?;
    tx.commit().await?;
    Ok(executed)
}

/// Sign the quote behind a public signing link and consume the link.
///
/// Unknown, expired and already-used tokens are all reported as not found.
pub async fn sign_with_public_token(
    pool: &PgPool,
    token: &str,
    signer_name: &str,
) -> Result<Executed<QuoteSignedOutcome>, AutomationError> {
    let mut tx = pool.begin().await?;

    let link = SigningLinkRepo::find_active_for_update(&mut *tx, &signing::hash_token(token))
        .await?
        .ok_or(CoreError::NotFound {
            entity: "signing_link",
            id: DbId::nil(),
        })?;

    let signer = Signer::PublicLink {
        name: signer_name.to_string(),
    };
    let executed = sign_quote(&mut *tx, link.tenant_id, link.quote_id, &signer).await?;
    SigningLinkRepo::mark_used(&mut *tx, link.id).await?;

    tx.commit().await?;
    Ok(executed)
}

/// A freshly created public signing link. `token` is never stored.
#[derive(Debug, Serialize)]
pub struct SigningLinkCreated {
    #[serde(flatten)]
    pub link: QuoteSigningLink,
    pub token: String,
}

/// Create a public signing link for an unsigned quote.
pub async fn create_signing_link(
    pool: &PgPool,
    tenant_id: DbId,
    quote_id: DbId,
    ttl_hours: i64,
    actor: &Actor,
) -> Result<SigningLinkCreated, AutomationError> {
    let mut tx = pool.begin().await?;

    let quote = QuoteRepo::find_for_update(&mut *tx, tenant_id, quote_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::QUOTE,
            id: quote_id,
        })?;
    plan::ensure_unsigned(quote.id, quote.signed_at)?;
    plan::ensure_signable(quote.id, &quote.status, quote.valid_until, Utc::now().date_naive())?;

    let token = signing::generate_signing_token();
    let expires_at = Utc::now() + chrono::Duration::hours(ttl_hours.max(1));
    let link = SigningLinkRepo::create(
        &mut *tx,
        tenant_id,
        quote_id,
        &token.hash,
        expires_at,
        actor.user_id,
    )
    .await?;

    record_audit(
        &mut *tx,
        tenant_id,
        CreateAuditLog {
            actor_id: Some(actor.user_id),
            action_type: actions::QUOTE_SIGNING_LINK_CREATE,
            entity_type: entities::QUOTE,
            entity_id: quote_id,
            details_json: json!({ "link_id": link.id, "expires_at": link.expires_at }),
        },
    )
    .await;

    tx.commit().await?;
    Ok(SigningLinkCreated {
        link,
        token: token.plaintext,
    })
}

async fn sign_quote(
    conn: &mut PgConnection,
    tenant_id: DbId,
    quote_id: DbId,
    signer: &Signer,
) -> Result<Executed<QuoteSignedOutcome>, AutomationError> {
    let quote = QuoteRepo::find_for_update(&mut *conn, tenant_id, quote_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: entities::QUOTE,
            id: quote_id,
        })?;
    plan::ensure_unsigned(quote.id, quote.signed_at)?;
    plan::ensure_signable(quote.id, &quote.status, quote.valid_until, Utc::now().date_naive())?;
    let signer_name = signing::normalize_signer_name(signer.name())?;

    let signed = QuoteRepo::mark_signed(
        &mut *conn,
        tenant_id,
        quote_id,
        signer.user_id(),
        &signer_name,
        signer.method(),
    )
    .await?;

    let numero = NumberingRepo::generate(&mut *conn, tenant_id, DocumentType::Projet).await;
    let project = ProjectRepo::create(
        &mut *conn,
        tenant_id,
        &numero,
        &CreateProject {
            name: signed.project_name(),
            client_id: signed.client_id,
            powder_id: signed.powder_id,
            quote_id: Some(signed.id),
            items: signed.items.clone(),
            deposit_date: None,
            promised_date: None,
            totals: signed.totals(),
            estimated_consumption_kg: signed.estimated_consumption_kg,
            auto_created: true,
        },
    )
    .await?;

    record_audit(
        &mut *conn,
        tenant_id,
        CreateAuditLog {
            actor_id: signer.user_id(),
            action_type: actions::QUOTE_SIGN,
            entity_type: entities::QUOTE,
            entity_id: quote_id,
            details_json: audit::before_after(
                json!({ "status": quote.status }),
                json!({
                    "status": signed.status,
                    "signer_name": signer_name,
                    "signature_method": signer.method(),
                    "projet_id": project.id,
                }),
            ),
        },
    )
    .await;
    record_audit(
        &mut *conn,
        tenant_id,
        CreateAuditLog {
            actor_id: signer.user_id(),
            action_type: actions::PROJECT_AUTO_CREATE,
            entity_type: entities::PROJECT,
            entity_id: project.id,
            details_json: json!({ "numero": project.numero, "quote_id": quote_id }),
        },
    )
    .await;

    let events = vec![
        NotificationEvent::new(event_types::QUOTE_SIGNED, tenant_id)
            .with_entity(quote_id)
            .with_data(json!({
                "numero": signed.numero,
                "signer_name": signer_name,
                "signature_method": signer.method(),
                "projet_numero": project.numero,
            })),
        NotificationEvent::new(event_types::PROJECT_AUTO_CREATED, tenant_id)
            .with_entity(project.id)
            .with_data(json!({ "numero": project.numero, "quote_numero": signed.numero })),
    ];
    enqueue_events(&mut *conn, &events).await;

    tracing::info!(
        tenant_id = %tenant_id,
        quote_id = %quote_id,
        projet_numero = %project.numero,
        method = %signer.method(),
        "Quote signed",
    );

    Ok(Executed {
        outcome: QuoteSignedOutcome {
            success: true,
            quote_id,
            projet_created: true,
            projet_id: Some(project.id),
            projet_numero: Some(project.numero),
        },
        events,
    })
}

// ---------------------------------------------------------------------------
// Invoice payments
// ---------------------------------------------------------------------------

/// Apply a payment of `amount_cents` to an invoice.
pub async fn record_payment(
    pool: &PgPool,
    tenant_id: DbId,
    invoice_id: DbId,
    amount_cents: i64,
    actor: &Actor,
) -> Result<Executed<Invoice>, AutomationError> {
    let mut tx = pool.begin().await?;

    let current = find_invoice_for_update(&mut *tx, tenant_id, invoice_id).await?;
    let applied = invoice::apply_payment(
        current.payment_status,
        current.total_ttc_cents,
        current.amount_paid_cents,
        amount_cents,
    )?;
    let updated = InvoiceRepo::update_payment(
        &mut *tx,
        tenant_id,
        invoice_id,
        applied.amount_paid,
        applied.status,
    )
    .await?;

    record_audit(
        &mut *tx,
        tenant_id,
        CreateAuditLog {
            actor_id: Some(actor.user_id),
            action_type: actions::INVOICE_PAYMENT,
            entity_type: entities::INVOICE,
            entity_id: invoice_id,
            details_json: json!({
                "amount_cents": amount_cents,
                "before": {
                    "payment_status": current.payment_status,
                    "amount_paid_cents": current.amount_paid_cents,
                },
                "after": {
                    "payment_status": updated.payment_status,
                    "amount_paid_cents": updated.amount_paid_cents,
                },
            }),
        },
    )
    .await;

    let mut events = Vec::new();
    if updated.payment_status == PaymentStatus::Paid {
        events.push(
            NotificationEvent::new(event_types::INVOICE_PAID, tenant_id)
                .with_entity(invoice_id)
                .with_data(json!({
                    "numero": updated.numero,
                    "total_ttc_cents": updated.total_ttc_cents,
                })),
        );
    }
    enqueue_events(&mut *tx, &events).await;

    tx.commit().await?;
    Ok(Executed {
        outcome: updated,
        events,
    })
}

/// Refund an invoice. Restricted to owners and admins.
pub async fn refund_invoice(
    pool: &PgPool,
    tenant_id: DbId,
    invoice_id: DbId,
    actor: &Actor,
) -> Result<Invoice, AutomationError> {
    if !roles::is_privileged(&actor.role) {
        return Err(CoreError::Forbidden("Only owners and admins may refund invoices".into()).into());
    }

    let mut tx = pool.begin().await?;
    let current = find_invoice_for_update(&mut *tx, tenant_id, invoice_id).await?;
    invoice::validate_refund(current.payment_status)?;
    let updated = InvoiceRepo::mark_refunded(&mut *tx, tenant_id, invoice_id).await?;

    record_audit(
        &mut *tx,
        tenant_id,
        CreateAuditLog {
            actor_id: Some(actor.user_id),
            action_type: actions::INVOICE_REFUND,
            entity_type: entities::INVOICE,
            entity_id: invoice_id,
            details_json: audit::before_after(
                json!({ "payment_status": current.payment_status }),
                json!({ "payment_status": updated.payment_status }),
            ),
        },
    )
    .await;

    tx.commit().await?;
    Ok(updated)
}

async fn find_invoice_for_update(
    conn: &mut PgConnection,
    tenant_id: DbId,
    invoice_id: DbId,
) -> Result<Invoice, AutomationError> {
    InvoiceRepo::find_for_update(conn, tenant_id, invoice_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: entities::INVOICE,
                id: invoice_id,
            }
            .into()
        })
}
