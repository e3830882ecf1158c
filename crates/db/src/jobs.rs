//! Externally triggered maintenance jobs.
//!
//! Each job is stateless and tenant-scoped. A scheduler (cron or the
//! platform's) calls the matching admin endpoint.

use atelier_core::audit::{self, actions, entities};
use atelier_core::notification::{event_types, NotificationEvent};
use atelier_core::numbering::DocumentType;
use atelier_core::stock::{self, AlertAction};
use atelier_core::types::DbId;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use crate::automation::{enqueue_events, record_audit, Executed};
use crate::models::audit::CreateAuditLog;
use crate::repositories::{AuditLogRepo, NumberingRepo, NumeroRepair, StockRepo};

// ---------------------------------------------------------------------------
// Numero repair
// ---------------------------------------------------------------------------

fn audit_entity(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::Facture => entities::INVOICE,
        DocumentType::Devis => entities::QUOTE,
        DocumentType::Projet => entities::PROJECT,
        DocumentType::BonLivraison => entities::DELIVERY_NOTE,
    }
}

/// Replace every non-canonical numero of the tenant with a fresh one.
pub async fn repair_numeros(
    pool: &PgPool,
    tenant_id: DbId,
    actor_id: DbId,
) -> Result<Vec<NumeroRepair>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut repairs = Vec::new();

    for doc_type in DocumentType::ALL {
        let malformed = NumberingRepo::find_malformed(&mut *tx, tenant_id, doc_type).await?;
        for (id, old_numero) in malformed {
            let new_numero = NumberingRepo::generate(&mut *tx, tenant_id, doc_type).await;
            NumberingRepo::replace_numero(&mut *tx, tenant_id, doc_type, id, &new_numero).await?;

            record_audit(
                &mut *tx,
                tenant_id,
                CreateAuditLog {
                    actor_id: Some(actor_id),
                    action_type: actions::NUMERO_REPAIR,
                    entity_type: audit_entity(doc_type),
                    entity_id: id,
                    details_json: audit::before_after(
                        json!({ "numero": old_numero }),
                        json!({ "numero": new_numero }),
                    ),
                },
            )
            .await;

            repairs.push(NumeroRepair {
                document_type: doc_type,
                id,
                old_numero,
                new_numero,
            });
        }
    }

    tx.commit().await?;

    tracing::info!(tenant_id = %tenant_id, repaired = repairs.len(), "Numero repair complete");
    Ok(repairs)
}

// ---------------------------------------------------------------------------
// Stock alert sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct StockSweepReport {
    pub checked: usize,
    pub opened: Vec<DbId>,
    pub resolved: Vec<DbId>,
}

/// Open alerts for powders below their threshold and resolve recovered ones.
pub async fn sweep_stock_alerts(
    pool: &PgPool,
    tenant_id: DbId,
) -> Result<Executed<StockSweepReport>, sqlx::Error> {
    let states = StockRepo::list_alert_states(pool, tenant_id).await?;
    let mut tx = pool.begin().await?;
    let mut report = StockSweepReport {
        checked: states.len(),
        ..StockSweepReport::default()
    };
    let mut events = Vec::new();

    for powder in states {
        let action = stock::alert_action(
            powder.stock_kg,
            powder.alert_threshold_kg,
            powder.open_alert_id.is_some(),
        );
        match (action, powder.open_alert_id) {
            (AlertAction::Open, _) => {
                let opened = StockRepo::open_alert(
                    &mut *tx,
                    tenant_id,
                    powder.id,
                    powder.stock_kg,
                    powder.alert_threshold_kg,
                )
                .await?;
                if opened.is_some() {
                    report.opened.push(powder.id);
                    events.push(
                        NotificationEvent::new(event_types::STOCK_ALERT, tenant_id)
                            .with_entity(powder.id)
                            .with_data(json!({
                                "reference": powder.reference,
                                "name": powder.name,
                                "stock_kg": powder.stock_kg,
                                "threshold_kg": powder.alert_threshold_kg,
                            })),
                    );
                }
            }
            (AlertAction::Resolve, Some(alert_id)) => {
                if StockRepo::resolve_alert(&mut *tx, tenant_id, alert_id).await? {
                    report.resolved.push(powder.id);
                }
            }
            _ => {}
        }
    }

    enqueue_events(&mut *tx, &events).await;
    tx.commit().await?;

    tracing::info!(
        tenant_id = %tenant_id,
        checked = report.checked,
        opened = report.opened.len(),
        resolved = report.resolved.len(),
        "Stock alert sweep complete",
    );
    Ok(Executed {
        outcome: report,
        events,
    })
}

// ---------------------------------------------------------------------------
// Audit retention
// ---------------------------------------------------------------------------

/// Delete the tenant's audit entries older than `retention_days`.
pub async fn purge_audit_logs(
    pool: &PgPool,
    tenant_id: DbId,
    retention_days: i64,
) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::days(retention_days.max(1));
    let deleted = AuditLogRepo::purge_older_than(pool, tenant_id, cutoff).await?;
    if deleted > 0 {
        tracing::info!(tenant_id = %tenant_id, deleted, "Purged expired audit entries");
    }
    Ok(deleted)
}

// ---------------------------------------------------------------------------
// Audit chain verification
// ---------------------------------------------------------------------------

/// Re-hash the tenant's retained audit chain from its purge checkpoint.
pub async fn verify_audit_chain(
    pool: &PgPool,
    tenant_id: DbId,
) -> Result<audit::ChainVerification, sqlx::Error> {
    let anchor = {
        let mut conn = pool.acquire().await?;
        AuditLogRepo::checkpoint_hash(&mut *conn, tenant_id).await?
    };
    let entries = AuditLogRepo::list_chain(pool, tenant_id).await?;
    let links: Vec<audit::ChainLink<'_>> = entries
        .iter()
        .map(|entry| audit::ChainLink {
            payload: audit::ChainPayload {
                tenant_id: entry.tenant_id,
                actor_id: entry.actor_id,
                action: &entry.action_type,
                entity_type: &entry.entity_type,
                entity_id: entry.entity_id,
                details: &entry.details_json,
            },
            integrity_hash: &entry.integrity_hash,
        })
        .collect();

    let verification = audit::verify_chain(anchor.as_deref(), &links);
    if let Some(index) = verification.first_broken {
        tracing::warn!(
            tenant_id = %tenant_id,
            seq = entries[index].seq,
            "Audit chain broken",
        );
    }
    Ok(verification)
}
