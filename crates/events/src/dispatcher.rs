//! Outbox dispatcher.
//!
//! [`OutboxDispatcher`] claims due rows from `notification_outbox`, writes the
//! in-app notification and, for email-worthy events, mails the tenant's owners
//! and admins. Each recipient reached is recorded, so a retry only mails the
//! ones still missing. Failed rows are rescheduled with exponential backoff until they
//! reach [`MAX_DELIVERY_ATTEMPTS`] and are dead-lettered.
//!
//! The dispatcher wakes on a fixed interval and whenever the [`EventBus`]
//! announces a freshly committed event, so the outbox is the source of truth
//! and the bus only shortens latency.
//!
//! [`EventBus`]: crate::bus::EventBus

use std::time::Duration;

use atelier_core::notification::{NotificationEvent, CHANNEL_EMAIL, MAX_DELIVERY_ATTEMPTS};
use atelier_core::types::DbId;
use atelier_db::models::notification::OutboxEntry;
use atelier_db::repositories::{NotificationRepo, OutboxRepo, TenantRepo};
use atelier_db::DbPool;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::delivery::email::{EmailDelivery, EmailError};

/// Rows claimed per drain.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Why a single outbox row could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Counters for one pass over the outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub claimed: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Rows that just hit the attempt limit.
    pub dead_lettered: usize,
}

/// Delivers outbox rows to the in-app and email channels.
pub struct OutboxDispatcher {
    pool: DbPool,
    email: Option<EmailDelivery>,
    batch_size: i64,
}

impl OutboxDispatcher {
    pub fn new(pool: DbPool, email: Option<EmailDelivery>) -> Self {
        Self {
            pool,
            email,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Claim and deliver one batch of due rows, optionally for one tenant.
    pub async fn drain_once(&self, tenant_id: Option<DbId>) -> Result<DrainReport, sqlx::Error> {
        let entries = OutboxRepo::claim_due(&self.pool, tenant_id, self.batch_size).await?;
        let mut report = DrainReport {
            claimed: entries.len(),
            ..Default::default()
        };

        for entry in &entries {
            match self.deliver(entry).await {
                Ok(()) => {
                    OutboxRepo::mark_delivered(&self.pool, entry.id).await?;
                    report.delivered += 1;
                }
                Err(e) => {
                    let attempts =
                        OutboxRepo::mark_failed(&self.pool, entry, &e.to_string()).await?;
                    report.failed += 1;
                    if attempts >= MAX_DELIVERY_ATTEMPTS {
                        report.dead_lettered += 1;
                        tracing::warn!(
                            outbox_id = %entry.id,
                            tenant_id = %entry.tenant_id,
                            event_type = %entry.event_type,
                            attempts,
                            error = %e,
                            "Notification dead-lettered",
                        );
                    } else {
                        tracing::debug!(
                            outbox_id = %entry.id,
                            attempts,
                            error = %e,
                            "Notification delivery failed, will retry",
                        );
                    }
                }
            }
        }

        if report.claimed > 0 {
            tracing::info!(
                claimed = report.claimed,
                delivered = report.delivered,
                failed = report.failed,
                "Outbox drained",
            );
        }
        Ok(report)
    }

    async fn deliver(&self, entry: &OutboxEntry) -> Result<(), DeliveryError> {
        NotificationRepo::create_in_app(&self.pool, entry).await?;

        let event = entry.to_event();
        if !event.is_email_worthy() {
            return Ok(());
        }
        let Some(email) = &self.email else {
            return Ok(());
        };

        let recipients = TenantRepo::privileged_emails(&self.pool, entry.tenant_id).await?;
        let already_sent =
            NotificationRepo::delivered_recipients(&self.pool, entry.id, CHANNEL_EMAIL).await?;
        for to in recipients.iter().filter(|to| !already_sent.contains(*to)) {
            email.deliver(to, &event).await?;
            NotificationRepo::record_delivery(&self.pool, entry.id, CHANNEL_EMAIL, to).await?;
        }
        Ok(())
    }

    /// Run the dispatch loop until `cancel` fires or the bus is dropped.
    ///
    /// Drains every `poll_interval`, and immediately for the tenant of each
    /// event announced on `receiver`.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<NotificationEvent>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut interval = tokio::time::interval(poll_interval);
        tracing::info!(?poll_interval, "Outbox dispatcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Outbox dispatcher cancelled");
                    break;
                }
                _ = interval.tick() => {
                    self.drain_logged(None).await;
                }
                received = receiver.recv() => match received {
                    Ok(event) => self.drain_logged(Some(event.tenant_id)).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Outbox dispatcher lagged behind the event bus");
                        self.drain_logged(None).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, outbox dispatcher shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn drain_logged(&self, tenant_id: Option<DbId>) {
        if let Err(e) = self.drain_once(tenant_id).await {
            tracing::error!(error = %e, "Outbox drain failed");
        }
    }
}
