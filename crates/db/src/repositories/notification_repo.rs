//! Repository for the `notifications` table.

use atelier_core::notification::CHANNEL_IN_APP;
use atelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{Notification, OutboxEntry};

/// Column list for `notifications` queries.
const COLUMNS: &str =
    "id, tenant_id, outbox_id, channel, event_type, entity_id, payload, is_read, created_at";

/// Provides creation and listing of in-app notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create the in-app notification for an outbox row.
    ///
    /// Idempotent per outbox row: redelivery after a partial failure does not
    /// duplicate it.
    pub async fn create_in_app(pool: &PgPool, entry: &OutboxEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notifications (tenant_id, outbox_id, channel, event_type, entity_id, payload) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (outbox_id, channel) WHERE outbox_id IS NOT NULL DO NOTHING",
        )
        .bind(entry.tenant_id)
        .bind(entry.id)
        .bind(CHANNEL_IN_APP)
        .bind(&entry.event_type)
        .bind(entry.entity_id)
        .bind(&entry.payload)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Recipients already reached on `channel` for an outbox row.
    pub async fn delivered_recipients(
        pool: &PgPool,
        outbox_id: DbId,
        channel: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT recipient FROM notification_deliveries \
             WHERE outbox_id = $1 AND channel = $2",
        )
        .bind(outbox_id)
        .bind(channel)
        .fetch_all(pool)
        .await
    }

    /// Record that `recipient` was reached on `channel` for an outbox row.
    pub async fn record_delivery(
        pool: &PgPool,
        outbox_id: DbId,
        channel: &str,
        recipient: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notification_deliveries (outbox_id, channel, recipient) \
             VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(outbox_id)
        .bind(channel)
        .bind(recipient)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List a tenant's notifications, newest first.
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE tenant_id = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(tenant_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
