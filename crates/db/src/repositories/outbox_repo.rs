//! Repository for the durable `notification_outbox`.

use atelier_core::notification::{self, NotificationEvent, MAX_DELIVERY_ATTEMPTS};
use atelier_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::notification::OutboxEntry;

const COLUMNS: &str = "\
    id, tenant_id, event_type, entity_id, payload, attempts, last_error, \
    next_attempt_at, delivered_at, created_at";

/// How long a claimed row stays invisible to other dispatchers.
const CLAIM_LEASE_SECS: f64 = 60.0;

pub struct OutboxRepo;

impl OutboxRepo {
    /// Enqueue an event, usually inside the transaction that produced it.
    pub async fn enqueue(
        conn: &mut PgConnection,
        event: &NotificationEvent,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notification_outbox (tenant_id, event_type, entity_id, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(event.tenant_id)
        .bind(&event.event_type)
        .bind(event.entity_id)
        .bind(&event.data)
        .fetch_one(conn)
        .await
    }

    /// Claim up to `limit` due rows, optionally for one tenant only.
    ///
    /// Claimed rows get their `next_attempt_at` pushed forward by a short
    /// lease. Uses `FOR UPDATE SKIP LOCKED` so concurrent dispatchers never
    /// claim the same row.
    pub async fn claim_due(
        pool: &PgPool,
        tenant_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE notification_outbox \
             SET next_attempt_at = NOW() + $4 * INTERVAL '1 second' \
             WHERE id IN ( \
                 SELECT id FROM notification_outbox \
                 WHERE delivered_at IS NULL AND attempts < $2 AND next_attempt_at <= NOW() \
                   AND ($1::uuid IS NULL OR tenant_id = $1) \
                 ORDER BY created_at ASC \
                 LIMIT $3 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(tenant_id)
            .bind(MAX_DELIVERY_ATTEMPTS)
            .bind(limit)
            .bind(CLAIM_LEASE_SECS)
            .fetch_all(pool)
            .await
    }

    pub async fn mark_delivered(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notification_outbox SET delivered_at = NOW(), last_error = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt and schedule the retry with exponential backoff.
    ///
    /// Returns the new attempt count. Rows reaching the maximum stay
    /// undelivered and are no longer claimed.
    pub async fn mark_failed(
        pool: &PgPool,
        entry: &OutboxEntry,
        error: &str,
    ) -> Result<i32, sqlx::Error> {
        let attempts = entry.attempts + 1;
        let delay = notification::retry_delay_secs(attempts) as f64;
        sqlx::query(
            "UPDATE notification_outbox \
             SET attempts = $2, last_error = $3, next_attempt_at = NOW() + $4 * INTERVAL '1 second' \
             WHERE id = $1",
        )
        .bind(entry.id)
        .bind(attempts)
        .bind(error)
        .bind(delay)
        .execute(pool)
        .await?;
        Ok(attempts)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OutboxEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_outbox WHERE id = $1");
        sqlx::query_as::<_, OutboxEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Event types enqueued for a tenant, oldest first.
    pub async fn list_event_types(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT event_type FROM notification_outbox WHERE tenant_id = $1 \
             ORDER BY created_at ASC, id",
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }
}
