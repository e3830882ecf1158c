//! Notification outbox and in-app notification models.

use atelier_core::notification::NotificationEvent;
use atelier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_outbox` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OutboxEntry {
    pub id: DbId,
    pub tenant_id: DbId,
    pub event_type: String,
    pub entity_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub next_attempt_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl OutboxEntry {
    /// Rebuild the event envelope handed to delivery channels.
    pub fn to_event(&self) -> NotificationEvent {
        NotificationEvent {
            event_type: self.event_type.clone(),
            tenant_id: self.tenant_id,
            entity_id: self.entity_id,
            data: self.payload.clone(),
            timestamp: self.created_at,
        }
    }
}

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub tenant_id: DbId,
    pub outbox_id: Option<DbId>,
    pub channel: String,
    pub event_type: String,
    pub entity_id: Option<DbId>,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub created_at: Timestamp,
}
