//! Notification events produced by the automation layer.
//!
//! Events are written to the durable `notification_outbox` inside the
//! mutating transaction and delivered out of band by the dispatcher.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Event type names (`notification_outbox.event_type`).
pub mod event_types {
    pub const PROJECT_STATUS_CHANGED: &str = "project.status_changed";
    pub const PROJECT_AUTO_CREATED: &str = "project.auto_created";
    pub const QUOTE_SIGNED: &str = "quote.signed";
    pub const INVOICE_AUTO_CREATED: &str = "invoice.auto_created";
    pub const INVOICE_PAID: &str = "invoice.paid";
    pub const STOCK_ALERT: &str = "stock.alert";
}

/// Events that also go out by email when SMTP is configured.
pub const EMAIL_WORTHY: &[&str] = &[
    event_types::QUOTE_SIGNED,
    event_types::INVOICE_PAID,
    event_types::STOCK_ALERT,
];

/// In-app notification row read by the UI.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Email sent to the tenant's owners and admins.
pub const CHANNEL_EMAIL: &str = "email";

/// Maximum delivery attempts before an outbox row is dead-lettered.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 5;

/// Maximum backoff between delivery attempts, in seconds.
pub const MAX_BACKOFF_SECS: i64 = 3600;

/// Retry delay after `attempts` failed deliveries: 2^attempts seconds, capped.
pub fn retry_delay_secs(attempts: i32) -> i64 {
    2i64.saturating_pow(attempts.clamp(0, 30) as u32)
        .min(MAX_BACKOFF_SECS)
}

/// `{type, tenant_id, entity_id, data}` envelope handed to delivery channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub tenant_id: DbId,
    pub entity_id: Option<DbId>,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl NotificationEvent {
    pub fn new(event_type: impl Into<String>, tenant_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            tenant_id,
            entity_id: None,
            data: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_entity(mut self, entity_id: DbId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn is_email_worthy(&self) -> bool {
        EMAIL_WORTHY.contains(&self.event_type.as_str())
    }
}
