use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: atelier_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Wakes the outbox dispatcher after a commit.
    pub event_bus: Arc<atelier_events::EventBus>,
    /// SMTP settings, used when an admin forces an outbox drain.
    pub email: Option<atelier_events::EmailConfig>,
}

impl AppState {
    /// Announce the events of a committed operation.
    pub fn publish(&self, events: Vec<atelier_core::notification::NotificationEvent>) {
        self.event_bus.publish_all(events);
    }
}
