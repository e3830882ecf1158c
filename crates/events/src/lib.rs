//! Atelier event bus and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Publishing wakes the dispatcher.
//! - [`OutboxDispatcher`]: background service draining the durable
//!   `notification_outbox` into in-app notifications and emails.
//! - [`delivery`]: external delivery channels (email).

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::EventBus;
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use dispatcher::{DrainReport, OutboxDispatcher};
