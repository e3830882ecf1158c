//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`NotificationEvent`]s. It is
//! shared via `Arc<EventBus>` across the application. Events are published
//! after their transaction commits; the durable copy lives in the outbox.

use atelier_core::notification::NotificationEvent;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use atelier_core::notification::NotificationEvent;
/// use atelier_events::bus::EventBus;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(NotificationEvent::new("quote.signed", Default::default()));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: NotificationEvent) {
        // Ignore the SendError, it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Publish every event of a committed operation.
    pub fn publish_all(&self, events: impl IntoIterator<Item = NotificationEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::types::DbId;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let tenant = DbId::from_u128(1);
        let event = NotificationEvent::new("quote.signed", tenant)
            .with_entity(DbId::from_u128(42))
            .with_data(serde_json::json!({"numero": "DEV-2026-0001"}));

        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, "quote.signed");
        assert_eq!(received.tenant_id, tenant);
        assert_eq!(received.entity_id, Some(DbId::from_u128(42)));
        assert_eq!(received.data["numero"], "DEV-2026-0001");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(NotificationEvent::new("stock.alert", DbId::nil()));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, "stock.alert");
        assert_eq!(e2.event_type, "stock.alert");
    }

    #[tokio::test]
    async fn publish_all_preserves_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish_all([
            NotificationEvent::new("project.status_changed", DbId::nil()),
            NotificationEvent::new("invoice.auto_created", DbId::nil()),
        ]);

        assert_eq!(rx.recv().await.unwrap().event_type, "project.status_changed");
        assert_eq!(rx.recv().await.unwrap().event_type, "invoice.auto_created");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(NotificationEvent::new("orphan.event", DbId::nil()));
    }
}
