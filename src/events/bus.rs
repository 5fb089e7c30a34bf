//! # Broadcast bus for lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Publishing
//! never blocks; each subscriber gets an independent receiver that only
//! observes events sent after it subscribed. When a receiver lags past the
//! ring-buffer capacity it observes `RecvError::Lagged(n)` and skips the
//! `n` oldest items.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for supervisor lifecycle events.
///
/// Cheap to clone (the sender is `Arc`-backed internally). Fire-and-forget:
/// events published while no receiver is subscribed are dropped.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (clamped to ≥ 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers; returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ServiceStarting).with_service("web"));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::ServiceStarting);
        assert_eq!(ev.service.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::StopRequested));
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::RestartRequested));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::RestartRequested);
    }
}
