//! # Telemetry broadcast channel.
//!
//! [`Telemetry`] is a thin wrapper around [`tokio::sync::broadcast`] that
//! provides non-blocking event publishing from routers, the dispatcher and
//! worker loops.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: one ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone; every clone publishes into the same ring buffer.
#[derive(Clone, Debug)]
pub struct Telemetry {
    tx: broadcast::Sender<Event>,
}

impl Telemetry {
    /// Creates a channel with the given capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let tel = Telemetry::new(4);
        tel.publish(Event::new(EventKind::Delivered));

        let mut rx = tel.subscribe();
        tel.publish(Event::new(EventKind::Bounced));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Bounced);
    }
}
