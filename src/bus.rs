//! # Envelope bus.
//!
//! [`Bus`] is the producer side of a single bounded FIFO of [`Envelope`]s
//! shared by every component; [`BusReceiver`] is its only consumer, owned by
//! the dispatcher. Both wrap a [`tokio::sync::mpsc`] channel.
//!
//! ## Architecture
//! ```text
//! Producers (many):                        Consumer (one):
//!   TerminalManager worker ──┐
//!   SoundManager worker ─────┼──► Bus ────► BusReceiver ────► Dispatcher
//!   Routers (bounce/reply) ──┤  (mpsc, bounded)
//!   Dispatcher (broadcast) ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking enqueue**: [`Bus::enqueue`] uses `try_send`; it never waits
//!   for a free slot.
//! - **Overflow is surfaced**: a full queue returns [`BusError::Full`] carrying
//!   the envelope. Nothing is retried.
//! - **FIFO**: envelopes leave in arrival order. Envelopes of one producer keep
//!   their relative order; there is no ordering across producers.
//! - **No persistence**: pending envelopes are lost when the process exits.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::envelope::Envelope;
use crate::error::BusError;

/// Producer handle of the envelope queue.
///
/// Cheap to clone; every clone feeds the same queue.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: mpsc::Sender<Envelope>,
}

impl Bus {
    /// Creates a queue with `capacity` slots (clamped to at least 1).
    pub fn new(capacity: usize) -> (Bus, BusReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Bus { tx }, BusReceiver { rx })
    }

    /// Appends `env` to the tail of the queue.
    ///
    /// Fails with [`BusError::Full`] when every slot is taken and with
    /// [`BusError::Closed`] once the receiver is gone. Both hand the envelope
    /// back.
    pub fn enqueue(&self, env: Envelope) -> Result<(), BusError> {
        self.tx.try_send(env).map_err(|e| match e {
            TrySendError::Full(envelope) => BusError::Full {
                capacity: self.capacity(),
                envelope,
            },
            TrySendError::Closed(envelope) => BusError::Closed { envelope },
        })
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of envelopes waiting in the queue.
    #[inline]
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// True once the receiver has been dropped.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the envelope queue.
#[derive(Debug)]
pub struct BusReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl BusReceiver {
    /// Pops the head of the queue without waiting.
    pub fn dequeue(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `wait` for the next envelope.
    ///
    /// Returns `None` if nothing arrived in time or every producer is gone.
    pub async fn next(&mut self, wait: Duration) -> Option<Envelope> {
        tokio::time::timeout(wait, self.rx.recv()).await.ok().flatten()
    }

    /// True if no envelope is pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Number of pending envelopes.
    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn env(target: i64, payload: &str) -> Envelope {
        Envelope::new(Address::new(target), Address::new(0), payload)
    }

    #[test]
    fn test_fifo_order() {
        let (bus, mut rx) = Bus::new(8);
        bus.enqueue(env(1, "a")).unwrap();
        bus.enqueue(env(2, "b")).unwrap();
        bus.enqueue(env(3, "c")).unwrap();
        assert_eq!(rx.len(), 3);
        assert_eq!(bus.pending(), 3);

        let order: Vec<String> = std::iter::from_fn(|| rx.dequeue())
            .map(|e| e.payload)
            .collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert!(rx.is_empty());
        assert!(rx.dequeue().is_none());
    }

    #[test]
    fn test_full_hands_envelope_back() {
        let (bus, mut rx) = Bus::new(1);
        bus.enqueue(env(1, "first")).unwrap();

        let err = bus.enqueue(env(2, "second")).unwrap_err();
        match err {
            BusError::Full { capacity, envelope } => {
                assert_eq!(capacity, 1);
                assert_eq!(envelope.payload, "second");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(rx.dequeue().map(|e| e.payload).as_deref(), Some("first"));
        bus.enqueue(env(2, "third")).unwrap();
    }

    #[test]
    fn test_closed_after_receiver_dropped() {
        let (bus, rx) = Bus::new(4);
        drop(rx);
        assert!(bus.is_closed());
        assert!(matches!(bus.enqueue(env(1, "x")), Err(BusError::Closed { .. })));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (bus, _rx) = Bus::new(0);
        assert_eq!(bus.capacity(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_waits_at_most_the_given_time() {
        let (bus, mut rx) = Bus::new(4);
        assert!(rx.next(Duration::from_millis(10)).await.is_none());

        bus.enqueue(env(7, "late")).unwrap();
        let got = rx.next(Duration::from_millis(10)).await;
        assert_eq!(got.map(|e| e.target), Some(Address::new(7)));
    }
}
