//! # Runtime events.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Routing**: what happened to one envelope (delivered, bounced, dropped)
//! - **Shutdown handshake**: request, broadcast, per-child confirmation, exit
//! - **Workers**: leaf loop lifecycle and the final grace wait
//! - **Subscribers**: overflow and panics of telemetry subscribers
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the order when events are observed out
//! of order.
//!
//! ## Example
//! ```rust
//! use actionbus::{Address, Envelope, Event, EventKind};
//!
//! let env = Envelope::new(Address::new(999), Address::new(1), "PRINT hi");
//! let ev = Event::new(EventKind::Bounced)
//!     .with_envelope(&env)
//!     .with_name("Dispatcher");
//!
//! assert_eq!(ev.kind, EventKind::Bounced);
//! assert_eq!(ev.target, Some(Address::new(999)));
//! assert_eq!(ev.name.as_deref(), Some("Dispatcher"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::address::Address;
use crate::envelope::Envelope;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Routing ===
    /// Envelope handed to the local handler of its target.
    ///
    /// Sets: `name` (router), envelope fields.
    Delivered,

    /// Envelope rewritten and sent back to its origin.
    ///
    /// Sets: `name` (bouncing router), envelope fields (before the rewrite),
    /// `reason`.
    Bounced,

    /// Envelope reached the bounce ceiling and was dropped.
    ///
    /// Sets: `name`, envelope fields.
    BounceLimitReached,

    /// Envelope discarded on purpose (stopped router, confirmation from an
    /// unknown origin).
    ///
    /// Sets: `name`, envelope fields, `reason`.
    Dropped,

    /// Enqueue failed because the bus was full or closed.
    ///
    /// Sets: `name` (sender), envelope fields, `reason`.
    BusOverflow,

    // === Shutdown handshake ===
    /// Shutdown requested (`SHUTDOWN` reached the dispatcher or an OS signal
    /// was observed).
    ShutdownRequested,

    /// Dispatcher sent `SHUTDOWN` to every top-level child.
    ///
    /// Sets: `count` (number of children).
    ShutdownBroadcast,

    /// A top-level child confirmed shutdown.
    ///
    /// Sets: `name` (child), `origin`.
    ChildStopped,

    /// Router addresses re-resolved from the registry.
    ///
    /// Sets: `generation`.
    AddressesUpdated,

    /// Component table reloaded.
    ///
    /// Sets: `generation`, `count` (records), `reason` on failure.
    TableReloaded,

    /// Dispatcher loop exited.
    ///
    /// Sets: `count` (envelopes dispatched).
    DispatcherTerminated,

    // === Workers ===
    /// Worker loop is (re)entering.
    ///
    /// Sets: `name`, `count` (pass number, 1-based).
    WorkerStarting,

    /// Worker loop returned normally or observed cancellation.
    ///
    /// Sets: `name`, `count`.
    WorkerStopped,

    /// Worker loop returned an error.
    ///
    /// Sets: `name`, `count`, `reason`.
    WorkerFailed,

    /// Every worker stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop.
    ///
    /// Sets: `reason` (stuck workers).
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `name` (subscriber), `reason`.
    SubscriberOverflow,

    /// Subscriber panicked while processing an event.
    ///
    /// Sets: `name` (subscriber), `reason` (panic message).
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Router, worker or subscriber name.
    pub name: Option<Arc<str>>,
    /// Target of the envelope concerned.
    pub target: Option<Address>,
    /// Origin of the envelope concerned.
    pub origin: Option<Address>,
    /// Payload of the envelope concerned.
    pub payload: Option<Arc<str>>,
    /// Bounce counter of the envelope concerned.
    pub error_count: Option<u32>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Registry generation.
    pub generation: Option<u64>,
    /// Kind-specific counter (children, records, passes).
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            name: None,
            target: None,
            origin: None,
            payload: None,
            error_count: None,
            reason: None,
            generation: None,
            count: None,
        }
    }

    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Copies target, origin, payload and bounce counter of `env`.
    #[inline]
    pub fn with_envelope(mut self, env: &Envelope) -> Self {
        self.target = Some(env.target);
        self.origin = Some(env.origin);
        self.payload = Some(env.payload.as_str().into());
        self.error_count = Some(env.error_count);
        self
    }

    #[inline]
    pub fn with_origin(mut self, origin: Address) -> Self {
        self.origin = Some(origin);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    #[inline]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Creates a subscriber overflow event for the event `lost` that did not
    /// fit into the subscriber's queue.
    #[inline]
    pub fn subscriber_overflow(
        subscriber: &'static str,
        reason: &'static str,
        lost: &Event,
    ) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!(
                "subscriber={subscriber} reason={reason} lost={:?}",
                lost.kind
            ))
            .about(lost)
    }

    /// Creates a subscriber panic event; `handling` is the event the
    /// subscriber was processing.
    #[inline]
    pub fn subscriber_panicked(
        subscriber: &'static str,
        info: String,
        handling: &Event,
    ) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
            .about(handling)
    }

    /// Points this event at another one: copies its envelope addresses and
    /// bounce counter and keeps its `seq` in `count`.
    fn about(mut self, other: &Event) -> Self {
        self.target = other.target;
        self.origin = other.origin;
        self.error_count = other.error_count;
        self.count = Some(other.seq);
        self
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::Delivered);
        let b = Event::new(EventKind::Delivered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_with_envelope_copies_fields() {
        let mut env = Envelope::new(Address::new(3), Address::new(110), "PLAY_SOUND auto hi");
        env.error_count = 2;
        let ev = Event::new(EventKind::Dropped).with_envelope(&env).with_reason("stopped");

        assert_eq!(ev.origin, Some(Address::new(110)));
        assert_eq!(ev.payload.as_deref(), Some("PLAY_SOUND auto hi"));
        assert_eq!(ev.error_count, Some(2));
        assert_eq!(ev.reason.as_deref(), Some("stopped"));
    }

    #[test]
    fn test_subscriber_helpers() {
        let env = Envelope::new(Address::new(999), Address::new(110), "PRINT hi");
        let lost = Event::new(EventKind::Bounced).with_envelope(&env);
        let ev = Event::subscriber_overflow("log", "full", &lost);

        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.name.as_deref(), Some("log"));
        assert_eq!(ev.target, Some(Address::new(999)));
        assert_eq!(ev.origin, Some(Address::new(110)));
        assert_eq!(ev.count, Some(lost.seq));
        assert_eq!(ev.payload, None);
        assert_eq!(
            ev.reason.as_deref(),
            Some("subscriber=log reason=full lost=Bounced")
        );
    }
}
