//! # Non-blocking event fan-out to multiple subscribers.
//!
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately.
//! - **Overflow**: the event is dropped for that subscriber only, counted in
//!   [`SubscriberSet::lost`], and `SubscriberOverflow` is published carrying
//!   the envelope addresses of the lost event.
//! - **Isolation**: a panicking subscriber is reported with the envelope it
//!   was looking at and keeps running; the others are unaffected.
//! - **Per-subscriber FIFO**, no ordering across subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::channel::Telemetry;
use super::event::Event;
use super::subscribe::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
    lost: AtomicU64,
}

impl SubscriberChannel {
    /// Queues `event`; on failure returns why it was lost.
    fn offer(&self, event: &Arc<Event>) -> Result<(), &'static str> {
        match self.sender.try_send(Arc::clone(event)) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.lost.fetch_add(1, Ordering::Relaxed);
                Err(match e {
                    mpsc::error::TrySendError::Full(_) => "full",
                    mpsc::error::TrySendError::Closed(_) => "closed",
                })
            }
        }
    }
}

/// Fan-out coordinator for telemetry subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    telemetry: Telemetry,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, telemetry: Telemetry) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(deliver(sub, rx, telemetry.clone())));
            channels.push(SubscriberChannel {
                name,
                sender: tx,
                lost: AtomicU64::new(0),
            });
        }
        Self {
            channels,
            workers,
            telemetry,
        }
    }

    /// Emits a clone of `event` to every subscriber.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a shared event to every subscriber.
    ///
    /// Overflow events are not re-published when they themselves overflow.
    pub fn emit_arc(&self, event: Arc<Event>) {
        for channel in &self.channels {
            if let Err(reason) = channel.offer(&event) {
                if !event.is_subscriber_overflow() {
                    self.telemetry
                        .publish(Event::subscriber_overflow(channel.name, reason, &event));
                }
            }
        }
    }

    /// Events dropped so far for the subscriber called `name`.
    pub fn lost(&self, name: &str) -> u64 {
        self.channels
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.lost.load(Ordering::Relaxed))
            .sum()
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn deliver(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, tel: Telemetry) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            tel.publish(Event::subscriber_panicked(
                sub.name(),
                panic_message(&*panic_err),
                &ev,
            ));
        }
    }
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
