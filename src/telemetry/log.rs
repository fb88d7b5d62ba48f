//! # LogWriter: events rendered through `tracing`.
//!
//! Routing traffic is logged at `debug`, lifecycle at `info`, anything that
//! loses an envelope or a worker at `warn`.
//!
//! ## Example output
//! ```text
//! DEBUG delivered router="TerminalManager" origin=0 target=110 payload="PRINT hi"
//!  WARN bounced router="Dispatcher" origin=1 target=999 errors=0
//!  INFO child stopped child="Glados" origin=1
//!  INFO dispatcher terminated dispatched=42
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::event::{Event, EventKind};
use super::subscribe::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let name = e.name.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let payload = e.payload.as_deref().unwrap_or("");
        let target = e.target.map(|a| a.get()).unwrap_or(-1);
        let origin = e.origin.map(|a| a.get()).unwrap_or(-1);

        match e.kind {
            EventKind::Delivered => {
                debug!(router = name, origin, target, payload, "delivered");
            }
            EventKind::Bounced => {
                warn!(router = name, origin, target, errors = e.error_count, payload, "bounced");
            }
            EventKind::BounceLimitReached => {
                warn!(router = name, origin, target, errors = e.error_count, payload, "bounce limit reached; dropped");
            }
            EventKind::Dropped => {
                debug!(router = name, origin, target, payload, reason, "dropped");
            }
            EventKind::BusOverflow => {
                warn!(sender = name, target, payload, reason, "bus overflow");
            }
            EventKind::ShutdownRequested => {
                info!(origin, "shutdown requested");
            }
            EventKind::ShutdownBroadcast => {
                info!(children = e.count, "shutdown broadcast");
            }
            EventKind::ChildStopped => {
                info!(child = name, origin, "child stopped");
            }
            EventKind::AddressesUpdated => {
                debug!(generation = e.generation, "addresses updated");
            }
            EventKind::TableReloaded => {
                info!(generation = e.generation, records = e.count, reason, "component table reloaded");
            }
            EventKind::DispatcherTerminated => {
                info!(dispatched = e.count, "dispatcher terminated");
            }
            EventKind::WorkerStarting => {
                debug!(worker = name, pass = e.count, "worker starting");
            }
            EventKind::WorkerStopped => {
                debug!(worker = name, pass = e.count, "worker stopped");
            }
            EventKind::WorkerFailed => {
                warn!(worker = name, pass = e.count, reason, "worker failed");
            }
            EventKind::AllStoppedWithin => {
                info!("all workers stopped within grace");
            }
            EventKind::GraceExceeded => {
                warn!(stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = name, target, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = name, target, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
