//! Routing context handed to routers and components for one dispatch step.

use tracing::warn;

use crate::address::Address;
use crate::bus::Bus;
use crate::config::Config;
use crate::envelope::Envelope;
use crate::error::BusError;
use crate::registry::Registry;
use crate::telemetry::{Event, EventKind, Telemetry};

/// Everything a router may touch while handling an envelope.
///
/// Borrowed from the dispatcher for the duration of one step.
#[derive(Clone, Copy, Debug)]
pub struct RouteCtx<'a> {
    bus: &'a Bus,
    registry: &'a Registry,
    telemetry: &'a Telemetry,
    dispatcher: Address,
    bounce_limit: Option<u32>,
    strict_verbs: bool,
}

impl<'a> RouteCtx<'a> {
    pub fn new(
        bus: &'a Bus,
        registry: &'a Registry,
        telemetry: &'a Telemetry,
        dispatcher: Address,
        cfg: &Config,
    ) -> Self {
        Self {
            bus,
            registry,
            telemetry,
            dispatcher,
            bounce_limit: cfg.bounce_limit(),
            strict_verbs: cfg.strict_verbs,
        }
    }

    pub fn bus(&self) -> &'a Bus {
        self.bus
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn telemetry(&self) -> &'a Telemetry {
        self.telemetry
    }

    /// Address of the root router.
    pub fn dispatcher(&self) -> Address {
        self.dispatcher
    }

    pub fn strict_verbs(&self) -> bool {
        self.strict_verbs
    }

    /// Enqueues `env`. Overflow is logged and published, then returned.
    pub fn send(&self, env: Envelope) -> Result<(), BusError> {
        self.bus.enqueue(env).map_err(|e| {
            warn!(error = %e, "envelope not enqueued");
            self.telemetry.publish(
                Event::new(EventKind::BusOverflow)
                    .with_envelope(e.envelope())
                    .with_reason(e.as_label()),
            );
            e
        })
    }

    /// Sends a fresh envelope with `payload` back to the origin of `to`.
    pub fn reply(
        &self,
        to: &Envelope,
        from: Address,
        payload: impl Into<String>,
    ) -> Result<(), BusError> {
        self.send(to.reply(from, payload))
    }

    /// Returns `env` to its origin with the error marker appended.
    ///
    /// An envelope that already reached the bounce ceiling is dropped
    /// instead. Returns `true` if the bounce was enqueued.
    pub fn bounce(&self, env: Envelope, from: Address, by: &str) -> bool {
        self.bounce_because(env, from, by, "unresolved target")
    }

    pub(crate) fn bounce_because(
        &self,
        env: Envelope,
        from: Address,
        by: &str,
        reason: &'static str,
    ) -> bool {
        if self.bounce_limit.is_some_and(|limit| env.error_count >= limit) {
            warn!(
                router = by,
                target = %env.target,
                origin = %env.origin,
                errors = env.error_count,
                "bounce limit reached; envelope dropped"
            );
            self.telemetry.publish(
                Event::new(EventKind::BounceLimitReached)
                    .with_name(by)
                    .with_envelope(&env),
            );
            return false;
        }

        self.telemetry.publish(
            Event::new(EventKind::Bounced)
                .with_name(by)
                .with_envelope(&env)
                .with_reason(reason),
        );
        self.send(env.bounce(from)).is_ok()
    }
}
