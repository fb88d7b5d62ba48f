use std::sync::Arc;

use tracing::warn;

use crate::address::Address;
use crate::bus::Bus;
use crate::dispatch::DEFAULT_DISPATCHER_ADDRESS;
use crate::envelope::Envelope;
use crate::registry::Registry;

/// Sending side of a worker loop.
///
/// Workers address routers by name; names are resolved against the current
/// table at send time, so a `RELOAD` that moves a router is picked up by the
/// next message.
#[derive(Clone, Debug)]
pub struct Outbox {
    bus: Bus,
    registry: Arc<Registry>,
    own: Arc<str>,
    dispatcher: Arc<str>,
}

impl Outbox {
    pub fn new(
        bus: Bus,
        registry: Arc<Registry>,
        own: impl Into<Arc<str>>,
        dispatcher: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            bus,
            registry,
            own: own.into(),
            dispatcher: dispatcher.into(),
        }
    }

    pub fn own_name(&self) -> &str {
        &self.own
    }

    pub fn own_address(&self) -> Address {
        self.registry.address_of(&self.own)
    }

    /// Sends `payload` to the router registered as `name`.
    pub fn send_to(&self, name: &str, payload: impl Into<String>) -> bool {
        self.send_to_address(self.registry.address_of(name), payload)
    }

    /// Sends `payload` to the dispatcher.
    pub fn send_to_dispatcher(&self, payload: impl Into<String>) -> bool {
        let mut to = self.registry.address_of(&self.dispatcher);
        if !to.is_assigned() {
            to = DEFAULT_DISPATCHER_ADDRESS;
        }
        self.send_to_address(to, payload)
    }

    /// Sends `payload` to the owning router itself.
    pub fn send_self(&self, payload: impl Into<String>) -> bool {
        self.send_to_address(self.own_address(), payload)
    }

    /// Enqueues an envelope from the owning router to `target`.
    ///
    /// Returns `false` if either end has no address or the bus refused it.
    pub fn send_to_address(&self, target: Address, payload: impl Into<String>) -> bool {
        let env = Envelope::new(target, self.own_address(), payload);
        if !env.is_addressed() {
            warn!(from = %self.own, envelope = %env, "unaddressed envelope not sent");
            return false;
        }
        match self.bus.enqueue(env) {
            Ok(()) => true,
            Err(e) => {
                warn!(from = %self.own, error = %e, "envelope not enqueued");
                false
            }
        }
    }
}
