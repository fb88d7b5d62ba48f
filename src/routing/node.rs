//! # Router tree node.
//!
//! A [`Node`] is one router of the static tree below the dispatcher: a name,
//! the address it resolves from the registry, the [`DigitSpan`] its level
//! owns, its children and an optional [`Component`].
//!
//! ## `handle_at`
//! ```text
//! handle_at(env):
//!   ├─ some child owns env.target (prefix match on the child's span)
//!   │      └─► child.handle_at(env)                      (unchanged)
//!   ├─ env.target == own address
//!   │      └─► handle_local(env)
//!   └─ otherwise
//!          └─► bounce: payload += " UNRESOLVED <target>",
//!                      target := origin, origin := own address,
//!                      error_count += 1, re-enqueue
//!
//! handle_local(env):
//!   ├─ SHUTDOWN           ─► begin draining, cascade to children,
//!   │                        confirm once quiesced (re-confirm if stopped)
//!   ├─ SHUTDOWN_COMPLETE  ─► re-check whether draining is finished
//!   ├─ QUIESCED           ─► re-check whether draining is finished
//!   ├─ UPDATE_IDS         ─► re-resolve this subtree
//!   ├─ router not active  ─► drop
//!   └─ anything else      ─► component.handle(); unknown verbs are ignored
//!                            (or bounced with `strict_verbs`)
//! ```

use std::fmt;

use tracing::{debug, info};

use crate::address::{Address, DigitSpan};
use crate::bus::Bus;
use crate::envelope::{verbs, Command, Envelope};
use crate::error::BusError;
use crate::registry::Snapshot;
use crate::telemetry::{Event, EventKind};

use super::component::{Component, Drain, Handled};
use super::ctx::RouteCtx;
use super::lifecycle::{Lifecycle, LifecycleFlag};

/// What happened to an envelope in one dispatch step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Handled locally by the router at `to`.
    Delivered { to: Address },
    /// Sent back to its origin by the router at `by`.
    Bounced { by: Address },
    /// Discarded by the router at `at` (inactive router, bounce ceiling).
    Dropped { at: Address },
}

/// One router of the tree.
pub struct Node {
    name: String,
    width: u32,
    span: DigitSpan,
    address: Address,
    lifecycle: LifecycleFlag,
    children: Vec<Node>,
    component: Option<Box<dyn Component>>,
    resolved_in: Option<u64>,
    request: Option<Envelope>,
    unconfirmed: Option<Envelope>,
    component_pending: bool,
}

impl Node {
    /// Creates a router named `name` whose level adds `width` digits.
    ///
    /// The address stays unassigned until [`Node::resolve`] runs.
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
            span: DigitSpan::ROOT.child(width),
            address: Address::UNASSIGNED,
            lifecycle: LifecycleFlag::new(),
            children: Vec::new(),
            component: None,
            resolved_in: None,
            request: None,
            unconfirmed: None,
            component_pending: false,
        }
    }

    #[must_use]
    pub fn with_component(mut self, component: impl Component) -> Self {
        self.component = Some(Box::new(component));
        self
    }

    #[must_use]
    pub fn with_child(mut self, mut child: Node) -> Self {
        child.attach(self.span);
        self.children.push(child);
        self
    }

    /// Shares `flag` with worker loops created before the node.
    #[must_use]
    pub fn with_lifecycle(mut self, flag: LifecycleFlag) -> Self {
        self.lifecycle = flag;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn span(&self) -> DigitSpan {
        self.span
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub fn lifecycle_flag(&self) -> LifecycleFlag {
        self.lifecycle.clone()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Places this subtree below a parent owning `parent`.
    pub(crate) fn attach(&mut self, parent: DigitSpan) {
        self.span = parent.child(self.width);
        let span = self.span;
        for child in &mut self.children {
            child.attach(span);
        }
    }

    /// True iff `target` lies in this node's subtree.
    #[inline]
    pub fn owns(&self, target: Address) -> bool {
        target.within(self.address, self.span)
    }

    /// Resolves addresses of this subtree for the snapshot's generation.
    ///
    /// Each node looks itself up at most once per generation.
    pub fn resolve(&mut self, snap: &Snapshot) {
        let generation = snap.generation();
        if self.resolved_in != Some(generation) {
            let address = snap
                .current()
                .address_of(&self.name)
                .unwrap_or(Address::UNASSIGNED);
            if address != self.address {
                debug!(router = %self.name, from = %self.address, to = %address, generation, "address resolved");
            }
            self.address = address;
            self.resolved_in = Some(generation);
            if let Some(c) = self.component.as_mut() {
                c.on_addresses_updated(address, snap);
            }
        }
        for child in &mut self.children {
            child.resolve(snap);
        }
    }

    /// Routes `env` one level down, handles it here, or bounces it.
    pub fn handle_at(&mut self, env: Envelope, ctx: &RouteCtx<'_>) -> Outcome {
        if let Some(child) = self.children.iter_mut().find(|c| c.owns(env.target)) {
            return child.handle_at(env, ctx);
        }
        if env.target == self.address {
            return self.handle_local(env, ctx);
        }
        if ctx.bounce(env, self.address, &self.name) {
            Outcome::Bounced { by: self.address }
        } else {
            Outcome::Dropped { at: self.address }
        }
    }

    /// Handles an envelope addressed to this router.
    pub(crate) fn handle_local(&mut self, env: Envelope, ctx: &RouteCtx<'_>) -> Outcome {
        let here = Outcome::Delivered { to: self.address };

        match env.command() {
            Command::Shutdown => {
                self.publish_delivered(&env, ctx);
                self.begin_shutdown(env, ctx);
                return here;
            }
            Command::ShutdownComplete | Command::Quiesced => {
                self.publish_delivered(&env, ctx);
                self.try_finish(ctx);
                return here;
            }
            Command::UpdateIds => {
                self.publish_delivered(&env, ctx);
                self.resolve(&ctx.registry().snapshot());
                return here;
            }
            _ => {}
        }

        let state = self.lifecycle.get();
        if state != Lifecycle::Active {
            debug!(router = %self.name, state = state.as_label(), envelope = %env, "router not active; dropped");
            ctx.telemetry().publish(
                Event::new(EventKind::Dropped)
                    .with_name(self.name.as_str())
                    .with_envelope(&env)
                    .with_reason(state.as_label()),
            );
            return Outcome::Dropped { at: self.address };
        }

        self.publish_delivered(&env, ctx);
        let handled = match self.component.as_mut() {
            Some(c) => c.handle(&env, env.command(), ctx),
            None => Handled::Unknown,
        };
        match handled {
            Handled::Done => here,
            Handled::Unknown if ctx.strict_verbs() => {
                if ctx.bounce_because(env, self.address, &self.name, "unknown verb") {
                    Outcome::Bounced { by: self.address }
                } else {
                    Outcome::Dropped { at: self.address }
                }
            }
            Handled::Unknown => {
                debug!(router = %self.name, payload = %env.payload, "unknown verb ignored");
                here
            }
        }
    }

    fn begin_shutdown(&mut self, request: Envelope, ctx: &RouteCtx<'_>) {
        match self.lifecycle.get() {
            Lifecycle::Stopped => self.confirm(request, ctx),
            Lifecycle::Draining => self.request = Some(request),
            Lifecycle::Active => {
                self.lifecycle.advance(Lifecycle::Draining);
                self.request = Some(request);
                info!(router = %self.name, "draining");

                let from = self.address;
                for child in &mut self.children {
                    let env = Envelope::new(child.address, from, verbs::SHUTDOWN);
                    child.handle_local(env, ctx);
                }
                if let Some(c) = self.component.as_mut() {
                    self.component_pending = c.on_shutdown(ctx) == Drain::Pending;
                }
                self.try_finish(ctx);
            }
        }
    }

    fn try_finish(&mut self, ctx: &RouteCtx<'_>) {
        if self.lifecycle.get() != Lifecycle::Draining {
            return;
        }
        if !self.children.iter().all(|c| c.lifecycle.is_stopped()) {
            return;
        }
        if self.component_pending {
            if self.component.as_ref().is_some_and(|c| !c.is_drained()) {
                return;
            }
            self.component_pending = false;
        }

        self.lifecycle.advance(Lifecycle::Stopped);
        info!(router = %self.name, "stopped");
        if let Some(request) = self.request.take() {
            self.confirm(request, ctx);
        }
    }

    /// Answers `request` with `SHUTDOWN_COMPLETE`.
    ///
    /// A confirmation the full bus refused is kept for
    /// [`Node::retry_confirmations`].
    fn confirm(&mut self, request: Envelope, ctx: &RouteCtx<'_>) {
        if let Err(e) = self.send_confirmation(request, ctx) {
            if matches!(e, BusError::Full { .. }) {
                debug!(router = %self.name, "confirmation kept for retry");
                self.unconfirmed = Some(e.into_envelope());
            }
        }
    }

    fn send_confirmation(&self, request: Envelope, ctx: &RouteCtx<'_>) -> Result<(), BusError> {
        if !self.address.is_assigned() {
            debug!(router = %self.name, "no address to confirm from");
            return Ok(());
        }
        if !request.origin.is_assigned() {
            debug!(router = %self.name, "requester has no address; not confirmed");
            return Ok(());
        }
        ctx.send(request.answer(self.address, verbs::SHUTDOWN_COMPLETE))
    }

    /// Re-sends confirmations of this subtree that met a full bus.
    ///
    /// Those the bus still refuses are kept. Returns how many went out.
    pub(crate) fn retry_confirmations(&mut self, bus: &Bus) -> usize {
        let mut sent = 0;
        for child in &mut self.children {
            sent += child.retry_confirmations(bus);
        }
        if let Some(ack) = self.unconfirmed.take() {
            match bus.enqueue(ack) {
                Ok(()) => {
                    debug!(router = %self.name, "confirmation re-sent");
                    sent += 1;
                }
                Err(BusError::Full { envelope, .. }) => self.unconfirmed = Some(envelope),
                Err(e) => debug!(router = %self.name, error = %e, "confirmation lost"),
            }
        }
        sent
    }

    /// True while a confirmation of this subtree waits for bus space.
    pub fn has_unconfirmed(&self) -> bool {
        self.unconfirmed.is_some() || self.children.iter().any(Node::has_unconfirmed)
    }

    fn publish_delivered(&self, env: &Envelope, ctx: &RouteCtx<'_>) {
        ctx.telemetry().publish(
            Event::new(EventKind::Delivered)
                .with_name(self.name.as_str())
                .with_envelope(env),
        );
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("span", &self.span)
            .field("lifecycle", &self.lifecycle.get())
            .field("component", &self.component.is_some())
            .field("children", &self.children)
            .finish()
    }
}
