//! The root router and its loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::address::{Address, DigitSpan};
use crate::bus::{Bus, BusReceiver};
use crate::config::Config;
use crate::envelope::{verbs, Command, Envelope};
use crate::registry::{Registry, TableSource};
use crate::routing::{Node, Outcome, RouteCtx};
use crate::telemetry::{Event, EventKind, Telemetry};

/// Address the dispatcher uses when the table does not list it.
pub const DEFAULT_DISPATCHER_ADDRESS: Address = Address::new(0);

/// Reply sent to the requester of a successful `RELOAD`.
pub const RELOAD_OK: &str = "PRINT component list read.";

/// Counters returned when the loop exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Envelopes taken off the bus.
    pub dispatched: u64,
    pub delivered: u64,
    pub bounced: u64,
    pub dropped: u64,
}

enum Route {
    Child(usize),
    Local,
    Bounce,
}

/// Root of the router tree and sole consumer of the bus.
pub struct Dispatcher {
    name: String,
    address: Address,
    resolved_in: Option<u64>,
    children: Vec<Node>,
    stopped: Vec<bool>,
    shutting_down: bool,
    bus: Bus,
    rx: BusReceiver,
    registry: Arc<Registry>,
    telemetry: Telemetry,
    table: TableSource,
    cfg: Config,
    report: DispatchReport,
}

impl Dispatcher {
    /// Creates the dispatcher over `children`, the top-level routers.
    ///
    /// Addresses are not resolved yet; call [`Dispatcher::resolve_addresses`]
    /// once the registry is populated.
    pub fn new(
        cfg: &Config,
        bus: Bus,
        rx: BusReceiver,
        registry: Arc<Registry>,
        telemetry: Telemetry,
        mut children: Vec<Node>,
    ) -> Self {
        for child in &mut children {
            child.attach(DigitSpan::ROOT);
        }
        let stopped = vec![false; children.len()];
        Self {
            name: cfg.dispatcher_name.clone(),
            address: DEFAULT_DISPATCHER_ADDRESS,
            resolved_in: None,
            children,
            stopped,
            shutting_down: false,
            bus,
            rx,
            registry,
            telemetry,
            table: TableSource::File(cfg.component_table.clone()),
            cfg: cfg.clone(),
            report: DispatchReport::default(),
        }
    }

    /// Replaces the table `RELOAD` reads (defaults to `Config::component_table`).
    #[must_use]
    pub fn with_table_source(mut self, table: TableSource) -> Self {
        self.table = table;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Per-child stopped flags, in child order.
    pub fn stopped(&self) -> &[bool] {
        &self.stopped
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Producer handle of the bus this dispatcher drains.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn report(&self) -> DispatchReport {
        self.report
    }

    /// Resolves the dispatcher and the whole tree against the current table.
    ///
    /// Returns the registry generation resolved against.
    pub fn resolve_addresses(&mut self) -> u64 {
        let snap = self.registry.snapshot();
        let generation = snap.generation();
        if self.resolved_in != Some(generation) {
            self.address = snap
                .current()
                .address_of(&self.name)
                .unwrap_or(DEFAULT_DISPATCHER_ADDRESS);
            self.resolved_in = Some(generation);
        }
        for child in &mut self.children {
            child.resolve(&snap);
        }
        self.telemetry
            .publish(Event::new(EventKind::AddressesUpdated).with_generation(generation));
        generation
    }

    /// True once shutdown was requested, every child confirmed and the bus
    /// is empty. The loop exits on this condition only.
    pub fn is_terminal(&self) -> bool {
        self.shutting_down && self.stopped.iter().all(|s| *s) && self.rx.is_empty()
    }

    /// Dispatches the head of the bus, if any.
    pub fn dispatch_next(&mut self) -> Option<Outcome> {
        let env = self.rx.dequeue()?;
        Some(self.dispatch(env))
    }

    /// Dispatches until the bus is empty or the terminal condition holds.
    ///
    /// Returns the number of envelopes dispatched.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while !self.is_terminal() {
            if self.dispatch_next().is_none() {
                break;
            }
            n += 1;
        }
        n
    }

    /// Runs until the shutdown handshake completes.
    ///
    /// Waits at most `Config::poll_interval` for each envelope so the
    /// terminal condition is re-checked while idle.
    pub async fn run(mut self) -> DispatchReport {
        info!(
            dispatcher = %self.name,
            address = %self.address,
            children = self.children.len(),
            "dispatcher running"
        );
        let wait = self.cfg.poll_interval;
        while !self.is_terminal() {
            match self.rx.next(wait).await {
                Some(env) => {
                    self.dispatch(env);
                }
                None => self.retry_confirmations(),
            }
        }

        info!(dispatched = self.report.dispatched, "dispatcher terminated");
        self.telemetry.publish(
            Event::new(EventKind::DispatcherTerminated).with_count(self.report.dispatched),
        );
        self.report
    }

    /// Routes one envelope through the tree.
    ///
    /// Stale addresses from the previous table generation are translated
    /// first. Negative targets bounce straight back from the dispatcher.
    pub fn dispatch(&mut self, mut env: Envelope) -> Outcome {
        self.report.dispatched += 1;

        let snap = self.registry.snapshot();
        if env.target.is_assigned() {
            env.target = snap.translate(env.target);
        }
        if env.origin.is_assigned() {
            env.origin = snap.translate(env.origin);
        }

        let route = if !env.target.is_assigned() {
            Route::Bounce
        } else if let Some(i) = self.children.iter().position(|c| c.owns(env.target)) {
            Route::Child(i)
        } else if env.target == self.address {
            Route::Local
        } else {
            Route::Bounce
        };

        let outcome = match route {
            Route::Child(i) => {
                let ctx = RouteCtx::new(
                    &self.bus,
                    &self.registry,
                    &self.telemetry,
                    self.address,
                    &self.cfg,
                );
                self.children[i].handle_at(env, &ctx)
            }
            Route::Bounce => {
                let ctx = RouteCtx::new(
                    &self.bus,
                    &self.registry,
                    &self.telemetry,
                    self.address,
                    &self.cfg,
                );
                if ctx.bounce(env, self.address, &self.name) {
                    Outcome::Bounced { by: self.address }
                } else {
                    Outcome::Dropped { at: self.address }
                }
            }
            Route::Local => self.handle_local(env),
        };

        match outcome {
            Outcome::Delivered { .. } => self.report.delivered += 1,
            Outcome::Bounced { .. } => self.report.bounced += 1,
            Outcome::Dropped { .. } => self.report.dropped += 1,
        }
        self.retry_confirmations();
        outcome
    }

    /// Gives confirmations refused by a full bus another try.
    fn retry_confirmations(&mut self) {
        if !self.shutting_down {
            return;
        }
        for child in &mut self.children {
            if child.has_unconfirmed() {
                child.retry_confirmations(&self.bus);
            }
        }
    }

    fn handle_local(&mut self, env: Envelope) -> Outcome {
        self.telemetry.publish(
            Event::new(EventKind::Delivered)
                .with_name(self.name.as_str())
                .with_envelope(&env),
        );
        let here = Outcome::Delivered { to: self.address };

        match env.command() {
            Command::Shutdown => {
                self.begin_shutdown(env.origin);
                here
            }
            Command::ShutdownComplete => self.child_confirmed(&env),
            Command::UpdateIds => {
                self.resolve_addresses();
                here
            }
            Command::Reload => {
                self.reload(&env);
                here
            }
            _ => {
                let ctx = RouteCtx::new(
                    &self.bus,
                    &self.registry,
                    &self.telemetry,
                    self.address,
                    &self.cfg,
                );
                if !ctx.strict_verbs() {
                    debug!(payload = %env.payload, "unknown verb for dispatcher ignored");
                    here
                } else if ctx.bounce_because(env, self.address, &self.name, "unknown verb") {
                    Outcome::Bounced { by: self.address }
                } else {
                    Outcome::Dropped { at: self.address }
                }
            }
        }
    }

    /// Sends `SHUTDOWN` to every top-level child, stopped or not.
    ///
    /// A child the bus has no room for is shut down in place.
    fn begin_shutdown(&mut self, requester: Address) {
        if !self.shutting_down {
            info!(requester = %requester, "shutdown requested");
            self.telemetry
                .publish(Event::new(EventKind::ShutdownRequested).with_origin(requester));
        }
        self.shutting_down = true;

        let ctx = RouteCtx::new(
            &self.bus,
            &self.registry,
            &self.telemetry,
            self.address,
            &self.cfg,
        );
        for (i, child) in self.children.iter_mut().enumerate() {
            let env = Envelope::new(child.address(), self.address, verbs::SHUTDOWN);
            if child.address().is_assigned() {
                if let Err(e) = ctx.send(env) {
                    warn!(child = child.name(), error = %e, "shutting child down in place");
                    child.handle_local(e.into_envelope(), &ctx);
                }
                continue;
            }

            warn!(child = child.name(), "child has no address; shutting it down in place");
            child.handle_local(env, &ctx);
            if !self.stopped[i] {
                self.stopped[i] = true;
                self.telemetry.publish(
                    Event::new(EventKind::ChildStopped).with_name(child.name()),
                );
            }
        }
        self.telemetry.publish(
            Event::new(EventKind::ShutdownBroadcast).with_count(self.children.len() as u64),
        );
    }

    fn child_confirmed(&mut self, env: &Envelope) -> Outcome {
        let Some(i) = self
            .children
            .iter()
            .position(|c| c.address() == env.origin)
        else {
            debug!(origin = %env.origin, "confirmation from unknown origin dropped");
            self.telemetry.publish(
                Event::new(EventKind::Dropped)
                    .with_name(self.name.as_str())
                    .with_envelope(env)
                    .with_reason("confirmation from unknown origin"),
            );
            return Outcome::Dropped { at: self.address };
        };

        if self.stopped[i] {
            debug!(child = self.children[i].name(), "repeated confirmation");
        } else {
            self.stopped[i] = true;
            info!(child = self.children[i].name(), origin = %env.origin, "child stopped");
            self.telemetry.publish(
                Event::new(EventKind::ChildStopped)
                    .with_name(self.children[i].name())
                    .with_origin(env.origin),
            );
        }
        Outcome::Delivered { to: self.address }
    }

    /// Re-reads the table, re-resolves the tree and tells the requester.
    ///
    /// A [`TableSource::File`] is read synchronously on the dispatching
    /// thread. Component tables are a few lines long; a table on slow
    /// storage delays every envelope queued behind the `RELOAD`.
    fn reload(&mut self, env: &Envelope) {
        let result = self.registry.load_source(&self.table);
        let generation = self.resolve_addresses();
        let snap = self.registry.snapshot();

        let mut ev = Event::new(EventKind::TableReloaded)
            .with_generation(generation)
            .with_count(snap.current().len() as u64);
        let answer = match &result {
            Ok(_) => RELOAD_OK.to_string(),
            Err(e) => {
                ev = ev.with_reason(e.as_message());
                format!("PRINT component list could not be read: {}", e.as_message())
            }
        };
        self.telemetry.publish(ev);

        let ctx = RouteCtx::new(
            &self.bus,
            &self.registry,
            &self.telemetry,
            self.address,
            &self.cfg,
        );
        let _ = ctx.send(Envelope::new(snap.translate(env.origin), self.address, answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Component, Drain, Handled, Lifecycle};
    use std::sync::atomic::{AtomicBool, Ordering};

    const TABLE: &str = "0 Dispatcher\n1 Glados\n2 Auto\n3 SoundManager\n";

    struct Slow(Arc<AtomicBool>);

    impl Component for Slow {
        fn handle(&mut self, _env: &Envelope, _cmd: Command<'_>, _ctx: &RouteCtx<'_>) -> Handled {
            Handled::Done
        }

        fn on_shutdown(&mut self, _ctx: &RouteCtx<'_>) -> Drain {
            Drain::Pending
        }

        fn is_drained(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn dispatcher(table: &str, children: Vec<Node>) -> Dispatcher {
        dispatcher_with_capacity(table, children, 64)
    }

    fn dispatcher_with_capacity(table: &str, children: Vec<Node>, capacity: usize) -> Dispatcher {
        let cfg = Config::default();
        let (bus, rx) = Bus::new(capacity);
        let registry = Arc::new(Registry::new());
        registry.load(table).unwrap();
        let mut d = Dispatcher::new(&cfg, bus, rx, registry, Telemetry::new(256), children);
        d.resolve_addresses();
        d
    }

    fn plain_children() -> Vec<Node> {
        vec![
            Node::new("Glados", 1),
            Node::new("Auto", 1),
            Node::new("SoundManager", 1),
        ]
    }

    fn shutdown() -> Envelope {
        Envelope::new(Address::new(0), Address::new(0), verbs::SHUTDOWN)
    }

    #[test]
    fn test_unknown_target_bounces_from_dispatcher() {
        let mut d = dispatcher(TABLE, plain_children());
        let out = d.dispatch(Envelope::new(Address::new(999), Address::new(1), "PRINT hi"));
        assert_eq!(out, Outcome::Bounced { by: Address::new(0) });

        let back = d.rx.dequeue().unwrap();
        assert_eq!(back.target, Address::new(1));
        assert_eq!(back.origin, Address::new(0));
        assert_eq!(back.error_count, 1);
        assert_eq!(back.payload, "PRINT hi UNRESOLVED 999");
    }

    #[test]
    fn test_negative_target_bounces() {
        let mut d = dispatcher(TABLE, plain_children());
        let out = d.dispatch(Envelope::new(Address::UNASSIGNED, Address::new(2), "PING"));
        assert_eq!(out, Outcome::Bounced { by: Address::new(0) });
        assert_eq!(d.rx.dequeue().unwrap().target, Address::new(2));
    }

    #[test]
    fn test_bounce_ceiling_drops() {
        let mut d = dispatcher(TABLE, plain_children());
        let mut env = Envelope::new(Address::new(999), Address::new(1), "PING");
        env.error_count = Config::default().max_bounces;

        assert_eq!(d.dispatch(env), Outcome::Dropped { at: Address::new(0) });
        assert!(d.rx.is_empty());
        assert_eq!(d.report().dropped, 1);
    }

    #[test]
    fn test_terminates_after_all_children_confirm_and_bus_drains() {
        let drained = Arc::new(AtomicBool::new(false));
        let children = vec![
            Node::new("Glados", 1).with_component(Slow(drained.clone())),
            Node::new("Auto", 1),
            Node::new("SoundManager", 1),
        ];
        let mut d = dispatcher(TABLE, children);

        d.dispatch(shutdown());
        assert!(d.is_shutting_down());
        assert_eq!(d.pending(), 3);

        d.drain();
        assert_eq!(d.stopped(), &[false, true, true]);
        assert_eq!(d.children()[0].lifecycle(), Lifecycle::Draining);
        assert!(!d.is_terminal());

        drained.store(true, Ordering::SeqCst);
        d.bus()
            .enqueue(Envelope::new(Address::new(1), Address::new(1), verbs::QUIESCED))
            .unwrap();
        d.dispatch_next();
        d.bus()
            .enqueue(Envelope::new(Address::new(3), Address::new(0), "PRINT late"))
            .unwrap();

        d.dispatch_next();
        assert_eq!(d.stopped(), &[true, true, true]);
        assert!(!d.is_terminal(), "an envelope is still queued");

        assert_eq!(d.dispatch_next(), Some(Outcome::Dropped { at: Address::new(3) }));
        assert!(d.is_terminal());
    }

    #[test]
    fn test_second_shutdown_is_idempotent() {
        let mut d = dispatcher(TABLE, plain_children());
        d.dispatch(shutdown());
        d.drain();
        assert!(d.is_terminal());

        d.dispatch(shutdown());
        assert_eq!(d.pending(), 3);
        d.drain();
        assert!(d.is_terminal());
        assert_eq!(d.stopped(), &[true, true, true]);
        assert!(d.children().iter().all(|c| c.lifecycle() == Lifecycle::Stopped));
    }

    #[test]
    fn test_shutdown_completes_on_a_full_bus() {
        let mut d = dispatcher_with_capacity(TABLE, plain_children(), 2);
        d.bus().enqueue(shutdown()).unwrap();

        d.dispatch_next();
        assert_eq!(d.pending(), 2, "two broadcasts fit");
        assert_eq!(d.children()[0].lifecycle(), Lifecycle::Active);
        assert_eq!(d.children()[2].lifecycle(), Lifecycle::Stopped);
        assert!(d.children()[2].has_unconfirmed());

        d.drain();
        assert_eq!(d.stopped(), &[true, true, true]);
        assert!(d.is_terminal());
    }

    #[test]
    fn test_unassigned_hub_confirms_nothing() {
        let children = vec![Node::new("Hub", 1).with_child(Node::new("Leaf", 2))];
        let mut d = dispatcher("0 Dispatcher\n110 Leaf\n", children);
        assert_eq!(d.children()[0].children()[0].address(), Address::new(110));

        assert_eq!(d.dispatch(shutdown()), Outcome::Delivered { to: Address::new(0) });
        assert_eq!(d.pending(), 0);
        assert_eq!(d.report().bounced, 0);
        assert!(d.is_terminal());
    }

    #[test]
    fn test_unassigned_child_is_stopped_in_place() {
        let mut d = dispatcher("0 Dispatcher\n1 Glados\n", plain_children());
        d.dispatch(shutdown());
        assert_eq!(d.stopped(), &[false, true, true]);
        assert_eq!(d.pending(), 1);

        d.drain();
        assert!(d.is_terminal());
    }

    #[test]
    fn test_reload_replies_and_translates_stale_addresses() {
        let mut d = dispatcher(TABLE, plain_children())
            .with_table_source(TableSource::Inline("0 Dispatcher\n5 Glados\n".into()));

        d.dispatch(Envelope::new(Address::new(0), Address::new(1), verbs::RELOAD));
        assert_eq!(d.children()[0].address(), Address::new(5));
        assert!(!d.children()[1].address().is_assigned());

        let reply = d.rx.dequeue().unwrap();
        assert_eq!(reply.target, Address::new(5));
        assert_eq!(reply.payload, RELOAD_OK);

        let out = d.dispatch(Envelope::new(Address::new(1), Address::new(0), "PRINT stale"));
        assert_eq!(out, Outcome::Delivered { to: Address::new(5) });
    }

    #[test]
    fn test_reload_reads_table_file() {
        let path = std::env::temp_dir().join(format!("actionbus-reload-{}.txt", std::process::id()));
        std::fs::write(&path, "// moved\n0 Dispatcher\n7 Auto\n").unwrap();
        let mut d = dispatcher(TABLE, plain_children())
            .with_table_source(TableSource::File(path.clone()));

        d.dispatch(Envelope::new(Address::new(0), Address::new(2), verbs::RELOAD));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(d.children()[1].address(), Address::new(7));
        let reply = d.rx.dequeue().unwrap();
        assert_eq!(reply.target, Address::new(7), "stale requester translated");
        assert_eq!(reply.payload, RELOAD_OK);
    }

    #[test]
    fn test_failed_reload_leaves_empty_table() {
        let mut d = dispatcher(TABLE, plain_children())
            .with_table_source(TableSource::Inline("zero Dispatcher\n".into()));

        d.dispatch(Envelope::new(Address::new(0), Address::new(1), verbs::RELOAD));
        assert!(d.children().iter().all(|c| !c.address().is_assigned()));
        assert_eq!(d.address(), DEFAULT_DISPATCHER_ADDRESS);

        let reply = d.rx.dequeue().unwrap();
        assert!(reply.payload.starts_with("PRINT component list could not be read"));
    }
}
