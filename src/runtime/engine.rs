use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bus::{Bus, BusReceiver};
use crate::config::Config;
use crate::dispatch::{DispatchReport, Dispatcher, DEFAULT_DISPATCHER_ADDRESS};
use crate::envelope::{verbs, Envelope};
use crate::error::{LoadError, RuntimeError};
use crate::registry::{Registry, TableSource};
use crate::routing::Node;
use crate::telemetry::{AliveTracker, Event, EventKind, Subscribe, SubscriberSet, Telemetry};
use crate::workers::{supervise, WorkerRef};

use super::builder::RuntimeBuilder;
use super::signal;

/// Owns everything one run of the assistant needs.
///
/// Created by [`RuntimeBuilder::build`] and consumed by [`Runtime::run`].
pub struct Runtime {
    pub(super) cfg: Config,
    pub(super) bus: Bus,
    pub(super) rx: BusReceiver,
    pub(super) registry: Arc<Registry>,
    pub(super) telemetry: Telemetry,
    pub(super) subscribers: Vec<Arc<dyn Subscribe>>,
    pub(super) alive: Arc<AliveTracker>,
    pub(super) table: TableSource,
    pub(super) children: Vec<Node>,
    pub(super) workers: Vec<WorkerRef>,
    pub(super) os_signals: bool,
}

struct Listener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl Runtime {
    pub fn builder(cfg: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn alive(&self) -> &Arc<AliveTracker> {
        &self.alive
    }

    /// Boots, runs the dispatcher until the shutdown handshake completes and
    /// waits for the workers.
    ///
    /// A malformed table is not an error here: the run continues with an
    /// empty table until a `RELOAD` succeeds.
    pub async fn run(self) -> Result<DispatchReport, RuntimeError> {
        let Runtime {
            cfg,
            bus,
            rx,
            registry,
            telemetry,
            subscribers,
            alive,
            table,
            children,
            workers,
            os_signals,
        } = self;

        let listener = subscriber_listener(subscribers, &telemetry);

        match registry.load_source(&table) {
            Ok(records) => info!(records, "component table loaded"),
            Err(e @ LoadError::Io { .. }) => {
                stop_listener(listener).await;
                return Err(RuntimeError::Load(e));
            }
            Err(e) => warn!(error = %e, "running with an empty component table"),
        }

        let mut dispatcher = Dispatcher::new(
            &cfg,
            bus.clone(),
            rx,
            Arc::clone(&registry),
            telemetry.clone(),
            children,
        )
        .with_table_source(table);
        dispatcher.resolve_addresses();
        let root = dispatcher.address();
        if let Err(e) = bus.enqueue(Envelope::new(root, root, verbs::UPDATE_IDS)) {
            warn!(error = %e, "UPDATE_IDS not enqueued");
        }

        let token = CancellationToken::new();
        let mut set = JoinSet::new();
        for worker in workers {
            set.spawn(supervise(
                worker,
                token.child_token(),
                telemetry.clone(),
                cfg.worker_restart_delay,
            ));
        }

        let bridge = os_signals.then(|| {
            signal_bridge(
                bus.clone(),
                Arc::clone(&registry),
                cfg.dispatcher_name.clone(),
                token.clone(),
            )
        });

        let report = dispatcher.run().await;

        token.cancel();
        if let Some(bridge) = bridge {
            bridge.abort();
        }
        let res = wait_all_with_grace(&mut set, cfg.grace, &telemetry, &alive).await;
        stop_listener(listener).await;
        res.map(|()| report)
    }
}

/// Forwards telemetry into the subscriber set until stopped.
fn subscriber_listener(subscribers: Vec<Arc<dyn Subscribe>>, telemetry: &Telemetry) -> Listener {
    let mut rx = telemetry.subscribe();
    let set = SubscriberSet::new(subscribers, telemetry.clone());
    let stop = CancellationToken::new();
    let stopped = stop.clone();

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "telemetry listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stopped.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    });
    Listener { stop, handle }
}

async fn stop_listener(listener: Listener) {
    listener.stop.cancel();
    let _ = listener.handle.await;
}

/// Enqueues `SHUTDOWN` for the dispatcher on every termination signal.
fn signal_bridge(
    bus: Bus,
    registry: Arc<Registry>,
    dispatcher: String,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                res = signal::wait_for_shutdown_signal() => {
                    if let Err(e) = res {
                        warn!(error = %e, "cannot listen for termination signals");
                        break;
                    }
                    let mut to = registry.address_of(&dispatcher);
                    if !to.is_assigned() {
                        to = DEFAULT_DISPATCHER_ADDRESS;
                    }
                    info!("termination signal received");
                    if let Err(e) = bus.enqueue(Envelope::new(to, to, verbs::SHUTDOWN)) {
                        warn!(error = %e, "SHUTDOWN not enqueued");
                    }
                }
                _ = token.cancelled() => break,
            }
        }
    })
}

async fn wait_all_with_grace(
    set: &mut JoinSet<()>,
    grace: Duration,
    telemetry: &Telemetry,
    alive: &AliveTracker,
) -> Result<(), RuntimeError> {
    let done = async { while set.join_next().await.is_some() {} };

    match tokio::time::timeout(grace, done).await {
        Ok(()) => {
            telemetry.publish(Event::new(EventKind::AllStoppedWithin));
            Ok(())
        }
        Err(_) => {
            let stuck = alive.snapshot();
            telemetry.publish(
                Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")),
            );
            set.abort_all();
            Err(RuntimeError::GraceExceeded { grace, stuck })
        }
    }
}
