use std::sync::Arc;

use crate::bus::{Bus, BusReceiver};
use crate::config::Config;
use crate::registry::{Registry, TableSource};
use crate::routing::Node;
use crate::telemetry::{AliveTracker, Subscribe, Telemetry};
use crate::workers::WorkerRef;

use super::engine::Runtime;

/// Top-level routers plus the worker loops behind their components.
#[derive(Default)]
pub struct Topology {
    pub children: Vec<Node>,
    pub workers: Vec<WorkerRef>,
}

/// Assembles a [`Runtime`].
///
/// The bus, registry and telemetry channel exist from [`RuntimeBuilder::new`]
/// on, so components and workers can be wired to them before `build`.
pub struct RuntimeBuilder {
    cfg: Config,
    bus: Bus,
    rx: BusReceiver,
    registry: Arc<Registry>,
    telemetry: Telemetry,
    subscribers: Vec<Arc<dyn Subscribe>>,
    table: TableSource,
    children: Vec<Node>,
    workers: Vec<WorkerRef>,
    os_signals: bool,
}

impl RuntimeBuilder {
    pub fn new(cfg: Config) -> Self {
        let (bus, rx) = Bus::new(cfg.bus_capacity_clamped());
        let telemetry = Telemetry::new(cfg.telemetry_capacity_clamped());
        let table = TableSource::File(cfg.component_table.clone());
        Self {
            cfg,
            bus,
            rx,
            registry: Arc::new(Registry::new()),
            telemetry,
            subscribers: Vec::new(),
            table,
            children: Vec::new(),
            workers: Vec::new(),
            os_signals: true,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
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

    #[must_use]
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Reads the component table from `table` instead of `Config::component_table`.
    #[must_use]
    pub fn with_table_source(mut self, table: TableSource) -> Self {
        self.table = table;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: Vec<WorkerRef>) -> Self {
        self.workers.extend(workers);
        self
    }

    #[must_use]
    pub fn with_topology(self, topology: Topology) -> Self {
        self.with_children(topology.children)
            .with_workers(topology.workers)
    }

    /// Bridges OS termination signals to `SHUTDOWN` (on by default).
    #[must_use]
    pub fn with_os_signals(mut self, enabled: bool) -> Self {
        self.os_signals = enabled;
        self
    }

    pub fn build(self) -> Runtime {
        let alive = Arc::new(AliveTracker::new());
        let mut subscribers = self.subscribers;
        subscribers.push(alive.clone());

        Runtime {
            cfg: self.cfg,
            bus: self.bus,
            rx: self.rx,
            registry: self.registry,
            telemetry: self.telemetry,
            subscribers,
            alive,
            table: self.table,
            children: self.children,
            workers: self.workers,
            os_signals: self.os_signals,
        }
    }
}
