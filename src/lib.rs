//! # actionbus
//!
//! **actionbus** is the message core of a small device assistant: every
//! subsystem is reachable only through one bounded in-process bus, keyed by
//! hierarchical numeric addresses.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   terminal-input     sound-playback      any producer
//!   (worker loop)      (worker loop)       (Bus clone)
//!        │                  │                   │
//!        ▼                  ▼                   ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                Bus (bounded FIFO of Envelopes)            │
//! │                (capacity: Config::bus_capacity)           │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               ▼
//!                   ┌───────────────────────┐     Registry
//!                   │      Dispatcher       │◄──── (current + previous
//!                   │ translate, route, and │       component table)
//!                   │ shutdown handshake    │
//!                   └───┬───────┬───────┬───┘
//!                       ▼       ▼       ▼
//!                    Glados    Auto   SoundManager      (Node, width 1)
//!                       │       │
//!                       ▼       ▼
//!            TerminalManager  FileManager               (Node, width 2)
//!
//!  every step publishes Events ─► Telemetry ─► SubscriberSet
//!                                              ├─► LogWriter
//!                                              └─► AliveTracker
//! ```
//!
//! ### Addressing
//! ```text
//! table: 1 Glados / 110 TerminalManager
//!
//! Glados           span = digits [0, 1)   owns 1, 1x, 1xx, ...
//! TerminalManager  span = digits [1, 3)   owns 110, 110x, ...
//!
//! target 110: Glados matches digit "1", TerminalManager matches "110"
//! target 150: Glados matches, no child does, 150 != 1 ─► bounce from Glados
//! ```
//!
//! ### Shutdown
//! ```text
//! SHUTDOWN ─► Dispatcher ─► SHUTDOWN to every top-level child
//!   child: Active ─► Draining, cascade to its children,
//!          wait for children and component ─► Stopped,
//!          SHUTDOWN_COMPLETE ─► Dispatcher
//! Dispatcher exits once every child confirmed and the bus is empty.
//! ```
//!
//! ## Features
//! | Area          | Description                                                   | Key types                             |
//! |---------------|---------------------------------------------------------------|---------------------------------------|
//! | Addressing    | Integer digit-prefix matching                                 | [`Address`], [`DigitSpan`]            |
//! | Messages      | Envelope plus verb parser                                     | [`Envelope`], [`Command`]             |
//! | Bus           | Bounded FIFO, overflow returned to the caller                 | [`Bus`], [`BusReceiver`], [`BusError`]|
//! | Registry      | Two-generation name/address table                             | [`Registry`], [`ComponentTable`]      |
//! | Routing       | Router tree, leaf contract, lifecycle                         | [`Node`], [`Component`], [`Lifecycle`]|
//! | Dispatch      | Root loop and shutdown handshake                              | [`Dispatcher`]                        |
//! | Telemetry     | Events, fan-out to subscribers                                | [`Event`], [`Subscribe`], [`LogWriter`]|
//! | Workers       | Supervised, cancellable leaf loops                            | [`Worker`], [`WorkerFn`]              |
//! | Runtime       | Boot, OS signals, grace period                                | [`Runtime`], [`RuntimeBuilder`]       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use actionbus::{Address, Bus, Config, Dispatcher, Envelope, Node, Registry, Telemetry};
//!
//! let cfg = Config::default();
//! let (bus, rx) = Bus::new(16);
//! let registry = Arc::new(Registry::new());
//! registry.load("0 Dispatcher\n1 Alpha\n12 Beta\n").unwrap();
//!
//! let tree = vec![Node::new("Alpha", 1).with_child(Node::new("Beta", 1))];
//! let mut dispatcher = Dispatcher::new(&cfg, bus.clone(), rx, registry, Telemetry::default(), tree);
//! dispatcher.resolve_addresses();
//!
//! bus.enqueue(Envelope::new(Address::new(999), Address::new(1), "PRINT hi")).unwrap();
//! dispatcher.dispatch_next();
//! assert_eq!(dispatcher.pending(), 1); // bounced back towards Alpha
//! ```

mod address;
mod bus;
mod config;
mod error;

pub mod components;
pub mod dispatch;
pub mod envelope;
pub mod registry;
pub mod routing;
pub mod runtime;
pub mod telemetry;
pub mod workers;

// ---- Public re-exports ----

pub use address::{Address, DigitSpan};
pub use bus::{Bus, BusReceiver};
pub use config::Config;
pub use error::{BusError, LoadError, RuntimeError, WorkerError};

pub use components::{default_topology, FileManager, Outbox, SoundManager, TerminalManager};
pub use dispatch::{DispatchReport, Dispatcher, DEFAULT_DISPATCHER_ADDRESS};
pub use envelope::{verbs, Command, Envelope, ERROR_MARKER};
pub use registry::{ComponentRecord, ComponentTable, Generation, Registry, Snapshot, TableSource};
pub use routing::{Component, Drain, Handled, Lifecycle, LifecycleFlag, Node, Outcome, RouteCtx};
pub use runtime::{Runtime, RuntimeBuilder, Topology};
pub use telemetry::{AliveTracker, Event, EventKind, LogWriter, Subscribe, SubscriberSet, Telemetry};
pub use workers::{supervise, Worker, WorkerFn, WorkerRef};
