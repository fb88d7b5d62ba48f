//! # Runtime: boot, workers, signals and the final grace wait.
//!
//! ```text
//! RuntimeBuilder::new(cfg) ──► bus / registry / telemetry created
//!        │   .with_topology(..) / .with_children(..) / .with_workers(..)
//!        ▼
//! Runtime::run()
//!   ├─► subscriber listener (Telemetry ─► SubscriberSet, AliveTracker)
//!   ├─► load component table          (missing file ─► RuntimeError::Load)
//!   ├─► resolve addresses, enqueue UPDATE_IDS
//!   ├─► spawn workers (supervise)     ─┐
//!   ├─► OS signal ─► SHUTDOWN envelope │  all talk through the bus
//!   ├─► Dispatcher::run() ◄────────────┘
//!   ├─► cancel workers, wait within grace
//!   └─► flush subscribers, return DispatchReport
//! ```

mod builder;
mod engine;
mod signal;

pub use builder::{RuntimeBuilder, Topology};
pub use engine::Runtime;
pub use signal::wait_for_shutdown_signal;
