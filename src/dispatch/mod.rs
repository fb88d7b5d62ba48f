//! # Dispatcher: root router and bus consumer.
//!
//! The [`Dispatcher`] owns the receiving end of the bus and the top-level
//! routers. It is the only task that pops envelopes; every hop below it runs
//! synchronously inside one dispatch step.
//!
//! ```text
//!              ┌──────────── shutting_down = false ────────────┐
//!   run() ──►  │ next(poll_interval) ─► translate ─► route     │
//!              └──────────────────────┬────────────────────────┘
//!                                     │ SHUTDOWN addressed to the dispatcher
//!                                     ▼
//!              ┌──────────── shutting_down = true ─────────────┐
//!              │ SHUTDOWN ─► every top-level child             │
//!              │ SHUTDOWN_COMPLETE from child i ─► stopped[i]  │
//!              └──────────────────────┬────────────────────────┘
//!                                     │ all stopped && bus empty
//!                                     ▼
//!                              DispatcherTerminated
//! ```
//!
//! Routing at the root:
//! - target unassigned (negative) ─► bounce
//! - some child owns the target   ─► `child.handle_at`
//! - target is the dispatcher     ─► `SHUTDOWN` / `SHUTDOWN_COMPLETE` /
//!   `UPDATE_IDS` / `RELOAD`
//! - anything else                ─► bounce

mod dispatcher;

pub use dispatcher::{DispatchReport, Dispatcher, DEFAULT_DISPATCHER_ADDRESS, RELOAD_OK};
