//! Telemetry: runtime events, their broadcast channel and subscribers.
//!
//! Routing, dispatch and worker supervision publish [`Event`]s describing what
//! happened to envelopes and workers. Events are fire-and-forget: they never
//! influence routing, and losing one (lagging receiver, full subscriber
//! queue) is tolerated.
//!
//! ## Architecture
//! ```text
//! Node / Dispatcher / supervise()
//!        │ publish(Event)
//!        ▼
//!   Telemetry (broadcast) ──► runtime listener ──► SubscriberSet
//!                                                 ┌─────┴─────┐
//!                                                 ▼           ▼
//!                                             LogWriter  AliveTracker  ...
//! ```
//!
//! ## Contents
//! - [`Event`], [`EventKind`] event data model
//! - [`Telemetry`] thin wrapper over `tokio::sync::broadcast`
//! - [`Subscribe`] extension trait, [`SubscriberSet`] fan-out
//! - [`LogWriter`] renders events through `tracing`
//! - [`AliveTracker`] set of running workers

mod alive;
mod channel;
mod event;
mod log;
mod set;
mod subscribe;

pub use alive::AliveTracker;
pub use channel::Telemetry;
pub use event::{Event, EventKind};
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
