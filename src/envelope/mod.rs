//! Envelopes: the unit carried by the bus.
//!
//! ## Contents
//! - [`Envelope`] routed message value (target, origin, payload, counters)
//! - [`Command`] borrowed view of a payload, matched by verb
//! - [`verbs`] the verb strings shared by every subsystem
//!
//! Payloads are plain text. Nothing here validates a payload beyond matching
//! known verbs; a router that owns an address decides what an unknown verb
//! means for it.

mod command;
mod message;

pub use command::{verbs, Command};
pub use message::{Envelope, ERROR_MARKER};
