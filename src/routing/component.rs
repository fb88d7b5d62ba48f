//! # Leaf contract.
//!
//! A [`Component`] is the local behaviour behind a router: whatever the
//! router does when an envelope is addressed to it. Routing, shutdown
//! bookkeeping and address resolution are done by [`Node`](crate::Node); a
//! component only interprets payloads.
//!
//! Handlers must not block. Anything slow is handed to a worker loop
//! (see [`crate::workers`]) that reports back through the bus.
//!
//! ## Example
//! ```rust
//! use actionbus::{Command, Component, Envelope, Handled, RouteCtx};
//!
//! struct Echo;
//!
//! impl Component for Echo {
//!     fn handle(&mut self, env: &Envelope, cmd: Command<'_>, ctx: &RouteCtx<'_>) -> Handled {
//!         match cmd {
//!             Command::Print(text) => {
//!                 let _ = ctx.reply(env, env.target, format!("PRINT echo: {text}"));
//!                 Handled::Done
//!             }
//!             _ => Handled::Unknown,
//!         }
//!     }
//! }
//! ```

use crate::address::Address;
use crate::envelope::{Command, Envelope};
use crate::registry::Snapshot;

use super::ctx::RouteCtx;

/// Result of [`Component::handle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handled {
    /// The payload was understood.
    Done,
    /// The verb means nothing here.
    Unknown,
}

/// Result of [`Component::on_shutdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Drain {
    /// Nothing left to do; the router may confirm right away.
    Done,
    /// Work is still queued. The router re-checks [`Component::is_drained`]
    /// whenever a `QUIESCED` or `SHUTDOWN_COMPLETE` reaches it.
    Pending,
}

/// Local behaviour of a router.
pub trait Component: Send + 'static {
    /// Handles an envelope addressed to this router.
    ///
    /// Only called while the router is active. Control verbs (`SHUTDOWN`,
    /// `SHUTDOWN_COMPLETE`, `UPDATE_IDS`, `QUIESCED`) never reach it.
    fn handle(&mut self, env: &Envelope, cmd: Command<'_>, ctx: &RouteCtx<'_>) -> Handled;

    /// Called once when the router starts draining.
    fn on_shutdown(&mut self, _ctx: &RouteCtx<'_>) -> Drain {
        Drain::Done
    }

    /// True once all accepted work is finished.
    fn is_drained(&self) -> bool {
        true
    }

    /// Called after the router resolved its address for a new registry
    /// generation.
    fn on_addresses_updated(&mut self, _own: Address, _registry: &Snapshot) {}
}
