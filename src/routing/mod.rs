//! Router contract: the recursive tree below the dispatcher.
//!
//! - [`Node`] routes by digit prefix, handles the shutdown handshake and
//!   resolves its own address from the registry.
//! - [`Component`] is the leaf contract: local behaviour behind a router.
//! - [`LifecycleFlag`] holds a router's [`Lifecycle`], readable by worker
//!   loops with a single atomic load.
//! - [`RouteCtx`] gives routers and components access to the bus, the
//!   registry and telemetry for one dispatch step.
//!
//! ```text
//!             Dispatcher (root, span 0..0)
//!            ┌─────────────┼──────────────┐
//!        Glados(1)      Auto(2)     SoundManager(3)      level 0, width 1
//!           │              │
//!   TerminalManager(110) FileManager(210)                level 1, width 2
//! ```

mod component;
mod ctx;
mod lifecycle;
mod node;

pub use component::{Component, Drain, Handled};
pub use ctx::RouteCtx;
pub use lifecycle::{Lifecycle, LifecycleFlag};
pub use node::{Node, Outcome};
