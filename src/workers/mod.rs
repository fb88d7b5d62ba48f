//! # Leaf worker loops.
//!
//! Components never block inside [`Component::handle`](crate::Component::handle).
//! Anything that waits (reading the terminal, playing an utterance) runs in a
//! [`Worker`]: a named, cancellable async loop that talks to the routers only
//! through the bus.
//!
//! ```text
//! supervise(worker):
//! loop {
//!   ├─► pass += 1, publish WorkerStarting{ pass }
//!   ├─► worker.spawn(child_token).await
//!   │     ├─ Ok / Canceled ─► WorkerStopped, exit
//!   │     ├─ Fatal         ─► WorkerFailed, exit
//!   │     └─ Fail          ─► WorkerFailed, sleep(restart_delay), continue
//!   └─ token cancelled     ─► exit
//! }
//! ```

mod supervise;
mod worker;
mod worker_fn;

pub use supervise::{run_once, supervise};
pub use worker::{BoxWorkerFuture, Worker, WorkerRef};
pub use worker_fn::WorkerFn;
