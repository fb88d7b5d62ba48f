//! # Subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into
//! the runtime. Each subscriber is driven by a dedicated worker loop fed by a
//! bounded queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block routing, the
//!   dispatcher, or other subscribers.
//! - Each subscriber declares its queue capacity via
//!   [`Subscribe::queue_capacity`]. On overflow its events are **dropped**.
//!
//! ## Example
//! ```rust
//! use actionbus::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! #[derive(Default)]
//! struct BounceCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for BounceCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::Bounced {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "bounce-counter" }
//! }
//! ```

use async_trait::async_trait;

use super::event::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
