//! Per-router lifecycle: `Active → Draining → Stopped`, forward only.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle state of a router and of the leaf loops behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Lifecycle {
    /// Accepts work.
    Active = 0,
    /// Got `SHUTDOWN`; finishes accepted work, takes no new work.
    Draining = 1,
    /// Quiesced and confirmed.
    Stopped = 2,
}

impl Lifecycle {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Lifecycle::Active,
            1 => Lifecycle::Draining,
            _ => Lifecycle::Stopped,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Lifecycle::Active => "active",
            Lifecycle::Draining => "draining",
            Lifecycle::Stopped => "stopped",
        }
    }
}

/// Shared, lock-free lifecycle cell.
///
/// A router owns one and hands clones to its worker loops, which poll it with
/// a single atomic load. Transitions only move forward; a request to move
/// backwards is a no-op.
#[derive(Clone, Debug, Default)]
pub struct LifecycleFlag(Arc<AtomicU8>);

impl LifecycleFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> Lifecycle {
        Lifecycle::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.get() == Lifecycle::Active
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.get() == Lifecycle::Stopped
    }

    /// Moves to `to` if that is later than the current state.
    ///
    /// Returns `true` if the state changed.
    pub fn advance(&self, to: Lifecycle) -> bool {
        let prev = self.0.fetch_max(to as u8, Ordering::AcqRel);
        prev < to as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let flag = LifecycleFlag::new();
        assert!(flag.is_active());

        assert!(flag.advance(Lifecycle::Draining));
        assert!(!flag.advance(Lifecycle::Draining));
        assert!(!flag.advance(Lifecycle::Active));
        assert_eq!(flag.get(), Lifecycle::Draining);

        assert!(flag.advance(Lifecycle::Stopped));
        assert!(!flag.advance(Lifecycle::Draining));
        assert!(flag.is_stopped());
    }

    #[test]
    fn test_clones_share_state() {
        let flag = LifecycleFlag::new();
        let seen_by_worker = flag.clone();
        flag.advance(Lifecycle::Stopped);
        assert!(seen_by_worker.is_stopped());
        assert_eq!(seen_by_worker.get().as_label(), "stopped");
    }
}
