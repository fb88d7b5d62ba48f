//! # AliveTracker: which workers are running.
//!
//! Listens to [`EventKind::WorkerStarting`], [`EventKind::WorkerStopped`] and
//! [`EventKind::WorkerFailed`]. The runtime reads it after the grace period to
//! name the workers that did not stop.
//!
//! ```text
//! on_event(ev):
//!   ├─ ev.seq <= last_seq(worker)       => ignore (stale)
//!   ├─ WorkerStarting                   => alive
//!   ├─ WorkerStopped | WorkerFailed     => not alive
//!   └─ otherwise                        => ignore
//!
//! snapshot() -> Vec<String>  (sorted names of alive workers)
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::event::{Event, EventKind};
use super::subscribe::Subscribe;

#[derive(Debug, Clone, Copy)]
struct WorkerState {
    last_seq: Option<u64>,
    alive: bool,
}

/// Tracks the set of currently running worker names.
pub struct AliveTracker {
    state: RwLock<HashMap<String, WorkerState>>,
    capacity: usize,
}

impl AliveTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
            capacity: 2048,
        }
    }

    /// Applies `ev` if it is newer than the last event seen for its worker.
    ///
    /// Returns `true` if the alive state changed.
    pub fn update(&self, ev: &Event) -> bool {
        let alive = match ev.kind {
            EventKind::WorkerStarting => true,
            EventKind::WorkerStopped | EventKind::WorkerFailed => false,
            _ => return false,
        };
        let Some(name) = ev.name.as_deref() else {
            return false;
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let entry = state.entry(name.to_string()).or_insert(WorkerState {
            last_seq: None,
            alive: false,
        });
        if entry.last_seq.is_some_and(|last| ev.seq <= last) {
            return false;
        }
        let changed = entry.alive != alive;
        entry.last_seq = Some(ev.seq);
        entry.alive = alive;
        changed
    }

    /// Sorted names of the workers currently alive.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, ws)| ws.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }

    pub fn is_alive(&self, name: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .is_some_and(|ws| ws.alive)
    }
}

impl Default for AliveTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for AliveTracker {
    async fn on_event(&self, ev: &Event) {
        self.update(ev);
    }

    fn name(&self) -> &'static str {
        "AliveTracker"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, name: &str) -> Event {
        Event::new(kind).with_name(name)
    }

    #[test]
    fn test_tracks_start_and_stop() {
        let t = AliveTracker::new();
        assert!(t.update(&ev(EventKind::WorkerStarting, "terminal")));
        assert!(t.update(&ev(EventKind::WorkerStarting, "sound")));
        assert_eq!(t.snapshot(), vec!["sound", "terminal"]);

        assert!(t.update(&ev(EventKind::WorkerFailed, "sound")));
        assert!(!t.is_alive("sound"));
        assert!(t.is_alive("terminal"));
    }

    #[test]
    fn test_stale_events_are_rejected() {
        let t = AliveTracker::new();
        let start = ev(EventKind::WorkerStarting, "terminal");
        let stop = ev(EventKind::WorkerStopped, "terminal");

        assert!(!t.update(&stop));
        assert!(!t.update(&start), "older than the stop already applied");
        assert!(!t.is_alive("terminal"));
    }

    #[test]
    fn test_ignores_other_kinds() {
        let t = AliveTracker::new();
        assert!(!t.update(&ev(EventKind::Delivered, "terminal")));
        assert!(t.snapshot().is_empty());
    }
}
