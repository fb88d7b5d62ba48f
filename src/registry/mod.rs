//! # Component registry: the name ↔ address table.
//!
//! The [`Registry`] holds two generations of the component table. The current
//! one answers every lookup; the previous one only exists to translate
//! addresses stamped on envelopes that were in flight when the table changed.
//!
//! ## Architecture
//! ```text
//! componentList.txt ──► ComponentTable::parse ──► Registry::replace
//!                                                      │
//!                               RwLock<Arc<Snapshot>> ◄┘  (swapped whole)
//!                                 ├─ current : ComponentTable
//!                                 ├─ previous: ComponentTable
//!                                 └─ generation: u64
//! ```
//!
//! ## Rules
//! - Snapshots are immutable; readers never see a half-updated table.
//! - A failed load installs an **empty** table, never a partial one, and still
//!   rotates the old current table into `previous`.
//! - Every replacement bumps the generation counter; routers use it to
//!   resolve their own address at most once per generation.

mod store;
mod table;

pub use store::{Generation, Registry, Snapshot, TableSource};
pub use table::{ComponentRecord, ComponentTable, COMMENT_MARKER};
