//! Two-generation registry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::address::Address;
use crate::error::LoadError;

use super::table::ComponentTable;

/// Which table a lookup consults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generation {
    Current,
    Previous,
}

/// Where the component table comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableSource {
    /// A table file, re-read on every load.
    File(PathBuf),
    /// Table text held in memory.
    Inline(String),
}

impl From<PathBuf> for TableSource {
    fn from(path: PathBuf) -> Self {
        TableSource::File(path)
    }
}

/// Immutable view of both generations.
#[derive(Debug, Default)]
pub struct Snapshot {
    current: ComponentTable,
    previous: ComponentTable,
    generation: u64,
}

impl Snapshot {
    pub fn current(&self) -> &ComponentTable {
        &self.current
    }

    pub fn previous(&self) -> &ComponentTable {
        &self.previous
    }

    /// Number of replacements since the registry was created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn table(&self, generation: Generation) -> &ComponentTable {
        match generation {
            Generation::Current => &self.current,
            Generation::Previous => &self.previous,
        }
    }

    /// Maps an address that may come from the previous generation onto the
    /// current one.
    ///
    /// Addresses known to the current table, and addresses whose name no
    /// longer exists, come back unchanged.
    pub fn translate(&self, address: Address) -> Address {
        if self.current.contains(address) {
            return address;
        }
        self.previous
            .name_of(address)
            .and_then(|name| self.current.address_of(name))
            .unwrap_or(address)
    }
}

/// Name ↔ address registry shared by the dispatcher and every router.
///
/// ### Properties
/// - Lookups take a read lock only long enough to clone an `Arc`.
/// - Replacement swaps the whole [`Snapshot`] under a single write lock.
#[derive(Debug, Default)]
pub struct Registry {
    inner: RwLock<Arc<Snapshot>>,
}

impl Registry {
    /// Creates an empty registry (generation 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `source` and installs it as the current table.
    ///
    /// On a parse error the current table becomes **empty** and the error is
    /// returned; the table that was current moves to `previous` either way.
    /// Returns the number of records loaded.
    pub fn load(&self, source: &str) -> Result<usize, LoadError> {
        match ComponentTable::parse(source) {
            Ok(table) => {
                let n = table.len();
                self.replace(table);
                Ok(n)
            }
            Err(e) => {
                warn!(error = %e, "component table rejected; falling back to an empty table");
                self.replace(ComponentTable::new());
                Err(e)
            }
        }
    }

    /// Reads and loads the table file at `path`.
    ///
    /// An unreadable file is treated like a malformed one: the current table
    /// becomes empty.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<usize, LoadError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(source) => self.load(&source),
            Err(source) => {
                warn!(path = %path.display(), error = %source, "cannot read component table");
                self.replace(ComponentTable::new());
                Err(LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /// Loads from either kind of [`TableSource`].
    pub fn load_source(&self, source: &TableSource) -> Result<usize, LoadError> {
        match source {
            TableSource::File(path) => self.load_file(path),
            TableSource::Inline(text) => self.load(text),
        }
    }

    /// Installs `table` as current; the old current table becomes previous.
    pub fn replace(&self, table: ComponentTable) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = Snapshot {
            previous: guard.current.clone(),
            current: table,
            generation: guard.generation + 1,
        };
        debug!(
            generation = next.generation,
            records = next.current.len(),
            "component table replaced"
        );
        *guard = Arc::new(next);
    }

    /// Current snapshot of both generations.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Address registered for `name`, or [`Address::UNASSIGNED`].
    pub fn address_of(&self, name: &str) -> Address {
        self.snapshot()
            .current
            .address_of(name)
            .unwrap_or(Address::UNASSIGNED)
    }

    /// Name registered for `address` in the selected generation.
    pub fn name_of(&self, address: Address, generation: Generation) -> Option<String> {
        self.snapshot()
            .table(generation)
            .name_of(address)
            .map(str::to_owned)
    }

    /// See [`Snapshot::translate`].
    pub fn translate(&self, address: Address) -> Address {
        self.snapshot().translate(address)
    }

    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_lookup() {
        let reg = Registry::new();
        assert_eq!(reg.generation(), 0);
        assert_eq!(reg.load("1 Alpha\n12 Beta\n").unwrap(), 2);

        assert_eq!(reg.generation(), 1);
        assert_eq!(reg.address_of("Alpha"), Address::new(1));
        assert_eq!(reg.address_of("Nobody"), Address::UNASSIGNED);
        assert_eq!(
            reg.name_of(Address::new(12), Generation::Current).as_deref(),
            Some("Beta")
        );
        assert_eq!(reg.name_of(Address::new(12), Generation::Previous), None);
    }

    #[test]
    fn test_failed_load_is_empty_not_partial() {
        let reg = Registry::new();
        reg.load("1 Alpha\n").unwrap();
        assert!(reg.load("2 Beta\nnot a line at all\n").is_err());

        let snap = reg.snapshot();
        assert!(snap.current().is_empty());
        assert_eq!(snap.previous().address_of("Alpha"), Some(Address::new(1)));
        assert_eq!(reg.address_of("Beta"), Address::UNASSIGNED);
        assert_eq!(snap.generation(), 2);
    }

    #[test]
    fn test_replace_keeps_one_previous_generation() {
        let reg = Registry::new();
        reg.load("1 Alpha\n2 Beta\n").unwrap();
        reg.load("5 Alpha\n2 Beta\n").unwrap();

        assert_eq!(
            reg.name_of(Address::new(1), Generation::Previous).as_deref(),
            Some("Alpha")
        );
        assert_eq!(reg.translate(Address::new(1)), Address::new(5));
        assert_eq!(reg.translate(Address::new(2)), Address::new(2));
        assert_eq!(reg.translate(Address::new(77)), Address::new(77));

        reg.load("6 Alpha\n").unwrap();
        assert_eq!(reg.name_of(Address::new(1), Generation::Previous), None);
    }

    #[test]
    fn test_load_source_inline() {
        let reg = Registry::new();
        let src = TableSource::Inline("3 SoundManager\n".into());
        assert_eq!(reg.load_source(&src).unwrap(), 1);
        assert_eq!(reg.load_source(&src).unwrap(), 1);
        assert_eq!(reg.generation(), 2);
        assert_eq!(reg.address_of("SoundManager"), Address::new(3));
    }

    #[test]
    fn test_missing_file_empties_table() {
        let reg = Registry::new();
        reg.load("1 Alpha\n").unwrap();
        let err = reg
            .load_file("/nonexistent/actionbus/componentList.txt")
            .unwrap_err();
        assert_eq!(err.as_label(), "load_io");
        assert!(reg.snapshot().current().is_empty());
    }
}
