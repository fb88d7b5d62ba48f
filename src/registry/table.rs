//! Component table parsing.
//!
//! The table is line-oriented text:
//!
//! ```text
//! // comment
//! 0 Dispatcher
//! 1 Glados
//! 110 TerminalManager
//! ```
//!
//! Blank lines and lines starting with [`COMMENT_MARKER`] are skipped. Any
//! other line must be `<address> <name>` with a non-negative integer address
//! and a single-word name; both must be unique.

use std::collections::HashMap;
use std::fmt;

use crate::address::Address;
use crate::error::LoadError;

/// Prefix of a comment line.
pub const COMMENT_MARKER: &str = "//";

/// One `(name, address)` pair of the table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentRecord {
    pub name: String,
    pub address: Address,
}

impl ComponentRecord {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// Ordered, validated set of component records.
///
/// Lookups in both directions are backed by indexes built at construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentTable {
    records: Vec<ComponentRecord>,
    by_name: HashMap<String, usize>,
    by_address: HashMap<Address, usize>,
}

impl ComponentTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the textual table. Fails on the first malformed line.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let mut table = Self::new();

        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }
            let malformed = |reason: &'static str| LoadError::Malformed {
                line: idx + 1,
                content: line.to_string(),
                reason,
            };

            let mut parts = line.split_whitespace();
            let (Some(addr), Some(name)) = (parts.next(), parts.next()) else {
                return Err(malformed("expected `<address> <name>`"));
            };
            if parts.next().is_some() {
                return Err(malformed("trailing text after name"));
            }
            let address: Address = addr
                .parse()
                .map_err(|_| malformed("address is not an integer"))?;

            table
                .push(ComponentRecord::new(name, address))
                .map_err(malformed)?;
        }
        Ok(table)
    }

    /// Builds a table from records, rejecting duplicates and negative addresses.
    pub fn from_records<I>(records: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = ComponentRecord>,
    {
        let mut table = Self::new();
        for (idx, rec) in records.into_iter().enumerate() {
            let content = format!("{} {}", rec.address, rec.name);
            table.push(rec).map_err(|reason| LoadError::Malformed {
                line: idx + 1,
                content,
                reason,
            })?;
        }
        Ok(table)
    }

    fn push(&mut self, rec: ComponentRecord) -> Result<(), &'static str> {
        if !rec.address.is_assigned() {
            return Err("address is negative");
        }
        if rec.name.is_empty() || rec.name.contains(char::is_whitespace) {
            return Err("name must be a single word");
        }
        if self.by_name.contains_key(&rec.name) {
            return Err("duplicate name");
        }
        if self.by_address.contains_key(&rec.address) {
            return Err("duplicate address");
        }
        let idx = self.records.len();
        self.by_name.insert(rec.name.clone(), idx);
        self.by_address.insert(rec.address, idx);
        self.records.push(rec);
        Ok(())
    }

    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.by_name.get(name).map(|&i| self.records[i].address)
    }

    pub fn name_of(&self, address: Address) -> Option<&str> {
        self.by_address
            .get(&address)
            .map(|&i| self.records[i].name.as_str())
    }

    #[inline]
    pub fn contains(&self, address: Address) -> bool {
        self.by_address.contains_key(&address)
    }

    /// Records in table order.
    pub fn records(&self) -> &[ComponentRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for ComponentTable {
    /// Renders the table back into its textual form (without comments).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rec in &self.records {
            writeln!(f, "{} {}", rec.address, rec.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
// id  name
0 Dispatcher

1 Glados
   110   TerminalManager
// trailing comment
";

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let t = ComponentTable::parse(SAMPLE).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.address_of("TerminalManager"), Some(Address::new(110)));
        assert_eq!(t.name_of(Address::new(1)), Some("Glados"));
        assert_eq!(t.records()[0].name, "Dispatcher");
    }

    #[test]
    fn test_malformed_lines_report_line_number() {
        let cases = [
            ("1 Alpha\nBeta\n", 2, "expected `<address> <name>`"),
            ("x1 Alpha\n", 1, "address is not an integer"),
            ("-3 Alpha\n", 1, "address is negative"),
            ("1 Alpha\n2 Alpha\n", 2, "duplicate name"),
            ("1 Alpha\n1 Beta\n", 2, "duplicate address"),
            ("1 Alpha Beta\n", 1, "trailing text after name"),
        ];
        for (src, want_line, want_reason) in cases {
            match ComponentTable::parse(src) {
                Err(LoadError::Malformed { line, reason, .. }) => {
                    assert_eq!((line, reason), (want_line, want_reason), "source {src:?}");
                }
                other => panic!("expected malformed for {src:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_round_trip_lookups() {
        let pairs = [(1, "Alpha"), (12, "Beta"), (3, "Gamma"), (405, "Delta")];
        let src: String = pairs.iter().map(|(a, n)| format!("{a} {n}\n")).collect();
        let t = ComponentTable::parse(&src).unwrap();

        for (addr, name) in pairs {
            assert_eq!(t.address_of(name), Some(Address::new(addr)));
            assert_eq!(t.name_of(Address::new(addr)), Some(name));
        }
        assert_eq!(t.to_string(), src);
    }

    #[test]
    fn test_from_records_validates() {
        let ok = ComponentTable::from_records([
            ComponentRecord::new("Alpha", Address::new(1)),
            ComponentRecord::new("Beta", Address::new(12)),
        ])
        .unwrap();
        assert!(ok.contains(Address::new(12)));

        let dup = ComponentTable::from_records([
            ComponentRecord::new("Alpha", Address::new(1)),
            ComponentRecord::new("Beta", Address::new(1)),
        ]);
        assert!(matches!(dup, Err(LoadError::Malformed { line: 2, .. })));
    }
}
