//! # Component addresses and digit-prefix spans.
//!
//! Every router in the tree is reachable through a numeric [`Address`]. The
//! decimal digits of an address describe a path through the tree: each level
//! owns a fixed number of digits, starting where its parent's digits end.
//!
//! ```text
//!  address 110  =  "1"   "10"
//!                   │      └─ level 1 (offset 1, width 2): TerminalManager
//!                   └──────── level 0 (offset 0, width 1): Glados
//! ```
//!
//! The values themselves come from the component table; a [`DigitSpan`] only
//! says which digits a node compares when deciding whether a target lies in
//! its subtree. Matching is integer arithmetic on the leading digits, so a
//! table that changes digit lengths between generations cannot produce
//! out-of-range slicing.
//!
//! ## Rules
//! - `-1` ([`Address::UNASSIGNED`]) means "not resolved yet"; every negative
//!   value is treated as unassigned.
//! - `0` has exactly one digit.
//! - A target shorter than the compared prefix never matches.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Numeric, hierarchically structured component address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(i64);

impl Address {
    /// Sentinel for a component whose address has not been resolved.
    pub const UNASSIGNED: Address = Address(-1);

    /// Wraps a raw address value.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// True for every non-negative address.
    #[inline]
    pub const fn is_assigned(self) -> bool {
        self.0 >= 0
    }

    /// Number of decimal digits, `None` for unassigned addresses.
    pub fn digit_count(self) -> Option<u32> {
        if !self.is_assigned() {
            return None;
        }
        Some(self.0.checked_ilog10().map_or(1, |d| d + 1))
    }

    /// Leading `len` digits as an integer.
    ///
    /// Returns `None` if the address is unassigned or has fewer than `len`
    /// digits. `prefix(0)` is `Some(0)` for every assigned address.
    pub fn prefix(self, len: u32) -> Option<i64> {
        let digits = self.digit_count()?;
        if len > digits {
            return None;
        }
        Some(self.0 / 10_i64.pow(digits - len))
    }

    /// Digits selected by `span`, e.g. `110.digits_at(offset 1, width 2) == 10`.
    pub fn digits_at(self, span: DigitSpan) -> Option<i64> {
        self.prefix(span.end())
            .map(|p| p % 10_i64.pow(span.width))
    }

    /// True iff `self` lies in the subtree owned by `owner` at `span`.
    ///
    /// Both addresses must agree on every digit up to the end of `span`.
    pub fn within(self, owner: Address, span: DigitSpan) -> bool {
        let end = span.end();
        match (self.prefix(end), owner.prefix(end)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl From<i64> for Address {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl FromStr for Address {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Digits owned by one level of the router tree.
///
/// `offset` is the number of digits consumed by all ancestors, `width` the
/// number of digits this level adds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DigitSpan {
    pub offset: u32,
    pub width: u32,
}

impl DigitSpan {
    /// Span of the root: owns no digits, contains every assigned address.
    pub const ROOT: DigitSpan = DigitSpan { offset: 0, width: 0 };

    #[inline]
    pub const fn new(offset: u32, width: u32) -> Self {
        Self { offset, width }
    }

    /// Span of a child level that adds `width` digits below `self`.
    #[inline]
    pub const fn child(self, width: u32) -> Self {
        Self {
            offset: self.end(),
            width,
        }
    }

    /// Index one past the last digit owned by this span.
    #[inline]
    pub const fn end(self) -> u32 {
        self.offset + self.width
    }
}
