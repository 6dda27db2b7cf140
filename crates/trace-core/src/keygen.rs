//! Sequential `PV<n>` key generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prefix shared by every curve key.
pub const KEY_PREFIX: &str = "PV";

/// Symbolic key of a curve (`PV1`, `PV2`, ...).
///
/// Keys order by their numeric suffix, which is also issuance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurveKey(u64);

impl CurveKey {
    /// Numeric suffix of the key.
    pub fn number(self) -> u64 {
        self.0
    }

    /// Parse a key from its exact canonical spelling.
    ///
    /// `PV01`, `pv1` and `PV0` are not keys.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix(KEY_PREFIX)?;
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        digits.parse().ok().map(CurveKey)
    }

    #[cfg(test)]
    pub(crate) fn new(n: u64) -> Self {
        CurveKey(n)
    }
}

impl fmt::Display for CurveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", KEY_PREFIX, self.0)
    }
}

impl FromStr for CurveKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurveKey::parse(s).ok_or_else(|| format!("'{}' is not a curve key (expected PV<n>)", s))
    }
}

impl Serialize for CurveKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurveKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Issues curve keys from a monotonic counter.
///
/// The counter never goes backwards: a key that was handed out is never
/// handed out again, even if the curve it named is deleted or its creation
/// failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyGenerator {
    next: u64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Resume from a saved counter value (clamped to at least 1).
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    /// Issue the next key.
    pub fn next_key(&mut self) -> CurveKey {
        let key = CurveKey(self.next);
        self.next += 1;
        key
    }

    /// The key the next call to [`next_key`](Self::next_key) will return.
    pub fn peek(&self) -> CurveKey {
        CurveKey(self.next)
    }

    /// Ensure the counter is past `key` (used when restoring saved curves).
    pub fn advance_past(&mut self, key: CurveKey) {
        self.next = self.next.max(key.0 + 1);
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
