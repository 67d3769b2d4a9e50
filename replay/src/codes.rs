//! Display-code allocation for lot instances.
//!
//! Codes are issued per lot group. The first code of a group is seeded from the
//! sub-lot ordinal: sub-lot 0 starts at `0000`, sub-lot `n > 0` starts at `n * 1000`, so
//! later sub-lots never collide with the first sub-lot's `0000`-`0999` band. Every
//! further code is the previous value plus one.
//!
//! ```
//! use specimen_ledger_core::LotGroupKey;
//! use specimen_ledger_replay::codes::CodeGenerator;
//!
//! let mut codes = CodeGenerator::new();
//! assert_eq!(codes.next(&LotGroupKey::new("2", 0)), "0000");
//! assert_eq!(codes.next(&LotGroupKey::new("2", 0)), "0001");
//! assert_eq!(codes.next(&LotGroupKey::new("2", 1)), "1000");
//! ```

use specimen_ledger_core::LotGroupKey;
use std::collections::HashMap;

/// Width of the band reserved for each sub-lot
const SUB_LOT_BAND: u64 = 1000;

/// Per-group display-code allocator.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    issued: HashMap<LotGroupKey, Vec<u64>>,
}

impl CodeGenerator {
    /// Creates an allocator with no codes issued
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next code for `key`
    pub fn next(&mut self, key: &LotGroupKey) -> String {
        let issued = self.issued.entry(key.clone()).or_default();
        let value = match issued.last() {
            Some(last) => last + 1,
            None => u64::from(key.sub_lot) * SUB_LOT_BAND,
        };
        issued.push(value);
        format_code(value)
    }

    /// Codes issued for `key`, in issuance order
    #[must_use]
    pub fn issued(&self, key: &LotGroupKey) -> Vec<String> {
        self.issued
            .get(key)
            .map(|values| values.iter().copied().map(format_code).collect())
            .unwrap_or_default()
    }

    /// Number of codes issued for `key`
    #[must_use]
    pub fn issued_count(&self, key: &LotGroupKey) -> usize {
        self.issued.get(key).map_or(0, Vec::len)
    }
}

/// Renders a code value: zero-padded to four digits below 1000, plain decimal above.
#[must_use]
pub fn format_code(value: u64) -> String {
    if value < SUB_LOT_BAND {
        format!("{value:04}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_and_increments() {
        let mut codes = CodeGenerator::new();
        let first = LotGroupKey::new("2", 0);
        let second = LotGroupKey::new("2", 1);
        let third = LotGroupKey::new("2", 2);

        assert_eq!(codes.next(&first), "0000");
        assert_eq!(codes.next(&first), "0001");
        assert_eq!(codes.next(&first), "0002");
        assert_eq!(codes.next(&second), "1000");
        assert_eq!(codes.next(&second), "1001");
        assert_eq!(codes.next(&third), "2000");
        assert_eq!(codes.next(&third), "2001");
    }

    #[test]
    fn long_runs_keep_counting() {
        let mut codes = CodeGenerator::new();
        let key = LotGroupKey::new("2", 3);
        for _ in 0..12 {
            codes.next(&key);
        }
        assert_eq!(codes.next(&key), "3012");
        assert_eq!(codes.issued_count(&key), 13);
    }

    #[test]
    fn first_band_crosses_into_plain_decimal() {
        let mut codes = CodeGenerator::new();
        let key = LotGroupKey::new("7", 0);
        for _ in 0..999 {
            codes.next(&key);
        }
        assert_eq!(codes.next(&key), "0999");
        assert_eq!(codes.next(&key), "1000");
    }

    #[test]
    fn groups_are_independent() {
        let mut codes = CodeGenerator::new();
        codes.next(&LotGroupKey::new("a", 0));
        assert_eq!(codes.next(&LotGroupKey::new("b", 0)), "0000");
        assert_eq!(codes.issued(&LotGroupKey::new("a", 0)), vec!["0000"]);
        assert!(codes.issued(&LotGroupKey::new("c", 0)).is_empty());
    }

    #[test]
    fn formatting() {
        assert_eq!(format_code(0), "0000");
        assert_eq!(format_code(42), "0042");
        assert_eq!(format_code(1000), "1000");
        assert_eq!(format_code(12_345), "12345");
    }
}
