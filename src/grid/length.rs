// 7.1: named relative distances. their percent comes from outside (volatility based),
// the grid only needs the lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthAlias {
    VeryShort,
    Short,
    Standard,
    Long,
    VeryLong,
    DoubleLong,
}

impl LengthAlias {
    pub const ALL: [LengthAlias; 6] = [
        LengthAlias::VeryShort,
        LengthAlias::Short,
        LengthAlias::Standard,
        LengthAlias::Long,
        LengthAlias::VeryLong,
        LengthAlias::DoubleLong,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LengthAlias::VeryShort => "very-short",
            LengthAlias::Short => "short",
            LengthAlias::Standard => "standard",
            LengthAlias::Long => "long",
            LengthAlias::VeryLong => "very-long",
            LengthAlias::DoubleLong => "double-long",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Longest alias that `input` starts with, not followed by another letter.
    pub(crate) fn match_prefix(input: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|a| {
                input.starts_with(a.name())
                    && !input[a.name().len()..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_alphabetic())
            })
            .max_by_key(|a| a.name().len())
    }
}

impl fmt::Display for LengthAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves an alias to a percent.
pub trait LengthProvider {
    fn percent(&self, alias: LengthAlias) -> Option<Decimal>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthMap {
    values: HashMap<LengthAlias, Decimal>,
}

impl LengthMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, alias: LengthAlias, percent: Decimal) -> Self {
        self.values.insert(alias, percent);
        self
    }

    pub fn set(&mut self, alias: LengthAlias, percent: Decimal) {
        self.values.insert(alias, percent);
    }
}

impl LengthProvider for LengthMap {
    fn percent(&self, alias: LengthAlias) -> Option<Decimal> {
        self.values.get(&alias).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn names_round_trip() {
        for alias in LengthAlias::ALL {
            assert_eq!(LengthAlias::from_name(alias.name()), Some(alias));
        }
        assert_eq!(LengthAlias::from_name("medium"), None);
    }

    #[test]
    fn prefix_match_is_longest_and_word_bounded() {
        assert_eq!(LengthAlias::match_prefix("long-very-short"), Some(LengthAlias::Long));
        assert_eq!(LengthAlias::match_prefix("very-long+1%"), Some(LengthAlias::VeryLong));
        assert_eq!(LengthAlias::match_prefix("double-long"), Some(LengthAlias::DoubleLong));
        assert_eq!(LengthAlias::match_prefix("shorter"), None);
        assert_eq!(LengthAlias::match_prefix("very"), None);
    }

    #[test]
    fn map_lookup() {
        let map = LengthMap::new().with(LengthAlias::Short, dec!(60));
        assert_eq!(map.percent(LengthAlias::Short), Some(dec!(60)));
        assert_eq!(map.percent(LengthAlias::Long), None);
    }
}
