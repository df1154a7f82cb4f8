//! Route ranks.

use crate::error::ConfigError;
use std::{fmt, num::NonZeroU8};

/// Priority of a set of routes, from 1 (probed first) to 255.
///
/// Every rank owns its own trie; a subject is served by the lowest rank
/// whose trie matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(NonZeroU8);

impl Rank {
    /// The highest priority.
    pub const MIN: Rank = Rank(NonZeroU8::MIN);
    /// The lowest priority.
    pub const MAX: Rank = Rank(NonZeroU8::MAX);

    /// Validate a caller-supplied rank.
    pub fn new(rank: u32) -> Result<Self, ConfigError> {
        u8::try_from(rank)
            .ok()
            .and_then(NonZeroU8::new)
            .map(Rank)
            .ok_or(ConfigError::InvalidRank(rank))
    }

    /// The rank as an integer.
    pub const fn get(self) -> u8 {
        self.0.get()
    }
}

impl TryFrom<u32> for Rank {
    type Error = ConfigError;

    fn try_from(rank: u32) -> Result<Self, Self::Error> {
        Rank::new(rank)
    }
}

impl From<Rank> for u32 {
    fn from(rank: Rank) -> Self {
        u32::from(rank.get())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(Rank::new(1).unwrap(), Rank::MIN);
        assert_eq!(Rank::new(255).unwrap(), Rank::MAX);
        assert_eq!(Rank::new(0), Err(ConfigError::InvalidRank(0)));
        assert_eq!(Rank::new(256), Err(ConfigError::InvalidRank(256)));
        assert_eq!(Rank::new(u32::MAX), Err(ConfigError::InvalidRank(u32::MAX)));
    }

    #[test]
    fn test_ordering_and_display() {
        let low = Rank::new(2).unwrap();
        let high = Rank::new(10).unwrap();
        assert!(low < high);
        assert_eq!(high.to_string(), "10");
        assert_eq!(u32::from(high), 10);
    }
}
