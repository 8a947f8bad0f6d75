//! Level tiers derived from lifetime earned points.
//!
//! A level is a pure function of `total_points` against fixed breakpoints. Nothing here touches
//! the database; the ledger stores the label next to the balance it was computed from.

use crate::errors::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A student's tier, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// 0 – 999 lifetime points
    Seed,
    /// 1,000 – 2,999
    Sprout,
    /// 3,000 – 4,999
    Tree,
    /// 5,000 – 29,999
    BigTree,
    /// 30,000 – 49,999
    Star,
    /// 50,000 and up
    Diamond,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Self; 6] = [
        Self::Seed,
        Self::Sprout,
        Self::Tree,
        Self::BigTree,
        Self::Star,
        Self::Diamond,
    ];

    /// Minimum lifetime points needed to reach this level.
    #[must_use]
    pub const fn threshold(self) -> i64 {
        match self {
            Self::Seed => 0,
            Self::Sprout => 1_000,
            Self::Tree => 3_000,
            Self::BigTree => 5_000,
            Self::Star => 30_000,
            Self::Diamond => 50_000,
        }
    }

    /// Returns the level for a lifetime point total. Negative totals map to [`Level::Seed`].
    #[must_use]
    pub fn from_total_points(total_points: i64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| total_points >= level.threshold())
            .unwrap_or(Self::Seed)
    }

    /// The level after this one, or `None` at the top.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Seed => Some(Self::Sprout),
            Self::Sprout => Some(Self::Tree),
            Self::Tree => Some(Self::BigTree),
            Self::BigTree => Some(Self::Star),
            Self::Star => Some(Self::Diamond),
            Self::Diamond => None,
        }
    }

    /// Stored label for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Sprout => "sprout",
            Self::Tree => "tree",
            Self::BigTree => "big-tree",
            Self::Star => "star",
            Self::Diamond => "diamond",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| Error::Config {
                message: format!("Unknown level '{s}'"),
            })
    }
}

/// Points still needed to reach the next level, or `None` at [`Level::Diamond`].
#[must_use]
pub fn points_to_next_level(total_points: i64) -> Option<i64> {
    Level::from_total_points(total_points)
        .next()
        .map(|next| next.threshold() - total_points.max(0))
}
