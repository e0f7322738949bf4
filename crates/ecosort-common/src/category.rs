//! Waste categories.
//!
//! Every trash item and every bin carries exactly one category, fixed when the
//! entity is spawned. A deposit is correct when both categories match.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CategoryParseError;

/// Waste category of a trash item or bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Food scraps and other compostable waste
    Organic,
    /// Plastic, glass, paper and metal
    Recyclable,
    /// Everything else
    General,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 3] = [Self::Organic, Self::Recyclable, Self::General];

    /// Lowercase name shown on the HUD.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::Recyclable => "recyclable",
            Self::General => "general",
        }
    }

    /// Stable index into per-category tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Organic => 0,
            Self::Recyclable => 1,
            Self::General => 2,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CategoryParseError(trimmed.to_string()))
    }
}
