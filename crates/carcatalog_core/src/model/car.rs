//! Car catalog domain model.
//!
//! # Responsibility
//! - Define the canonical catalog document shared by every write and read path.
//! - Define the application form submitted by users.
//!
//! # Invariants
//! - `normalized_name` is the document key and never changes.
//! - `ranges` is sorted, non-empty, and contains no overlapping or adjacent pair.
//! - `created_at`/`updated_at` are assigned by storage; values on drafts are ignored.

use crate::model::year_range::YearRange;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical vehicle model known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarCatalogEntry {
    /// Canonical identity (`MAKER_MODEL`), also the storage key.
    pub normalized_name: String,
    /// Verbatim `"<maker> <model>"` from the first submission.
    pub display_name: String,
    /// Verbatim maker from the first submission.
    pub maker_name: String,
    /// Search variants, sorted and deduplicated.
    pub aliases: Vec<String>,
    /// Known production spans.
    pub ranges: Vec<YearRange>,
    /// Derived completeness flag, recomputed on every write.
    pub is_incomplete: bool,
    /// Epoch ms, storage-assigned.
    pub created_at: i64,
    /// Epoch ms, storage-assigned.
    pub updated_at: i64,
}

impl CarCatalogEntry {
    /// Document id; identical to `normalized_name`.
    pub fn id(&self) -> &str {
        &self.normalized_name
    }

    /// Model part of `display_name` (the `"<maker> "` prefix removed).
    pub fn model_name(&self) -> &str {
        let prefix_len = self.maker_name.len() + 1;
        if self.display_name.len() >= prefix_len
            && self.display_name.starts_with(self.maker_name.as_str())
            && self.display_name[self.maker_name.len()..].starts_with(' ')
        {
            &self.display_name[prefix_len..]
        } else {
            &self.display_name
        }
    }

    /// Returns whether `range` is stored verbatim on this entry.
    pub fn contains_range(&self, range: &YearRange) -> bool {
        self.ranges.contains(range)
    }

    /// Validates document-level invariants before persistence.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.normalized_name.trim().is_empty() {
            return Err(EntryValidationError::EmptyIdentity);
        }
        if self.ranges.is_empty() {
            return Err(EntryValidationError::NoRanges);
        }
        if let Some(range) = self.ranges.iter().find(|range| !range.has_calendar_months()) {
            return Err(EntryValidationError::MonthOutOfRange(*range));
        }
        if let Some(range) = self.ranges.iter().find(|range| !range.is_valid()) {
            return Err(EntryValidationError::InvalidRange(*range));
        }
        for pair in self.ranges.windows(2) {
            if pair[1].start_index() - pair[0].end_index() < 2 {
                return Err(EntryValidationError::RangesNotNormalized {
                    first: pair[0],
                    second: pair[1],
                });
            }
        }
        Ok(())
    }
}

/// Validation failures for catalog documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyIdentity,
    NoRanges,
    /// A start or end month outside `1..=12`.
    MonthOutOfRange(YearRange),
    InvalidRange(YearRange),
    /// Consecutive ranges are unsorted, overlapping, or adjacent.
    RangesNotNormalized {
        first: YearRange,
        second: YearRange,
    },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentity => write!(f, "catalog entry identity cannot be empty"),
            Self::NoRanges => write!(f, "catalog entry must hold at least one year range"),
            Self::MonthOutOfRange(range) => write!(
                f,
                "year range {}-{}~{}-{} has a month outside 1..=12",
                range.start_year, range.start_month, range.end_year, range.end_month
            ),
            Self::InvalidRange(range) => write!(f, "year range {range} starts after it ends"),
            Self::RangesNotNormalized { first, second } => write!(
                f,
                "year ranges {first} and {second} are not sorted and separated"
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// User-submitted "maker + model + production span" application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarApplicationForm {
    pub maker_name: String,
    pub model_name: String,
    pub start_year: i32,
    pub start_month: i32,
    pub end_year: i32,
    pub end_month: i32,
}

impl CarApplicationForm {
    /// Submitted production span.
    pub fn year_range(&self) -> YearRange {
        YearRange::new(
            self.start_year,
            self.start_month,
            self.end_year,
            self.end_month,
        )
    }
}
