//! Transactional catalog application: read, plan, conditional write.
//!
//! # Responsibility
//! - Resolve a (maker, model, range) application to its canonical entry.
//! - Reject exact duplicate ranges and inverted ranges.
//! - Merge ranges, regenerate aliases, recompute completeness, and commit
//!   the whole document atomically.
//!
//! # Invariants
//! - `plan_application` is pure; the retry loop may run it any number of times.
//! - A conflicting concurrent write always causes a fresh re-read before the
//!   next attempt.
//! - Attempts are bounded by `max_attempts`; exhaustion surfaces as
//!   `CatalogRepoError::StorageUnavailable`.

use crate::config::CatalogConfig;
use crate::model::car::CarCatalogEntry;
use crate::model::year_range::{add_range, diff, has_gaps, RangeDiff, YearRange};
use crate::normalize::alias::generate_aliases;
use crate::normalize::name::normalize_car_name;
use crate::repo::catalog_store::{CatalogStore, StoreError, StoredEntry, WriteOutcome};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CatalogRepoResult<T> = Result<T, CatalogRepoError>;

/// Unexpected failures of a catalog application.
#[derive(Debug)]
pub enum CatalogRepoError {
    /// Every attempt lost to a concurrent writer.
    StorageUnavailable { attempts: u32 },
    /// Storage failed for a reason other than contention.
    Store(StoreError),
}

impl Display for CatalogRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable { attempts } => write!(
                f,
                "catalog storage unavailable after {attempts} conflicting attempts"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for CatalogRepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Business reasons for refusing an application without writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The exact range is already stored on the resolved entry.
    DuplicateRange,
    /// The range starts after it ends.
    InvalidRange,
}

impl RejectReason {
    /// Stable machine-readable code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateRange => "duplicate_range",
            Self::InvalidRange => "invalid_range",
        }
    }
}

/// Committed (or refused) result of one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new entry was inserted.
    Created(CarCatalogEntry),
    /// The range was merged into an existing entry.
    RangeAdded {
        entry: CarCatalogEntry,
        /// Exact-match change set between the old and new range lists.
        diff: RangeDiff,
    },
    /// Nothing was written.
    Rejected(RejectReason),
}

/// One catalog application as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyRequest {
    pub maker_name: String,
    pub model_name: String,
    pub range: YearRange,
}

impl ApplyRequest {
    pub fn new(
        maker_name: impl Into<String>,
        model_name: impl Into<String>,
        range: YearRange,
    ) -> Self {
        Self {
            maker_name: maker_name.into(),
            model_name: model_name.into(),
            range,
        }
    }
}

/// Write the transaction body decided to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyPlan {
    Insert(CarCatalogEntry),
    Update {
        entry: CarCatalogEntry,
        expected_revision: i64,
        diff: RangeDiff,
    },
    Reject(RejectReason),
}

/// Calendar months and start <= end.
fn is_acceptable(range: YearRange) -> bool {
    range.has_calendar_months() && range.is_valid()
}

/// Decides the write for `request` given the current stored document.
///
/// Pure: depends only on its arguments.
pub fn plan_application(current: Option<&StoredEntry>, request: &ApplyRequest) -> ApplyPlan {
    if !is_acceptable(request.range) {
        return ApplyPlan::Reject(RejectReason::InvalidRange);
    }

    let Some(stored) = current else {
        let identity = normalize_car_name(&request.maker_name, &request.model_name);
        return ApplyPlan::Insert(CarCatalogEntry {
            normalized_name: identity.normalized_name,
            display_name: identity.display_name,
            maker_name: identity.maker_name,
            aliases: generate_aliases(&request.maker_name, &request.model_name),
            ranges: vec![request.range],
            is_incomplete: true,
            created_at: 0,
            updated_at: 0,
        });
    };

    if stored.entry.contains_range(&request.range) {
        return ApplyPlan::Reject(RejectReason::DuplicateRange);
    }

    let ranges = add_range(&stored.entry.ranges, request.range);
    let changes = diff(&stored.entry.ranges, &ranges);
    let mut entry = stored.entry.clone();
    entry.aliases = generate_aliases(&entry.maker_name, entry.model_name());
    entry.is_incomplete = has_gaps(&ranges);
    entry.ranges = ranges;

    ApplyPlan::Update {
        entry,
        expected_revision: stored.revision,
        diff: changes,
    }
}

/// Catalog write path with bounded optimistic retries.
pub struct CatalogRepository<S: CatalogStore> {
    store: S,
    max_attempts: u32,
}

impl<S: CatalogStore> CatalogRepository<S> {
    /// Creates a repository with the default retry budget.
    pub fn new(store: S) -> Self {
        Self::from_config(store, &CatalogConfig::default())
    }

    /// Creates a repository using `config.max_transaction_attempts`.
    pub fn from_config(store: S, config: &CatalogConfig) -> Self {
        Self {
            store,
            max_attempts: config.max_transaction_attempts.max(1),
        }
    }

    /// Underlying store, for read-side queries.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Attempts `apply` makes before giving up; never below 1.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Applies one (maker, model, range) submission atomically.
    ///
    /// # Errors
    /// - `StorageUnavailable` when every attempt conflicted.
    /// - `Store` for any non-contention storage failure.
    pub fn apply(
        &self,
        maker_name: &str,
        model_name: &str,
        range: YearRange,
    ) -> CatalogRepoResult<ApplyOutcome> {
        let started_at = Instant::now();
        let request = ApplyRequest::new(maker_name, model_name, range);
        let normalized_name = normalize_car_name(maker_name, model_name).normalized_name;

        if !is_acceptable(range) {
            info!(
                "event=catalog_apply module=repo status=rejected reason={} normalized_name={}",
                RejectReason::InvalidRange.as_str(),
                normalized_name
            );
            return Ok(ApplyOutcome::Rejected(RejectReason::InvalidRange));
        }

        let max_attempts = self.max_attempts();
        for attempt in 1..=max_attempts {
            let current = match self.store.get_entry(&normalized_name) {
                Ok(current) => current,
                Err(err) if err.is_contention() => {
                    log_conflict(&normalized_name, attempt);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let (write, changes) = match plan_application(current.as_ref(), &request) {
                ApplyPlan::Reject(reason) => {
                    info!(
                        "event=catalog_apply module=repo status=rejected reason={} normalized_name={} attempt={}",
                        reason.as_str(),
                        normalized_name,
                        attempt
                    );
                    return Ok(ApplyOutcome::Rejected(reason));
                }
                ApplyPlan::Insert(entry) => (self.store.insert_entry(&entry)?, None),
                ApplyPlan::Update {
                    entry,
                    expected_revision,
                    diff,
                } => (
                    self.store.update_entry(&entry, expected_revision)?,
                    Some(diff),
                ),
            };

            match write {
                WriteOutcome::Committed(stored) => {
                    let outcome = match changes {
                        None => ApplyOutcome::Created(stored.entry),
                        Some(diff) => ApplyOutcome::RangeAdded {
                            entry: stored.entry,
                            diff,
                        },
                    };
                    info!(
                        "event=catalog_apply module=repo status={} normalized_name={} attempt={} revision={} duration_ms={}",
                        outcome_status(&outcome),
                        normalized_name,
                        attempt,
                        stored.revision,
                        started_at.elapsed().as_millis()
                    );
                    return Ok(outcome);
                }
                WriteOutcome::Conflict => log_conflict(&normalized_name, attempt),
            }
        }

        error!(
            "event=catalog_apply module=repo status=exhausted normalized_name={} attempts={} duration_ms={}",
            normalized_name,
            max_attempts,
            started_at.elapsed().as_millis()
        );
        Err(CatalogRepoError::StorageUnavailable {
            attempts: max_attempts,
        })
    }
}

fn log_conflict(normalized_name: &str, attempt: u32) {
    warn!(
        "event=catalog_apply module=repo status=conflict normalized_name={normalized_name} attempt={attempt}"
    );
}

fn outcome_status(outcome: &ApplyOutcome) -> &'static str {
    match outcome {
        ApplyOutcome::Created(_) => "created",
        ApplyOutcome::RangeAdded { .. } => "range_added",
        ApplyOutcome::Rejected(_) => "rejected",
    }
}
