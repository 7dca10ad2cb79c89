//! Car application use-case service.
//!
//! # Responsibility
//! - Validate a submitted application form.
//! - Delegate the transactional catalog write to `CatalogRepository`.
//! - Map repository outcomes to a user-facing result envelope.
//!
//! # Invariants
//! - Invalid forms never reach storage.
//! - `is_new_car` and `is_range_added` are mutually exclusive and both false
//!   on failure.
//! - Only unexpected storage failures are returned as `Err`.

use crate::config::CatalogConfig;
use crate::model::car::{CarApplicationForm, CarCatalogEntry};
use crate::model::year_range::RangeDiff;
use crate::repo::catalog_repo::{ApplyOutcome, CatalogRepoError, CatalogRepository, RejectReason};
use crate::repo::catalog_store::{CatalogStore, StoreError};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MSG_CREATED: &str = "new car entry created";
const MSG_RANGE_ADDED: &str = "year range added";
const MSG_NAMES_REQUIRED: &str = "maker name and model name are required";
const MSG_MONTH_OUT_OF_RANGE: &str = "months must be between 1 and 12";
const MSG_START_AFTER_END: &str = "invalid year range: start after end";
const MSG_DUPLICATE: &str = "this car and year range are already registered";
const MSG_STORAGE_UNAVAILABLE: &str = "catalog is busy; please submit again";
const MSG_STORAGE_FAILED: &str = "failed to process car application";

/// Machine-readable failure category of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ValidationError,
    DuplicateRange,
    InvalidRange,
    StorageUnavailable,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::DuplicateRange => "duplicate_range",
            Self::InvalidRange => "invalid_range",
            Self::StorageUnavailable => "storage_unavailable",
        }
    }
}

/// Result envelope returned to form callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarApplicationResult {
    pub success: bool,
    pub message: String,
    /// Resulting entry; `None` on failure.
    pub car: Option<CarCatalogEntry>,
    pub is_new_car: bool,
    pub is_range_added: bool,
    /// Set exactly when `success` is false.
    pub failure: Option<FailureKind>,
}

impl CarApplicationResult {
    fn succeeded(message: &str, car: CarCatalogEntry, is_new_car: bool) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            car: Some(car),
            is_new_car,
            is_range_added: !is_new_car,
            failure: None,
        }
    }

    fn failed(kind: FailureKind, message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            car: None,
            is_new_car: false,
            is_range_added: false,
            failure: Some(kind),
        }
    }

    /// Renders an unexpected storage error as a generic, retryable failure.
    pub fn from_error(err: &ApplicationError) -> Self {
        match err {
            ApplicationError::StorageUnavailable { .. } => {
                Self::failed(FailureKind::StorageUnavailable, MSG_STORAGE_UNAVAILABLE)
            }
            ApplicationError::Storage(_) => {
                Self::failed(FailureKind::StorageUnavailable, MSG_STORAGE_FAILED)
            }
        }
    }
}

/// Unexpected storage failures while processing an application.
#[derive(Debug)]
pub enum ApplicationError {
    /// Optimistic retries were exhausted; safe to resubmit.
    StorageUnavailable { attempts: u32 },
    Storage(StoreError),
}

impl Display for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable { attempts } => {
                write!(f, "catalog storage unavailable after {attempts} attempts")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ApplicationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable { .. } => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<CatalogRepoError> for ApplicationError {
    fn from(value: CatalogRepoError) -> Self {
        match value {
            CatalogRepoError::StorageUnavailable { attempts } => {
                Self::StorageUnavailable { attempts }
            }
            CatalogRepoError::Store(err) => Self::Storage(err),
        }
    }
}

/// Entry point for catalog applications.
pub struct ApplicationService<S: CatalogStore> {
    repo: CatalogRepository<S>,
}

impl<S: CatalogStore> ApplicationService<S> {
    /// Creates a service over `store` with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_repository(CatalogRepository::new(store))
    }

    pub fn from_config(store: S, config: &CatalogConfig) -> Self {
        Self::with_repository(CatalogRepository::from_config(store, config))
    }

    pub fn with_repository(repo: CatalogRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &CatalogRepository<S> {
        &self.repo
    }

    /// Validates and applies one car application.
    ///
    /// # Contract
    /// - Blank maker/model, months outside `1..=12`, or start after end yield
    ///   `FailureKind::ValidationError` without any storage call.
    /// - Duplicate ranges yield `FailureKind::DuplicateRange`, nothing written.
    ///
    /// # Errors
    /// Returns `ApplicationError` only for storage failures.
    pub fn process_car_application(
        &self,
        form: &CarApplicationForm,
    ) -> Result<CarApplicationResult, ApplicationError> {
        if let Some(message) = validate_submission(form) {
            info!(
                "event=car_application module=service status={} reason=\"{}\"",
                FailureKind::ValidationError.as_str(),
                message
            );
            return Ok(CarApplicationResult::failed(
                FailureKind::ValidationError,
                message,
            ));
        }

        let outcome = self
            .repo
            .apply(&form.maker_name, &form.model_name, form.year_range())
            .map_err(|err| {
                error!(
                    "event=car_application module=service status=storage_error error={}",
                    err
                );
                ApplicationError::from(err)
            })?;

        let result = match outcome {
            ApplyOutcome::Created(entry) => {
                CarApplicationResult::succeeded(MSG_CREATED, entry, true)
            }
            ApplyOutcome::RangeAdded { entry, diff } => {
                log_range_audit(&entry, &diff);
                CarApplicationResult::succeeded(MSG_RANGE_ADDED, entry, false)
            }
            ApplyOutcome::Rejected(RejectReason::DuplicateRange) => {
                CarApplicationResult::failed(FailureKind::DuplicateRange, MSG_DUPLICATE)
            }
            ApplyOutcome::Rejected(RejectReason::InvalidRange) => {
                CarApplicationResult::failed(FailureKind::InvalidRange, MSG_START_AFTER_END)
            }
        };

        info!(
            "event=car_application module=service status={}",
            result.failure.map_or("ok", FailureKind::as_str)
        );
        Ok(result)
    }
}

fn validate_submission(form: &CarApplicationForm) -> Option<&'static str> {
    if form.maker_name.trim().is_empty() || form.model_name.trim().is_empty() {
        return Some(MSG_NAMES_REQUIRED);
    }
    let range = form.year_range();
    if !range.has_calendar_months() {
        return Some(MSG_MONTH_OUT_OF_RANGE);
    }
    if !range.is_valid() {
        return Some(MSG_START_AFTER_END);
    }
    None
}

fn log_range_audit(entry: &CarCatalogEntry, diff: &RangeDiff) {
    info!(
        "event=range_audit module=service normalized_name={} added={} removed={} ranges={} is_incomplete={}",
        entry.normalized_name,
        diff.added.len(),
        diff.removed.len(),
        entry.ranges.len(),
        entry.is_incomplete
    );
}
