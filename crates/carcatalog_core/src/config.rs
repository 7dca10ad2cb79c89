//! Catalog runtime configuration.
//!
//! # Responsibility
//! - Hold tunables for transaction retries, query limits and form validation.
//! - Provide defaults so embedding apps only override what they need.
//!
//! # Invariants
//! - A validated config has a non-zero retry budget and non-zero limits.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_MAX_TRANSACTION_ATTEMPTS: u32 = 5;
const DEFAULT_SEARCH_LIMIT: u32 = 20;
const DEFAULT_INCOMPLETE_LIMIT: u32 = 50;
const DEFAULT_MIN_YEAR: i32 = 1900;
const DEFAULT_MAX_YEARS_AHEAD: i32 = 2;
const DEFAULT_MIN_NAME_CHARS: usize = 2;
const DEFAULT_MAX_NAME_CHARS: usize = 50;
const DEFAULT_LONG_RANGE_WARNING_MONTHS: i64 = 120;

/// Tunables for catalog services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Optimistic write attempts before reporting storage unavailable.
    pub max_transaction_attempts: u32,
    /// Upper bound for `search_cars` hits.
    pub search_limit: u32,
    /// Upper bound for `incomplete_cars` rows.
    pub incomplete_limit: u32,
    /// Earliest accepted production year in form validation.
    pub min_year: i32,
    /// Accepted years past the current year in form validation.
    pub max_years_ahead: i32,
    pub min_name_chars: usize,
    pub max_name_chars: usize,
    /// Spans longer than this produce a form warning.
    pub long_range_warning_months: i64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_transaction_attempts: DEFAULT_MAX_TRANSACTION_ATTEMPTS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            incomplete_limit: DEFAULT_INCOMPLETE_LIMIT,
            min_year: DEFAULT_MIN_YEAR,
            max_years_ahead: DEFAULT_MAX_YEARS_AHEAD,
            min_name_chars: DEFAULT_MIN_NAME_CHARS,
            max_name_chars: DEFAULT_MAX_NAME_CHARS,
            long_range_warning_months: DEFAULT_LONG_RANGE_WARNING_MONTHS,
        }
    }
}

impl CatalogConfig {
    /// Parses a JSON config document; missing fields fall back to defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_transaction_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_transaction_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        if self.search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "search_limit",
                message: "must be at least 1".to_string(),
            });
        }
        if self.incomplete_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "incomplete_limit",
                message: "must be at least 1".to_string(),
            });
        }
        if self.min_name_chars > self.max_name_chars {
            return Err(ConfigError::InvalidValue {
                field: "min_name_chars",
                message: format!(
                    "{} exceeds max_name_chars {}",
                    self.min_name_chars, self.max_name_chars
                ),
            });
        }
        if self.max_years_ahead < 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_years_ahead",
                message: "cannot be negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Clamps a requested row limit into `1..=max`.
pub fn clamp_limit(requested: Option<u32>, max: u32) -> u32 {
    let max = max.max(1);
    requested.unwrap_or(max).clamp(1, max)
}

/// Configuration parse/validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid catalog config: {message}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid catalog config `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {}
