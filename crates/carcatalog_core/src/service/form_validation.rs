//! Field-level validation for the car application form.
//!
//! # Responsibility
//! - Report every field problem at once so form UIs can highlight them.
//! - Separate blocking errors from advisory warnings.
//!
//! # Invariants
//! - Pure: the current year is an argument, not read from the clock.
//! - Advisory only; `ApplicationService` applies its own minimal checks.

use crate::config::CatalogConfig;
use crate::model::car::CarApplicationForm;
use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

static SPECIAL_CHAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>{}\[\]\\|`~!@#$%^&*()+=/]"#).expect("valid special char regex")
});

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    MakerName,
    ModelName,
    StartYear,
    StartMonth,
    EndYear,
    EndMonth,
    /// Cross-field start/end relation.
    YearRange,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MakerName => "maker_name",
            Self::ModelName => "model_name",
            Self::StartYear => "start_year",
            Self::StartMonth => "start_month",
            Self::EndYear => "end_year",
            Self::EndMonth => "end_month",
            Self::YearRange => "year_range",
        }
    }
}

/// One message attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    pub field: FormField,
    pub message: String,
}

impl FieldMessage {
    fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// `"<field>: <message>"` for flat display lists.
    pub fn display_line(&self) -> String {
        format!("{}: {}", self.field.as_str(), self.message)
    }
}

/// Collected form validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidation {
    pub errors: Vec<FieldMessage>,
    /// Non-blocking advice.
    pub warnings: Vec<FieldMessage>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error_for(&self, field: FormField) -> bool {
        self.errors.iter().any(|message| message.field == field)
    }
}

/// Current UTC calendar year.
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Validates every field of `form` against `config`.
pub fn validate_application_form(
    form: &CarApplicationForm,
    config: &CatalogConfig,
    current_year: i32,
) -> FormValidation {
    let mut result = FormValidation::default();

    validate_name(&mut result, FormField::MakerName, &form.maker_name, config);
    validate_name(&mut result, FormField::ModelName, &form.model_name, config);

    let max_year = current_year + config.max_years_ahead;
    for (field, year) in [
        (FormField::StartYear, form.start_year),
        (FormField::EndYear, form.end_year),
    ] {
        if year < config.min_year || year > max_year {
            result.errors.push(FieldMessage::new(
                field,
                format!("year must be between {} and {}", config.min_year, max_year),
            ));
        }
    }

    for (field, month) in [
        (FormField::StartMonth, form.start_month),
        (FormField::EndMonth, form.end_month),
    ] {
        if !(1..=12).contains(&month) {
            result
                .errors
                .push(FieldMessage::new(field, "month must be between 1 and 12"));
        }
    }

    let range = form.year_range();
    if range.has_calendar_months() {
        if !range.is_valid() {
            result.errors.push(FieldMessage::new(
                FormField::YearRange,
                "start must not be after end",
            ));
        } else if range.month_span() > config.long_range_warning_months {
            result.warnings.push(FieldMessage::new(
                FormField::YearRange,
                format!(
                    "range spans {} months; ranges over {} months are unusual",
                    range.month_span(),
                    config.long_range_warning_months
                ),
            ));
        }
    }

    result
}

fn validate_name(
    result: &mut FormValidation,
    field: FormField,
    value: &str,
    config: &CatalogConfig,
) {
    let trimmed = value.trim();
    let length = trimmed.chars().count();

    if trimmed.is_empty() {
        result.errors.push(FieldMessage::new(field, "required"));
    } else if length < config.min_name_chars {
        result.errors.push(FieldMessage::new(
            field,
            format!("must be at least {} characters", config.min_name_chars),
        ));
    } else if length > config.max_name_chars {
        result.errors.push(FieldMessage::new(
            field,
            format!("must be at most {} characters", config.max_name_chars),
        ));
    }

    if SPECIAL_CHAR_RE.is_match(value) {
        result
            .errors
            .push(FieldMessage::new(field, "special characters are not allowed"));
    }
}
