//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI and UI layers decoupled from storage details.

pub mod application_service;
pub mod catalog_query;
pub mod form_validation;
pub mod vehicle_match;
