//! Name normalization and alias generation.
//!
//! # Responsibility
//! - Derive the canonical catalog identity from free-text maker/model input.
//! - Produce the alias set used by search.
//!
//! # Invariants
//! - All functions are pure and infallible.
//! - Translation tables are static; unknown names pass through unchanged.

pub mod alias;
pub mod name;
pub mod tables;
