//! Car catalog domain model.
//!
//! # Responsibility
//! - Define the catalog document and the application form.
//! - Own the pure year-range interval algebra.
//!
//! # Invariants
//! - Every catalog document is identified by its canonical `normalized_name`.
//! - Catalog documents are never deleted by core.

pub mod car;
pub mod year_range;
