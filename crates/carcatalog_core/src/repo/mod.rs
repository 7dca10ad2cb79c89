//! Repository layer: catalog storage contract and transactional write path.
//!
//! # Responsibility
//! - Define the document-store contract consumed by catalog services.
//! - Isolate SQLite details from application orchestration.
//! - Run catalog read-modify-write cycles with optimistic conflict retry.
//!
//! # Invariants
//! - Store writes validate documents before persistence.
//! - Business refusals are values; only storage failures are `Err`.

pub mod catalog_repo;
pub mod catalog_store;
