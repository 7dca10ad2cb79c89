//! Core domain logic for the car catalog.
//! Name normalization, year-range algebra and the transactional catalog
//! write path live here; outer layers only call the services.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::car::{CarApplicationForm, CarCatalogEntry, EntryValidationError};
pub use model::year_range::{RangeDiff, YearRange};
pub use normalize::alias::generate_aliases;
pub use normalize::name::{normalize_car_name, NormalizedName};
pub use repo::catalog_repo::{
    ApplyOutcome, CatalogRepoError, CatalogRepoResult, CatalogRepository, RejectReason,
};
pub use repo::catalog_store::{
    CatalogStore, SqliteCatalogStore, StoreError, StoreResult, StoredEntry, WriteOutcome,
};
pub use service::application_service::{
    ApplicationError, ApplicationService, CarApplicationResult, FailureKind,
};
pub use service::catalog_query::CatalogQueryService;

/// Minimal health-check API for wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
