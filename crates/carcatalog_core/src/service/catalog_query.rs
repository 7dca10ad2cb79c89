//! Read-side catalog queries.
//!
//! # Responsibility
//! - Provide identity, alias, maker and completeness lookups for search UIs.
//! - Normalize search terms the same way catalog identities are normalized.
//!
//! # Invariants
//! - Queries never write.
//! - Result sizes are bounded by `CatalogConfig` limits.

use crate::config::{clamp_limit, CatalogConfig};
use crate::model::car::CarCatalogEntry;
use crate::normalize::name::{normalize_car_name, normalize_model_token};
use crate::repo::catalog_store::{CatalogStore, StoreResult};

/// Query facade over a catalog store.
pub struct CatalogQueryService<S: CatalogStore> {
    store: S,
    search_limit: u32,
    incomplete_limit: u32,
}

impl<S: CatalogStore> CatalogQueryService<S> {
    pub fn new(store: S) -> Self {
        Self::from_config(store, &CatalogConfig::default())
    }

    pub fn from_config(store: S, config: &CatalogConfig) -> Self {
        Self {
            store,
            search_limit: config.search_limit.max(1),
            incomplete_limit: config.incomplete_limit.max(1),
        }
    }

    /// Looks up the entry a (maker, model) pair resolves to.
    pub fn find_car(
        &self,
        maker_name: &str,
        model_name: &str,
    ) -> StoreResult<Option<CarCatalogEntry>> {
        self.get_car(&normalize_car_name(maker_name, model_name).normalized_name)
    }

    /// Looks up an entry by canonical identity.
    pub fn get_car(&self, normalized_name: &str) -> StoreResult<Option<CarCatalogEntry>> {
        Ok(self
            .store
            .get_entry(normalized_name)?
            .map(|stored| stored.entry))
    }

    /// First entry carrying `alias` verbatim.
    pub fn find_by_alias(&self, alias: &str) -> StoreResult<Option<CarCatalogEntry>> {
        if alias.is_empty() {
            return Ok(None);
        }
        self.store.find_by_alias(alias)
    }

    /// Searches aliases with the configured limit.
    pub fn search_cars(&self, term: &str) -> StoreResult<Vec<CarCatalogEntry>> {
        self.search_cars_with_limit(term, None)
    }

    /// Searches aliases for the raw term, its normalized token, or a
    /// case-insensitive substring of the raw term.
    ///
    /// Blank terms return no hits. `limit` is clamped to `1..=search_limit`.
    pub fn search_cars_with_limit(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> StoreResult<Vec<CarCatalogEntry>> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let mut exact = vec![trimmed.to_string()];
        let token = normalize_model_token(trimmed);
        if !token.is_empty() && token != trimmed {
            exact.push(token);
        }

        self.store
            .search_aliases(&exact, trimmed, clamp_limit(limit, self.search_limit))
    }

    /// Entries whose maker matches exactly, by display name.
    pub fn cars_by_maker(&self, maker_name: &str) -> StoreResult<Vec<CarCatalogEntry>> {
        self.store.list_by_maker(maker_name)
    }

    /// Incomplete entries, most recently updated first.
    pub fn incomplete_cars(&self) -> StoreResult<Vec<CarCatalogEntry>> {
        self.store.list_incomplete(self.incomplete_limit)
    }

    /// Every entry by maker then display name.
    pub fn all_cars(&self) -> StoreResult<Vec<CarCatalogEntry>> {
        self.store.list_all()
    }
}
