use carcatalog_core::db::open_db_in_memory;
use carcatalog_core::model::year_range::add_range;
use carcatalog_core::{
    ApplicationError, ApplicationService, ApplyOutcome, CarApplicationForm, CarApplicationResult,
    CarCatalogEntry, CatalogConfig, CatalogRepoError, CatalogRepository, CatalogStore,
    FailureKind, RejectReason, SqliteCatalogStore, StoreResult, StoredEntry, WriteOutcome,
    YearRange,
};
use std::cell::Cell;

fn form(maker: &str, model: &str, start: (i32, i32), end: (i32, i32)) -> CarApplicationForm {
    CarApplicationForm {
        maker_name: maker.to_string(),
        model_name: model.to_string(),
        start_year: start.0,
        start_month: start.1,
        end_year: end.0,
        end_month: end.1,
    }
}

/// Store wrapper that counts calls and can simulate competing writers.
struct ScriptedStore<'conn> {
    inner: SqliteCatalogStore<'conn>,
    /// Range a rival process writes just before each of our next writes.
    rival_range: YearRange,
    rival_writes_left: Cell<u32>,
    always_conflict: bool,
    reads: Cell<u32>,
    writes: Cell<u32>,
}

impl<'conn> ScriptedStore<'conn> {
    fn new(inner: SqliteCatalogStore<'conn>) -> Self {
        Self {
            inner,
            rival_range: YearRange::new(2022, 1, 2022, 12),
            rival_writes_left: Cell::new(0),
            always_conflict: false,
            reads: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    fn with_rival_writes(mut self, range: YearRange, count: u32) -> Self {
        self.rival_range = range;
        self.rival_writes_left = Cell::new(count);
        self
    }

    fn always_conflicting(mut self) -> Self {
        self.always_conflict = true;
        self
    }

    fn calls(&self) -> u32 {
        self.reads.get() + self.writes.get()
    }

    fn run_rival_writer(&self, normalized_name: &str, template: &CarCatalogEntry) {
        if self.rival_writes_left.get() == 0 {
            return;
        }
        self.rival_writes_left.set(self.rival_writes_left.get() - 1);

        match self.inner.get_entry(normalized_name).unwrap() {
            Some(current) => {
                let mut rival = current.entry.clone();
                rival.ranges = add_range(&rival.ranges, self.rival_range);
                rival.is_incomplete = true;
                let outcome = self.inner.update_entry(&rival, current.revision).unwrap();
                assert!(matches!(outcome, WriteOutcome::Committed(_)));
            }
            None => {
                let mut rival = template.clone();
                rival.ranges = vec![self.rival_range];
                let outcome = self.inner.insert_entry(&rival).unwrap();
                assert!(matches!(outcome, WriteOutcome::Committed(_)));
            }
        }
    }
}

impl CatalogStore for ScriptedStore<'_> {
    fn get_entry(&self, normalized_name: &str) -> StoreResult<Option<StoredEntry>> {
        self.reads.set(self.reads.get() + 1);
        self.inner.get_entry(normalized_name)
    }

    fn insert_entry(&self, entry: &CarCatalogEntry) -> StoreResult<WriteOutcome> {
        self.writes.set(self.writes.get() + 1);
        if self.always_conflict {
            return Ok(WriteOutcome::Conflict);
        }
        self.run_rival_writer(&entry.normalized_name, entry);
        self.inner.insert_entry(entry)
    }

    fn update_entry(
        &self,
        entry: &CarCatalogEntry,
        expected_revision: i64,
    ) -> StoreResult<WriteOutcome> {
        self.writes.set(self.writes.get() + 1);
        if self.always_conflict {
            return Ok(WriteOutcome::Conflict);
        }
        self.run_rival_writer(&entry.normalized_name, entry);
        self.inner.update_entry(entry, expected_revision)
    }

    fn find_by_alias(&self, alias: &str) -> StoreResult<Option<CarCatalogEntry>> {
        self.inner.find_by_alias(alias)
    }

    fn search_aliases(
        &self,
        exact: &[String],
        substring: &str,
        limit: u32,
    ) -> StoreResult<Vec<CarCatalogEntry>> {
        self.inner.search_aliases(exact, substring, limit)
    }

    fn list_by_maker(&self, maker_name: &str) -> StoreResult<Vec<CarCatalogEntry>> {
        self.inner.list_by_maker(maker_name)
    }

    fn list_incomplete(&self, limit: u32) -> StoreResult<Vec<CarCatalogEntry>> {
        self.inner.list_incomplete(limit)
    }

    fn list_all(&self) -> StoreResult<Vec<CarCatalogEntry>> {
        self.inner.list_all()
    }
}

fn expect_success(result: &CarApplicationResult) -> &CarCatalogEntry {
    assert!(result.success, "unexpected failure: {}", result.message);
    assert!(result.failure.is_none());
    result.car.as_ref().unwrap()
}

#[test]
fn application_lifecycle_creates_merges_and_rejects() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCatalogStore::try_new(&conn).unwrap();
    let service = ApplicationService::new(store);

    // First submission creates the entry.
    let created = service
        .process_car_application(&form("Toyota", "Corolla", (2015, 1), (2018, 12)))
        .unwrap();
    let car = expect_success(&created);
    assert!(created.is_new_car);
    assert!(!created.is_range_added);
    assert_eq!(car.normalized_name, "TOYOTA_COROLLA");
    assert_eq!(car.display_name, "Toyota Corolla");
    assert_eq!(car.ranges, vec![YearRange::new(2015, 1, 2018, 12)]);
    assert!(car.is_incomplete);

    // Adjacent range merges and closes the entry.
    let merged = service
        .process_car_application(&form("Toyota", "Corolla", (2019, 1), (2020, 6)))
        .unwrap();
    let car = expect_success(&merged);
    assert!(merged.is_range_added);
    assert!(!merged.is_new_car);
    assert_eq!(car.ranges, vec![YearRange::new(2015, 1, 2020, 6)]);
    assert!(!car.is_incomplete);

    // A one-year gap reopens it.
    let gapped = service
        .process_car_application(&form("Toyota", "Corolla", (2022, 1), (2022, 12)))
        .unwrap();
    let car = expect_success(&gapped);
    assert!(gapped.is_range_added);
    assert_eq!(
        car.ranges,
        vec![
            YearRange::new(2015, 1, 2020, 6),
            YearRange::new(2022, 1, 2022, 12)
        ]
    );
    assert!(car.is_incomplete);

    // Exact resubmission is a duplicate and writes nothing.
    let before = store.get_entry("TOYOTA_COROLLA").unwrap().unwrap();
    let duplicate = service
        .process_car_application(&form("Toyota", "Corolla", (2022, 1), (2022, 12)))
        .unwrap();
    assert!(!duplicate.success);
    assert_eq!(duplicate.failure, Some(FailureKind::DuplicateRange));
    assert!(duplicate.message.contains("already registered"));
    assert!(duplicate.car.is_none());
    let after = store.get_entry("TOYOTA_COROLLA").unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.entry.ranges.len(), 2);
}

#[test]
fn inverted_range_is_rejected_without_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let store = ScriptedStore::new(SqliteCatalogStore::try_new(&conn).unwrap());
    let service = ApplicationService::new(store);

    let result = service
        .process_car_application(&form("Toyota", "Corolla", (2020, 6), (2019, 1)))
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::ValidationError));
    assert!(!result.is_new_car && !result.is_range_added);
    assert_eq!(service.repository().store().calls(), 0);
}

#[test]
fn non_calendar_months_are_rejected_by_the_repository() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    let repo = CatalogRepository::new(ScriptedStore::new(base));

    let outcome = repo
        .apply("Toyota", "Corolla", YearRange::new(2015, 0, 2015, 13))
        .unwrap();
    assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::InvalidRange));
    assert_eq!(repo.store().calls(), 0);
    assert!(base.get_entry("TOYOTA_COROLLA").unwrap().is_none());

    repo.apply("Toyota", "Corolla", YearRange::new(2015, 1, 2018, 12))
        .unwrap();
    let outcome = repo
        .apply("Toyota", "Corolla", YearRange::new(2019, 1, 2019, 13))
        .unwrap();
    assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::InvalidRange));
    let stored = base.get_entry("TOYOTA_COROLLA").unwrap().unwrap();
    assert_eq!(stored.revision, 1);
    assert_eq!(stored.entry.ranges, vec![YearRange::new(2015, 1, 2018, 12)]);
}

#[test]
fn blank_names_are_rejected_without_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let store = ScriptedStore::new(SqliteCatalogStore::try_new(&conn).unwrap());
    let service = ApplicationService::new(store);

    let result = service
        .process_car_application(&form("Toyota", "   ", (2015, 1), (2018, 12)))
        .unwrap();
    assert_eq!(result.failure, Some(FailureKind::ValidationError));
    assert_eq!(service.repository().store().calls(), 0);
}

#[test]
fn spelling_variants_resolve_to_one_entry() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCatalogStore::try_new(&conn).unwrap();
    let service = ApplicationService::new(store);

    let created = service
        .process_car_application(&form("Toyota", "Corolla", (2015, 1), (2018, 12)))
        .unwrap();
    assert!(created.is_new_car);

    for (maker, model, start, end) in [
        ("toyota", "corolla", (2019, 1), (2019, 6)),
        ("TOYOTA", "Toyota Corolla", (2019, 7), (2019, 12)),
        ("Toyota", "ＣＯＲＯＬＬＡ", (2020, 1), (2020, 6)),
    ] {
        let result = service
            .process_car_application(&form(maker, model, start, end))
            .unwrap();
        assert!(result.is_range_added, "{maker} {model} should merge");
    }

    let entries = store.list_all().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].display_name, "Toyota Corolla");
    assert_eq!(entries[0].ranges, vec![YearRange::new(2015, 1, 2020, 6)]);
}

#[test]
fn concurrent_update_is_retried_against_fresh_state() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    CatalogRepository::new(base)
        .apply("Toyota", "Corolla", YearRange::new(2015, 1, 2018, 12))
        .unwrap();

    let store =
        ScriptedStore::new(base).with_rival_writes(YearRange::new(2022, 1, 2022, 12), 1);
    let repo = CatalogRepository::new(store);
    let outcome = repo
        .apply("Toyota", "Corolla", YearRange::new(2019, 1, 2020, 6))
        .unwrap();

    match outcome {
        ApplyOutcome::RangeAdded { entry, diff } => {
            assert_eq!(
                entry.ranges,
                vec![
                    YearRange::new(2015, 1, 2020, 6),
                    YearRange::new(2022, 1, 2022, 12)
                ]
            );
            assert!(entry.is_incomplete);
            assert_eq!(diff.added, vec![YearRange::new(2015, 1, 2020, 6)]);
            assert_eq!(diff.removed, vec![YearRange::new(2015, 1, 2018, 12)]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(repo.store().reads.get(), 2);
    assert_eq!(repo.store().writes.get(), 2);
    let stored = base.get_entry("TOYOTA_COROLLA").unwrap().unwrap();
    assert_eq!(stored.revision, 3);
}

#[test]
fn concurrent_create_turns_into_range_added() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    let store =
        ScriptedStore::new(base).with_rival_writes(YearRange::new(2015, 1, 2018, 12), 1);
    let repo = CatalogRepository::new(store);

    let outcome = repo
        .apply("Toyota", "Corolla", YearRange::new(2019, 1, 2020, 6))
        .unwrap();
    match outcome {
        ApplyOutcome::RangeAdded { entry, .. } => {
            assert_eq!(entry.ranges, vec![YearRange::new(2015, 1, 2020, 6)]);
            assert!(!entry.is_incomplete);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(base.list_all().unwrap().len(), 1);
}

#[test]
fn concurrent_duplicate_is_detected_on_retry() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    let range = YearRange::new(2015, 1, 2018, 12);
    let store = ScriptedStore::new(base).with_rival_writes(range, 1);
    let repo = CatalogRepository::new(store);

    let outcome = repo.apply("Toyota", "Corolla", range).unwrap();
    assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::DuplicateRange));
    let stored = base.get_entry("TOYOTA_COROLLA").unwrap().unwrap();
    assert_eq!(stored.revision, 1);
}

#[test]
fn exhausted_retry_budget_reports_storage_unavailable() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    let config = CatalogConfig {
        max_transaction_attempts: 3,
        ..CatalogConfig::default()
    };
    let repo =
        CatalogRepository::from_config(ScriptedStore::new(base).always_conflicting(), &config);
    assert_eq!(repo.max_attempts(), 3);

    let err = repo
        .apply("Toyota", "Corolla", YearRange::new(2015, 1, 2018, 12))
        .unwrap_err();
    assert!(matches!(err, CatalogRepoError::StorageUnavailable { attempts: 3 }));
    assert_eq!(repo.store().writes.get(), 3);
    assert_eq!(repo.store().reads.get(), 3);
    assert!(base.get_entry("TOYOTA_COROLLA").unwrap().is_none());
}

#[test]
fn service_maps_exhaustion_to_retryable_failure() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    let config = CatalogConfig {
        max_transaction_attempts: 2,
        ..CatalogConfig::default()
    };
    let service =
        ApplicationService::from_config(ScriptedStore::new(base).always_conflicting(), &config);

    let err = service
        .process_car_application(&form("Honda", "Civic", (2017, 9), (2021, 8)))
        .unwrap_err();
    assert!(matches!(err, ApplicationError::StorageUnavailable { attempts: 2 }));

    let envelope = CarApplicationResult::from_error(&err);
    assert!(!envelope.success);
    assert_eq!(envelope.failure, Some(FailureKind::StorageUnavailable));
    assert!(envelope.car.is_none());
}

#[test]
fn zero_attempt_budget_still_tries_once() {
    let conn = open_db_in_memory().unwrap();
    let base = SqliteCatalogStore::try_new(&conn).unwrap();
    let config = CatalogConfig {
        max_transaction_attempts: 0,
        ..CatalogConfig::default()
    };
    let repo = CatalogRepository::from_config(ScriptedStore::new(base), &config);
    assert_eq!(repo.max_attempts(), 1);

    let outcome = repo
        .apply("Honda", "Civic", YearRange::new(2017, 9, 2021, 8))
        .unwrap();
    assert!(matches!(outcome, ApplyOutcome::Created(_)));
    assert_eq!(repo.store().writes.get(), 1);
}
