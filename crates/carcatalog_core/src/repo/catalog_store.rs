//! Catalog document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed get/insert/update over whole catalog documents.
//! - Provide the read-side predicate queries used by search screens.
//! - Detect concurrent writers through a per-document `revision` counter.
//!
//! # Invariants
//! - Writes call `CarCatalogEntry::validate()` before touching SQL.
//! - Reads reject invalid persisted documents instead of masking them.
//! - A write either replaces the full (ranges, aliases, is_incomplete,
//!   updated_at) tuple or changes nothing.
//! - `created_at` is set once; `updated_at` strictly increases per update.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::car::{CarCatalogEntry, EntryValidationError};
use crate::model::year_range::YearRange;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CATALOG_SELECT_SQL: &str = "SELECT
    c.normalized_name AS normalized_name,
    c.display_name AS display_name,
    c.maker_name AS maker_name,
    c.aliases_json AS aliases_json,
    c.ranges_json AS ranges_json,
    c.is_incomplete AS is_incomplete,
    c.revision AS revision,
    c.created_at AS created_at,
    c.updated_at AS updated_at
FROM car_catalog c";

const CATALOG_COLUMNS: &[&str] = &[
    "normalized_name",
    "display_name",
    "maker_name",
    "aliases_json",
    "ranges_json",
    "is_incomplete",
    "revision",
    "created_at",
    "updated_at",
];

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from catalog storage operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Document rejected before write.
    Validation(EntryValidationError),
    /// Persisted row cannot be decoded into a valid document.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required column is missing from `car_catalog`.
    MissingRequiredColumn(&'static str),
}

impl StoreError {
    /// Returns whether another writer holds the database lock.
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_contention())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredColumn(column) => {
                write!(f, "catalog store requires column `{column}` in `car_catalog`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredColumn(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<EntryValidationError> for StoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Catalog document together with its optimistic-concurrency revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub entry: CarCatalogEntry,
    /// Incremented by storage on every committed write.
    pub revision: i64,
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Write applied; carries the stored document with storage-assigned fields.
    Committed(StoredEntry),
    /// Another writer created or changed the document first.
    Conflict,
}

/// Storage collaborator for catalog documents keyed by `normalized_name`.
pub trait CatalogStore {
    /// Loads one document by canonical identity.
    fn get_entry(&self, normalized_name: &str) -> StoreResult<Option<StoredEntry>>;
    /// Creates a document; `Conflict` when the key already exists.
    fn insert_entry(&self, entry: &CarCatalogEntry) -> StoreResult<WriteOutcome>;
    /// Replaces a document if its revision still equals `expected_revision`.
    fn update_entry(
        &self,
        entry: &CarCatalogEntry,
        expected_revision: i64,
    ) -> StoreResult<WriteOutcome>;
    /// First document (by identity) whose alias set contains `alias` exactly.
    fn find_by_alias(&self, alias: &str) -> StoreResult<Option<CarCatalogEntry>>;
    /// Documents with an alias equal to one of `exact` or containing
    /// `substring` case-insensitively, ordered by maker then display name.
    fn search_aliases(
        &self,
        exact: &[String],
        substring: &str,
        limit: u32,
    ) -> StoreResult<Vec<CarCatalogEntry>>;
    /// Documents with this exact maker, ordered by display name.
    fn list_by_maker(&self, maker_name: &str) -> StoreResult<Vec<CarCatalogEntry>>;
    /// Incomplete documents, most recently updated first.
    fn list_incomplete(&self, limit: u32) -> StoreResult<Vec<CarCatalogEntry>>;
    /// Every document ordered by maker then display name.
    fn list_all(&self) -> StoreResult<Vec<CarCatalogEntry>>;
}

/// SQLite-backed catalog store.
#[derive(Clone, Copy)]
pub struct SqliteCatalogStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogStore<'conn> {
    /// Wraps a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn write_in_tx(
        &self,
        normalized_name: &str,
        write: impl FnOnce(&Transaction<'_>) -> StoreResult<usize>,
    ) -> StoreResult<WriteOutcome> {
        let result = (|| -> StoreResult<WriteOutcome> {
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            if write(&tx)? == 0 {
                return Ok(WriteOutcome::Conflict);
            }
            let stored = load_entry(&tx, normalized_name)?.ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "catalog entry `{normalized_name}` missing after write"
                ))
            })?;
            tx.commit()?;
            Ok(WriteOutcome::Committed(stored))
        })();

        match result {
            Err(err) if err.is_contention() => Ok(WriteOutcome::Conflict),
            other => other,
        }
    }
}

impl CatalogStore for SqliteCatalogStore<'_> {
    fn get_entry(&self, normalized_name: &str) -> StoreResult<Option<StoredEntry>> {
        load_entry(self.conn, normalized_name)
    }

    fn insert_entry(&self, entry: &CarCatalogEntry) -> StoreResult<WriteOutcome> {
        entry.validate()?;
        let aliases_json = encode_json(&entry.aliases)?;
        let ranges_json = encode_json(&entry.ranges)?;

        self.write_in_tx(entry.id(), |tx| {
            let changed = tx.execute(
                "INSERT INTO car_catalog (
                    normalized_name,
                    display_name,
                    maker_name,
                    aliases_json,
                    ranges_json,
                    is_incomplete,
                    revision
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
                ON CONFLICT(normalized_name) DO NOTHING;",
                params![
                    entry.id(),
                    entry.display_name.as_str(),
                    entry.maker_name.as_str(),
                    aliases_json.as_str(),
                    ranges_json.as_str(),
                    bool_to_int(entry.is_incomplete),
                ],
            )?;
            Ok(changed)
        })
    }

    fn update_entry(
        &self,
        entry: &CarCatalogEntry,
        expected_revision: i64,
    ) -> StoreResult<WriteOutcome> {
        entry.validate()?;
        let aliases_json = encode_json(&entry.aliases)?;
        let ranges_json = encode_json(&entry.ranges)?;

        self.write_in_tx(entry.id(), |tx| {
            let changed = tx.execute(
                "UPDATE car_catalog
                 SET
                    display_name = ?2,
                    maker_name = ?3,
                    aliases_json = ?4,
                    ranges_json = ?5,
                    is_incomplete = ?6,
                    revision = revision + 1,
                    updated_at = MAX(strftime('%s', 'now') * 1000, updated_at + 1)
                 WHERE normalized_name = ?1
                   AND revision = ?7;",
                params![
                    entry.id(),
                    entry.display_name.as_str(),
                    entry.maker_name.as_str(),
                    aliases_json.as_str(),
                    ranges_json.as_str(),
                    bool_to_int(entry.is_incomplete),
                    expected_revision,
                ],
            )?;
            Ok(changed)
        })
    }

    fn find_by_alias(&self, alias: &str) -> StoreResult<Option<CarCatalogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATALOG_SELECT_SQL}
             WHERE EXISTS (
                SELECT 1 FROM json_each(c.aliases_json) a WHERE a.value = ?1
             )
             ORDER BY c.normalized_name ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([alias])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_catalog_row(row)?.entry));
        }
        Ok(None)
    }

    fn search_aliases(
        &self,
        exact: &[String],
        substring: &str,
        limit: u32,
    ) -> StoreResult<Vec<CarCatalogEntry>> {
        let mut predicates = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        for term in exact.iter().filter(|term| !term.is_empty()) {
            predicates.push("a.value = ?");
            bind_values.push(Value::Text(term.clone()));
        }
        if !substring.is_empty() {
            predicates.push("instr(lower(a.value), lower(?)) > 0");
            bind_values.push(Value::Text(substring.to_string()));
        }
        if predicates.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{CATALOG_SELECT_SQL}
             WHERE EXISTS (
                SELECT 1 FROM json_each(c.aliases_json) a WHERE {}
             )
             ORDER BY c.maker_name ASC, c.display_name ASC, c.normalized_name ASC
             LIMIT ?;",
            predicates.join(" OR ")
        );
        bind_values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_entries(rows)
    }

    fn list_by_maker(&self, maker_name: &str) -> StoreResult<Vec<CarCatalogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATALOG_SELECT_SQL}
             WHERE c.maker_name = ?1
             ORDER BY c.display_name ASC, c.normalized_name ASC;"
        ))?;
        let rows = stmt.query([maker_name])?;
        collect_entries(rows)
    }

    fn list_incomplete(&self, limit: u32) -> StoreResult<Vec<CarCatalogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATALOG_SELECT_SQL}
             WHERE c.is_incomplete = 1
             ORDER BY c.updated_at DESC, c.normalized_name ASC
             LIMIT ?1;"
        ))?;
        let rows = stmt.query([i64::from(limit)])?;
        collect_entries(rows)
    }

    fn list_all(&self) -> StoreResult<Vec<CarCatalogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATALOG_SELECT_SQL}
             ORDER BY c.maker_name ASC, c.display_name ASC, c.normalized_name ASC;"
        ))?;
        let rows = stmt.query([])?;
        collect_entries(rows)
    }
}

fn load_entry(conn: &Connection, normalized_name: &str) -> StoreResult<Option<StoredEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{CATALOG_SELECT_SQL}
         WHERE c.normalized_name = ?1;"
    ))?;
    let mut rows = stmt.query([normalized_name])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_catalog_row(row)?));
    }
    Ok(None)
}

fn collect_entries(mut rows: rusqlite::Rows<'_>) -> StoreResult<Vec<CarCatalogEntry>> {
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_catalog_row(row)?.entry);
    }
    Ok(entries)
}

fn parse_catalog_row(row: &Row<'_>) -> StoreResult<StoredEntry> {
    let normalized_name: String = row.get("normalized_name")?;

    let aliases_json: String = row.get("aliases_json")?;
    let aliases: Vec<String> = serde_json::from_str(&aliases_json).map_err(|err| {
        StoreError::InvalidData(format!(
            "invalid aliases for `{normalized_name}` in car_catalog.aliases_json: {err}"
        ))
    })?;

    let ranges_json: String = row.get("ranges_json")?;
    let ranges: Vec<YearRange> = serde_json::from_str(&ranges_json).map_err(|err| {
        StoreError::InvalidData(format!(
            "invalid ranges for `{normalized_name}` in car_catalog.ranges_json: {err}"
        ))
    })?;

    let is_incomplete = match row.get::<_, i64>("is_incomplete")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_incomplete value `{other}` in car_catalog.is_incomplete"
            )));
        }
    };

    let entry = CarCatalogEntry {
        normalized_name,
        display_name: row.get("display_name")?,
        maker_name: row.get("maker_name")?,
        aliases,
        ranges,
        is_incomplete,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    entry.validate().map_err(|err| {
        StoreError::InvalidData(format!(
            "catalog entry `{}` violates invariants: {err}",
            entry.normalized_name
        ))
    })?;

    Ok(StoredEntry {
        entry,
        revision: row.get("revision")?,
    })
}

fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode catalog field: {err}")))
}

fn ensure_catalog_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare("PRAGMA table_info(car_catalog);")?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(1)?);
    }

    for &column in CATALOG_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(StoreError::MissingRequiredColumn(column));
        }
    }

    Ok(())
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
