use carcatalog_core::db::migrations::{current_user_version, latest_version};
use carcatalog_core::db::{open_db, open_db_in_memory, DbError};
use carcatalog_core::{SqliteCatalogStore, StoreError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    assert_table_exists(&conn, "car_catalog");
    assert!(SqliteCatalogStore::try_new(&conn).is_ok());
}

#[test]
fn reopening_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");

    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO car_catalog (normalized_name, display_name, maker_name, ranges_json, is_incomplete)
         VALUES ('TOYOTA_COROLLA', 'Toyota Corolla', 'Toyota',
                 '[{\"start_year\":2015,\"start_month\":1,\"end_year\":2018,\"end_month\":12}]', 1);",
        [],
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM car_catalog;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn new_rows_get_default_revision_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO car_catalog (normalized_name, display_name, maker_name, ranges_json, is_incomplete)
         VALUES ('HONDA_CIVIC', 'Honda Civic', 'Honda', '[]', 1);",
        [],
    )
    .unwrap();

    let (revision, aliases, created_at, updated_at): (i64, String, i64, i64) = conn
        .query_row(
            "SELECT revision, aliases_json, created_at, updated_at
             FROM car_catalog WHERE normalized_name = 'HONDA_CIVIC';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(revision, 1);
    assert_eq!(aliases, "[]");
    assert!(created_at > 0);
    assert_eq!(created_at, updated_at);
}

#[test]
fn is_incomplete_accepts_only_booleans() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO car_catalog (normalized_name, display_name, maker_name, ranges_json, is_incomplete)
         VALUES ('X_Y', 'X Y', 'X', '[]', 2);",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteCatalogStore::try_new(&conn) {
        Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
