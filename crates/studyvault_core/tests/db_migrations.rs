use rusqlite::Connection;
use studyvault_core::db::migrations::{apply_migrations, latest_version};
use studyvault_core::db::{open_memory_db, DbError};

#[test]
fn open_memory_db_applies_all_migrations() {
    let conn = open_memory_db().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "settings");
    assert_table_exists(&conn, "subjects");
    assert_table_exists(&conn, "tasks");
    assert_table_exists(&conn, "cas_entries");
    assert_table_exists(&conn, "tok_entries");
    assert_table_exists(&conn, "ee_entries");
}

#[test]
fn open_memory_db_enables_foreign_keys() {
    let conn = open_memory_db().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn reapplying_migrations_is_idempotent() {
    let mut conn = open_memory_db().unwrap();

    apply_migrations(&mut conn).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");
}

#[test]
fn migrating_a_newer_schema_version_returns_error() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
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

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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
