//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for subjects, tasks,
//!   journal entries and settings.
//! - Isolate SQLite query details from session orchestration.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before persistence.
//! - Repository constructors refuse connections whose schema is not at the
//!   version this binary expects.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod journal_repo;
pub mod settings_repo;
pub mod subject_repo;
pub mod task_repo;

use std::error::Error;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{migrations::latest_version, DbError};
use crate::model::ValidationError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies that `conn` is migrated and carries the tables and columns a
/// repository relies on. Called from every repository constructor.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Parses a stored UUID, attributing failures to `table.column`.
pub(crate) fn parse_stored_uuid(value: &str, table: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in {table}.{column}"))
    })
}

/// Parses a stored RFC 3339 instant, attributing failures to `table.column`.
pub(crate) fn parse_stored_instant(
    value: &str,
    table: &str,
    column: &str,
) -> RepoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid timestamp value `{value}` in {table}.{column}"
            ))
        })
}

/// Parses a stored `YYYY-MM-DD` date, attributing failures to `table.column`.
pub(crate) fn parse_stored_date(value: &str, table: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{value}` in {table}.{column}"))
    })
}
