//! Journal repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `cas_entries` and the twin `tok_entries` /
//!   `ee_entries` tables.
//!
//! # Invariants
//! - Write paths must call entry `validate()` before SQL mutations.
//! - TOK and EE share one record shape; the journal picks the table.
//! - Lists come back newest-first by entry date, id ASC for ties.

use rusqlite::{params, Connection, Row};

use crate::model::journal::{CasEntry, CasStrand, EntryId, Journal, ReflectionEntry};
use crate::repo::{
    ensure_connection_ready, parse_stored_date, parse_stored_instant, parse_stored_uuid,
    RepoError, RepoResult,
};

const CAS_SELECT_SQL: &str = "SELECT
    id,
    strand,
    date_start,
    date_end,
    hours,
    reflection,
    evidence_uri,
    created_at,
    updated_at
FROM cas_entries";

const REFLECTION_COLUMNS: &str = "id,
    date,
    title,
    reflection,
    evidence_uri,
    created_at,
    updated_at";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "cas_entries",
        &[
            "id",
            "strand",
            "date_start",
            "date_end",
            "hours",
            "reflection",
            "evidence_uri",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "tok_entries",
        &["id", "date", "title", "reflection", "evidence_uri", "created_at", "updated_at"],
    ),
    (
        "ee_entries",
        &["id", "date", "title", "reflection", "evidence_uri", "created_at", "updated_at"],
    ),
];

fn journal_table(journal: Journal) -> &'static str {
    match journal {
        Journal::Tok => "tok_entries",
        Journal::Ee => "ee_entries",
    }
}

/// Repository interface for CAS and reflection journal operations.
pub trait JournalRepository {
    fn create_cas_entry(&self, entry: &CasEntry) -> RepoResult<EntryId>;
    fn update_cas_entry(&self, entry: &CasEntry) -> RepoResult<()>;
    fn delete_cas_entry(&self, id: EntryId) -> RepoResult<()>;
    fn list_cas_entries(&self) -> RepoResult<Vec<CasEntry>>;

    fn create_reflection(&self, journal: Journal, entry: &ReflectionEntry) -> RepoResult<EntryId>;
    fn update_reflection(&self, journal: Journal, entry: &ReflectionEntry) -> RepoResult<()>;
    fn delete_reflection(&self, journal: Journal, id: EntryId) -> RepoResult<()>;
    fn list_reflections(&self, journal: Journal) -> RepoResult<Vec<ReflectionEntry>>;
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn create_cas_entry(&self, entry: &CasEntry) -> RepoResult<EntryId> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO cas_entries (
                id,
                strand,
                date_start,
                date_end,
                hours,
                reflection,
                evidence_uri,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                entry.id.to_string(),
                entry.strand.as_str(),
                entry.date_start.to_string(),
                entry.date_end.map(|d| d.to_string()),
                entry.hours,
                entry.reflection.as_str(),
                entry.evidence_uri.as_deref(),
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(entry.id)
    }

    fn update_cas_entry(&self, entry: &CasEntry) -> RepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE cas_entries
             SET
                strand = ?1,
                date_start = ?2,
                date_end = ?3,
                hours = ?4,
                reflection = ?5,
                evidence_uri = ?6,
                updated_at = ?7
             WHERE id = ?8;",
            params![
                entry.strand.as_str(),
                entry.date_start.to_string(),
                entry.date_end.map(|d| d.to_string()),
                entry.hours,
                entry.reflection.as_str(),
                entry.evidence_uri.as_deref(),
                entry.updated_at.to_rfc3339(),
                entry.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        Ok(())
    }

    fn delete_cas_entry(&self, id: EntryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM cas_entries WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_cas_entries(&self) -> RepoResult<Vec<CasEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CAS_SELECT_SQL} ORDER BY date_start DESC, id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_cas_row(row)?);
        }

        Ok(entries)
    }

    fn create_reflection(&self, journal: Journal, entry: &ReflectionEntry) -> RepoResult<EntryId> {
        entry.validate()?;
        let table = journal_table(journal);

        self.conn.execute(
            &format!(
                "INSERT INTO {table} (
                    {REFLECTION_COLUMNS}
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);"
            ),
            params![
                entry.id.to_string(),
                entry.date.to_string(),
                entry.title.as_str(),
                entry.reflection.as_str(),
                entry.evidence_uri.as_deref(),
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(entry.id)
    }

    fn update_reflection(&self, journal: Journal, entry: &ReflectionEntry) -> RepoResult<()> {
        entry.validate()?;
        let table = journal_table(journal);

        let changed = self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET
                    date = ?1,
                    title = ?2,
                    reflection = ?3,
                    evidence_uri = ?4,
                    updated_at = ?5
                 WHERE id = ?6;"
            ),
            params![
                entry.date.to_string(),
                entry.title.as_str(),
                entry.reflection.as_str(),
                entry.evidence_uri.as_deref(),
                entry.updated_at.to_rfc3339(),
                entry.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }

        Ok(())
    }

    fn delete_reflection(&self, journal: Journal, id: EntryId) -> RepoResult<()> {
        let table = journal_table(journal);
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_reflections(&self, journal: Journal) -> RepoResult<Vec<ReflectionEntry>> {
        let table = journal_table(journal);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REFLECTION_COLUMNS} FROM {table} ORDER BY date DESC, id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_reflection_row(row, table)?);
        }

        Ok(entries)
    }
}

fn parse_cas_row(row: &Row<'_>) -> RepoResult<CasEntry> {
    let id_text: String = row.get("id")?;
    let id = parse_stored_uuid(&id_text, "cas_entries", "id")?;

    let strand_text: String = row.get("strand")?;
    let strand = CasStrand::parse(&strand_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid strand value `{strand_text}` in cas_entries.strand"
        ))
    })?;

    let start_text: String = row.get("date_start")?;
    let date_start = parse_stored_date(&start_text, "cas_entries", "date_start")?;

    let date_end = match row.get::<_, Option<String>>("date_end")? {
        Some(value) => Some(parse_stored_date(&value, "cas_entries", "date_end")?),
        None => None,
    };

    let created_text: String = row.get("created_at")?;
    let created_at = parse_stored_instant(&created_text, "cas_entries", "created_at")?;

    let updated_text: String = row.get("updated_at")?;
    let updated_at = parse_stored_instant(&updated_text, "cas_entries", "updated_at")?;

    let entry = CasEntry {
        id,
        strand,
        date_start,
        date_end,
        hours: row.get("hours")?,
        reflection: row.get("reflection")?,
        evidence_uri: row.get("evidence_uri")?,
        created_at,
        updated_at,
    };
    entry.validate()?;
    Ok(entry)
}

fn parse_reflection_row(row: &Row<'_>, table: &'static str) -> RepoResult<ReflectionEntry> {
    let id_text: String = row.get("id")?;
    let id = parse_stored_uuid(&id_text, table, "id")?;

    let date_text: String = row.get("date")?;
    let date = parse_stored_date(&date_text, table, "date")?;

    let created_text: String = row.get("created_at")?;
    let created_at = parse_stored_instant(&created_text, table, "created_at")?;

    let updated_text: String = row.get("updated_at")?;
    let updated_at = parse_stored_instant(&updated_text, table, "updated_at")?;

    let entry = ReflectionEntry {
        id,
        date,
        title: row.get("title")?,
        reflection: row.get("reflection")?,
        evidence_uri: row.get("evidence_uri")?,
        created_at,
        updated_at,
    };
    entry.validate()?;
    Ok(entry)
}
