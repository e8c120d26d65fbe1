//! Subject repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over canonical `subjects` storage.
//!
//! # Invariants
//! - Write paths must call `Subject::validate()` before SQL mutations.
//! - Deleting a subject never cascades; tasks keep their `subject_id` and
//!   scoring falls back to the default difficulty.

use rusqlite::{params, Connection, Row};

use crate::model::subject::{Subject, SubjectId};
use crate::repo::{
    ensure_connection_ready, parse_stored_instant, parse_stored_uuid, RepoError, RepoResult,
};

const SUBJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    color,
    difficulty,
    created_at,
    updated_at
FROM subjects";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "subjects",
    &["id", "name", "color", "difficulty", "created_at", "updated_at"],
)];

/// Repository interface for subject CRUD operations.
pub trait SubjectRepository {
    fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId>;
    fn update_subject(&self, subject: &Subject) -> RepoResult<()>;
    fn delete_subject(&self, id: SubjectId) -> RepoResult<()>;
    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>>;
    /// Lists subjects ordered by name, then id for ties.
    fn list_subjects(&self) -> RepoResult<Vec<Subject>>;
}

/// SQLite-backed subject repository.
pub struct SqliteSubjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl SubjectRepository for SqliteSubjectRepository<'_> {
    fn create_subject(&self, subject: &Subject) -> RepoResult<SubjectId> {
        subject.validate()?;

        self.conn.execute(
            "INSERT INTO subjects (
                id,
                name,
                color,
                difficulty,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                subject.id.to_string(),
                subject.name.as_str(),
                subject.color.as_deref(),
                subject.difficulty.map(i64::from),
                subject.created_at.to_rfc3339(),
                subject.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(subject.id)
    }

    fn update_subject(&self, subject: &Subject) -> RepoResult<()> {
        subject.validate()?;

        let changed = self.conn.execute(
            "UPDATE subjects
             SET
                name = ?1,
                color = ?2,
                difficulty = ?3,
                updated_at = ?4
             WHERE id = ?5;",
            params![
                subject.name.as_str(),
                subject.color.as_deref(),
                subject.difficulty.map(i64::from),
                subject.updated_at.to_rfc3339(),
                subject.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(subject.id));
        }

        Ok(())
    }

    fn delete_subject(&self, id: SubjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM subjects WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_subject(&self, id: SubjectId) -> RepoResult<Option<Subject>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBJECT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subject_row(row)?));
        }

        Ok(None)
    }

    fn list_subjects(&self) -> RepoResult<Vec<Subject>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBJECT_SELECT_SQL} ORDER BY name ASC, id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut subjects = Vec::new();

        while let Some(row) = rows.next()? {
            subjects.push(parse_subject_row(row)?);
        }

        Ok(subjects)
    }
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    let id_text: String = row.get("id")?;
    let id = parse_stored_uuid(&id_text, "subjects", "id")?;

    let created_text: String = row.get("created_at")?;
    let created_at = parse_stored_instant(&created_text, "subjects", "created_at")?;

    let updated_text: String = row.get("updated_at")?;
    let updated_at = parse_stored_instant(&updated_text, "subjects", "updated_at")?;

    let difficulty = match row.get::<_, Option<i64>>("difficulty")? {
        Some(value) => Some(u8::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid difficulty value `{value}` in subjects.difficulty"
            ))
        })?),
        None => None,
    };

    let subject = Subject {
        id,
        name: row.get("name")?,
        color: row.get("color")?,
        difficulty,
        created_at,
        updated_at,
    };
    subject.validate()?;
    Ok(subject)
}
