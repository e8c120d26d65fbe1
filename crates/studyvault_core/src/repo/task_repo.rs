//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `tasks` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Task::validate()` before SQL mutations.
//! - The done toggle keeps `completed_at` consistent with `status`.
//! - Listing order is creation order, making planner input deterministic.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use chrono::{DateTime, Utc};

use crate::model::subject::SubjectId;
use crate::model::task::{Task, TaskId, TaskKind, TaskStatus};
use crate::repo::{
    ensure_connection_ready, parse_stored_instant, parse_stored_uuid, RepoError, RepoResult,
};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    subject_id,
    kind,
    deadline,
    estimated_hours,
    priority,
    status,
    notes,
    created_at,
    updated_at,
    completed_at
FROM tasks";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "tasks",
    &[
        "id",
        "title",
        "subject_id",
        "kind",
        "deadline",
        "estimated_hours",
        "priority",
        "status",
        "notes",
        "created_at",
        "updated_at",
        "completed_at",
    ],
)];

/// Query options for listing tasks. Empty vectors mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub subject_ids: Vec<SubjectId>,
    pub kinds: Vec<TaskKind>,
    pub statuses: Vec<TaskStatus>,
    /// Case-insensitive title substring; wildcard characters are literal.
    pub search: Option<String>,
}

/// Repository interface for task CRUD operations.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
    /// Flips a task between done and not-started, returning the new status.
    fn toggle_task_status(&self, id: TaskId, now: DateTime<Utc>) -> RepoResult<TaskStatus>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                subject_id,
                kind,
                deadline,
                estimated_hours,
                priority,
                status,
                notes,
                created_at,
                updated_at,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.subject_id.to_string(),
                task.kind.as_str(),
                task.deadline.to_rfc3339(),
                task.estimated_hours,
                i64::from(task.priority),
                task.status.as_str(),
                task.notes.as_deref(),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
                task.completed_at.map(|at| at.to_rfc3339()),
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                subject_id = ?2,
                kind = ?3,
                deadline = ?4,
                estimated_hours = ?5,
                priority = ?6,
                status = ?7,
                notes = ?8,
                updated_at = ?9,
                completed_at = ?10
             WHERE id = ?11;",
            params![
                task.title.as_str(),
                task.subject_id.to_string(),
                task.kind.as_str(),
                task.deadline.to_rfc3339(),
                task.estimated_hours,
                i64::from(task.priority),
                task.status.as_str(),
                task.notes.as_deref(),
                task.updated_at.to_rfc3339(),
                task.completed_at.map(|at| at.to_rfc3339()),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        push_in_clause(
            &mut sql,
            &mut bind_values,
            "subject_id",
            query.subject_ids.iter().map(|id| id.to_string()),
        );
        push_in_clause(
            &mut sql,
            &mut bind_values,
            "kind",
            query.kinds.iter().map(|kind| kind.as_str().to_string()),
        );
        push_in_clause(
            &mut sql,
            &mut bind_values,
            "status",
            query.statuses.iter().map(|status| status.as_str().to_string()),
        );

        if let Some(search) = query.search.as_deref() {
            let trimmed = search.trim();
            if !trimmed.is_empty() {
                sql.push_str(" AND title LIKE ? ESCAPE '\\'");
                bind_values.push(Value::Text(like_pattern(trimmed)));
            }
        }

        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn toggle_task_status(&self, id: TaskId, now: DateTime<Utc>) -> RepoResult<TaskStatus> {
        let mut task = self.get_task(id)?.ok_or(RepoError::NotFound(id))?;

        if task.status == TaskStatus::Done {
            task.reopen(now);
        } else {
            task.mark_done(now);
        }

        self.update_task(&task)?;
        Ok(task.status)
    }
}

/// Appends `AND column IN (?, ...)` for a non-empty value set.
fn push_in_clause(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    column: &str,
    values: impl Iterator<Item = String>,
) {
    let mut count = 0;
    for value in values {
        if count == 0 {
            sql.push_str(&format!(" AND {column} IN (?"));
        } else {
            sql.push_str(", ?");
        }
        bind_values.push(Value::Text(value));
        count += 1;
    }
    if count > 0 {
        sql.push(')');
    }
}

/// Builds a `%needle%` LIKE pattern with SQL wildcards escaped, so user
/// input only ever matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let id = parse_stored_uuid(&id_text, "tasks", "id")?;

    let subject_text: String = row.get("subject_id")?;
    let subject_id: SubjectId = parse_stored_uuid(&subject_text, "tasks", "subject_id")?;

    let kind_text: String = row.get("kind")?;
    let kind = TaskKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task kind `{kind_text}` in tasks.kind"))
    })?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let deadline_text: String = row.get("deadline")?;
    let deadline = parse_stored_instant(&deadline_text, "tasks", "deadline")?;

    let created_text: String = row.get("created_at")?;
    let created_at = parse_stored_instant(&created_text, "tasks", "created_at")?;

    let updated_text: String = row.get("updated_at")?;
    let updated_at = parse_stored_instant(&updated_text, "tasks", "updated_at")?;

    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(value) => Some(parse_stored_instant(&value, "tasks", "completed_at")?),
        None => None,
    };

    let priority_raw: i64 = row.get("priority")?;
    let priority = u8::try_from(priority_raw).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority value `{priority_raw}` in tasks.priority"
        ))
    })?;

    let task = Task {
        id,
        title: row.get("title")?,
        subject_id,
        kind,
        deadline,
        estimated_hours: row.get("estimated_hours")?,
        priority,
        status,
        notes: row.get("notes")?,
        created_at,
        updated_at,
        completed_at,
    };
    task.validate()?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_sql_wildcards() {
        assert_eq!(like_pattern("essay"), "%essay%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn in_clause_is_skipped_for_empty_sets() {
        let mut sql = String::from("SELECT 1 WHERE 1 = 1");
        let mut binds = Vec::new();
        push_in_clause(&mut sql, &mut binds, "kind", std::iter::empty());
        assert_eq!(sql, "SELECT 1 WHERE 1 = 1");
        assert!(binds.is_empty());

        push_in_clause(
            &mut sql,
            &mut binds,
            "kind",
            ["ia".to_string(), "hw".to_string()].into_iter(),
        );
        assert_eq!(sql, "SELECT 1 WHERE 1 = 1 AND kind IN (?, ?)");
        assert_eq!(binds.len(), 2);
    }
}
