//! CSV export of store contents.
//!
//! # Responsibility
//! - Render tasks, CAS entries and reflections as CSV text.
//!
//! # Invariants
//! - Every field is quoted; embedded quotes are doubled.
//! - Rows are joined with `\n` and there is no trailing newline.
//! - Absent optional fields render as empty strings, not literals.

use crate::model::journal::{CasEntry, ReflectionEntry};
use crate::model::task::Task;

const TASK_HEADER: &[&str] = &[
    "Title",
    "SubjectId",
    "Type",
    "Deadline",
    "Estimated Hours",
    "Priority",
    "Status",
    "Notes",
];

const CAS_HEADER: &[&str] = &[
    "Strand",
    "Date Start",
    "Date End",
    "Hours",
    "Reflection",
    "Evidence",
];

const REFLECTION_HEADER: &[&str] = &["Date", "Title", "Reflection", "Evidence"];

/// Renders a header and rows as quoted CSV.
pub fn to_csv(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(header.iter().copied()));
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str)));
    }
    lines.join("\n")
}

/// Tasks in their listed order.
pub fn tasks_csv(tasks: &[Task]) -> String {
    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|task| {
            vec![
                task.title.clone(),
                task.subject_id.to_string(),
                task.kind.label().to_string(),
                task.deadline.to_rfc3339(),
                task.estimated_hours.to_string(),
                task.priority.to_string(),
                task.status.label().to_string(),
                task.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    to_csv(TASK_HEADER, &rows)
}

/// CAS entries in their listed order.
pub fn cas_entries_csv(entries: &[CasEntry]) -> String {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.strand.label().to_string(),
                entry.date_start.to_string(),
                entry.date_end.map(|d| d.to_string()).unwrap_or_default(),
                entry.hours.to_string(),
                entry.reflection.clone(),
                entry.evidence_uri.clone().unwrap_or_default(),
            ]
        })
        .collect();
    to_csv(CAS_HEADER, &rows)
}

/// TOK or EE reflections in their listed order; both journals share the
/// same columns.
pub fn reflections_csv(entries: &[ReflectionEntry]) -> String {
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                entry.date.to_string(),
                entry.title.clone(),
                entry.reflection.clone(),
                entry.evidence_uri.clone().unwrap_or_default(),
            ]
        })
        .collect();
    to_csv(REFLECTION_HEADER, &rows)
}

fn render_row<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .map(csv_field)
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
