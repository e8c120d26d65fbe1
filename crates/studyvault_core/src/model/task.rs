//! Task domain model.
//!
//! # Responsibility
//! - Define the deadline-bearing work item the planner schedules.
//! - Provide lifecycle helpers for the done/not-done toggle.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `priority` stays within `1..=10`; `estimated_hours` is finite and `>= 0`.
//! - `completed_at` is `Some` exactly when `status == TaskStatus::Done`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::subject::SubjectId;
use crate::model::ValidationError;

/// Stable identifier for a task.
pub type TaskId = Uuid;

/// Category of academic work a task represents.
///
/// The category never changes scheduling mechanics; it exists for filtering
/// and for grouping in exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Internal assessment.
    Ia,
    /// Extended essay milestone.
    Ee,
    /// Homework.
    Hw,
    /// Test or exam preparation.
    Test,
    /// Revision block.
    Revision,
    /// CAS-related obligation.
    Cas,
}

impl TaskKind {
    /// Every kind, in display order.
    pub const ALL: [TaskKind; 6] = [
        TaskKind::Ia,
        TaskKind::Ee,
        TaskKind::Hw,
        TaskKind::Test,
        TaskKind::Revision,
        TaskKind::Cas,
    ];

    /// Canonical storage form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Ia => "ia",
            TaskKind::Ee => "ee",
            TaskKind::Hw => "hw",
            TaskKind::Test => "test",
            TaskKind::Revision => "revision",
            TaskKind::Cas => "cas",
        }
    }

    /// Parses the canonical storage form.
    pub fn parse(value: &str) -> Option<TaskKind> {
        match value {
            "ia" => Some(TaskKind::Ia),
            "ee" => Some(TaskKind::Ee),
            "hw" => Some(TaskKind::Hw),
            "test" => Some(TaskKind::Test),
            "revision" => Some(TaskKind::Revision),
            "cas" => Some(TaskKind::Cas),
            _ => None,
        }
    }

    /// Human-facing label used in exports and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Ia => "IA",
            TaskKind::Ee => "EE",
            TaskKind::Hw => "HW",
            TaskKind::Test => "Test",
            TaskKind::Revision => "Revision",
            TaskKind::Cas => "CAS",
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    NotStarted,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

impl TaskStatus {
    /// Every status, in display order.
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Done,
    ];

    /// Canonical storage form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    /// Parses the canonical storage form.
    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value {
            "not_started" => Some(TaskStatus::NotStarted),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Human-facing label used in exports and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "NotStarted",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Done => "Done",
        }
    }
}

/// Deadline-bearing unit of academic work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID used for linking and plan allocations.
    pub id: TaskId,
    pub title: String,
    /// Owning subject. Not foreign-key enforced; a deleted subject leaves
    /// the task in place and scoring falls back to the default difficulty.
    pub subject_id: SubjectId,
    pub kind: TaskKind,
    /// Due instant, always UTC.
    pub deadline: DateTime<Utc>,
    /// Remaining-effort estimate in hours. Finite, `>= 0`.
    pub estimated_hours: f64,
    /// Importance on a `1..=10` scale; scoring flattens everything from 5
    /// up to the same weight.
    pub priority: u8,
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly when `status == TaskStatus::Done`.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new task with a generated stable ID.
    ///
    /// # Invariants
    /// - `status` starts as `NotStarted` and `completed_at` as `None`.
    /// - `created_at` and `updated_at` are both set to `now`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        subject_id: SubjectId,
        kind: TaskKind,
        deadline: DateTime<Utc>,
        estimated_hours: f64,
        priority: u8,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            subject_id,
            kind,
            deadline,
            estimated_hours,
            priority,
            status: TaskStatus::NotStarted,
            notes: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Checks the write invariants for this task.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTaskTitle);
        }
        if !self.estimated_hours.is_finite() {
            return Err(ValidationError::TaskHoursNotFinite(self.estimated_hours));
        }
        if self.estimated_hours < 0.0 {
            return Err(ValidationError::TaskHoursNegative(self.estimated_hours));
        }
        if !(1..=10).contains(&self.priority) {
            return Err(ValidationError::TaskPriorityOutOfRange(self.priority));
        }
        let done = self.status == TaskStatus::Done;
        if done != self.completed_at.is_some() {
            return Err(ValidationError::TaskCompletionMismatch);
        }
        Ok(())
    }

    /// Returns whether this task still competes for plan capacity.
    pub fn is_active(&self) -> bool {
        self.status != TaskStatus::Done
    }

    /// Marks the task done and records the completion instant.
    pub fn mark_done(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Done;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Reverts a done task to `NotStarted` and clears `completed_at`.
    pub fn reopen(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::NotStarted;
        self.completed_at = None;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Task::new(
            "Chemistry IA draft",
            Uuid::new_v4(),
            TaskKind::Ia,
            now + chrono::Duration::days(5),
            4.0,
            3,
            now,
        )
    }

    #[test]
    fn new_task_is_not_started_and_valid() {
        let task = sample_task();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.completed_at.is_none());
        assert!(task.validate().is_ok());
        assert!(task.is_active());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut task = sample_task();
        task.title = "   ".into();
        assert_eq!(task.validate(), Err(ValidationError::EmptyTaskTitle));
    }

    #[test]
    fn validate_rejects_bad_estimates() {
        let mut task = sample_task();
        task.estimated_hours = f64::NAN;
        assert!(matches!(
            task.validate(),
            Err(ValidationError::TaskHoursNotFinite(_))
        ));
        task.estimated_hours = -1.0;
        assert!(matches!(
            task.validate(),
            Err(ValidationError::TaskHoursNegative(_))
        ));
    }

    #[test]
    fn validate_rejects_priority_outside_scale() {
        let mut task = sample_task();
        task.priority = 0;
        assert_eq!(task.validate(), Err(ValidationError::TaskPriorityOutOfRange(0)));
        task.priority = 11;
        assert_eq!(task.validate(), Err(ValidationError::TaskPriorityOutOfRange(11)));
        task.priority = 10;
        assert!(task.validate().is_ok());
    }

    #[test]
    fn completion_timestamp_must_match_status() {
        let mut task = sample_task();
        task.completed_at = Some(task.created_at);
        assert_eq!(task.validate(), Err(ValidationError::TaskCompletionMismatch));

        task.status = TaskStatus::Done;
        assert!(task.validate().is_ok());

        task.completed_at = None;
        assert_eq!(task.validate(), Err(ValidationError::TaskCompletionMismatch));
    }

    #[test]
    fn mark_done_and_reopen_keep_the_invariant() {
        let mut task = sample_task();
        let later = task.created_at + chrono::Duration::hours(1);

        task.mark_done(later);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(later));
        assert_eq!(task.updated_at, later);
        assert!(task.validate().is_ok());
        assert!(!task.is_active());

        let even_later = later + chrono::Duration::hours(1);
        task.reopen(even_later);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.completed_at.is_none());
        assert_eq!(task.updated_at, even_later);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn kind_and_status_round_trip_through_storage_form() {
        for kind in TaskKind::ALL {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskKind::parse("essay"), None);
        assert_eq!(TaskStatus::parse("paused"), None);
    }
}
