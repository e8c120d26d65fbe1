//! Domain model for the study workload tracker.
//!
//! # Responsibility
//! - Define the canonical records stored in the vault: subjects, tasks,
//!   CAS/TOK/EE journal entries and planner settings.
//! - Provide validation shared by repositories and snapshot restore.
//!
//! # Invariants
//! - Every record is identified by a stable UUID, generated once.
//! - Records are validated before every write; invalid rows never reach
//!   the database.

pub mod journal;
pub mod settings;
pub mod subject;
pub mod task;

use std::error::Error;
use std::fmt;

/// Rejection reasons raised by `validate()` on the domain records.
///
/// Variants are deliberately specific so callers can surface a precise
/// message without string matching.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Task title is empty or whitespace-only.
    EmptyTaskTitle,
    /// Task estimate is NaN or infinite.
    TaskHoursNotFinite(f64),
    /// Task estimate is negative.
    TaskHoursNegative(f64),
    /// Task priority is outside `1..=10`.
    TaskPriorityOutOfRange(u8),
    /// `completed_at` disagrees with the task status.
    TaskCompletionMismatch,
    /// Subject name is empty or whitespace-only.
    EmptySubjectName,
    /// Subject difficulty is outside `1..=5`.
    SubjectDifficultyOutOfRange(u8),
    /// CAS hours must be finite and strictly positive.
    CasHoursNotPositive(f64),
    /// CAS end date precedes its start date.
    CasDateRangeInverted,
    /// Journal reflection text is empty or whitespace-only.
    EmptyReflection,
    /// TOK/EE entry title is empty or whitespace-only.
    EmptyEntryTitle,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyTaskTitle => write!(f, "task title must not be empty"),
            ValidationError::TaskHoursNotFinite(v) => {
                write!(f, "task estimated hours must be finite, got {v}")
            }
            ValidationError::TaskHoursNegative(v) => {
                write!(f, "task estimated hours must be >= 0, got {v}")
            }
            ValidationError::TaskPriorityOutOfRange(v) => {
                write!(f, "task priority must be in 1..=10, got {v}")
            }
            ValidationError::TaskCompletionMismatch => {
                write!(f, "completed_at must be set exactly when the task is done")
            }
            ValidationError::EmptySubjectName => write!(f, "subject name must not be empty"),
            ValidationError::SubjectDifficultyOutOfRange(v) => {
                write!(f, "subject difficulty must be in 1..=5, got {v}")
            }
            ValidationError::CasHoursNotPositive(v) => {
                write!(f, "CAS hours must be > 0, got {v}")
            }
            ValidationError::CasDateRangeInverted => {
                write!(f, "CAS end date must not precede its start date")
            }
            ValidationError::EmptyReflection => write!(f, "reflection must not be empty"),
            ValidationError::EmptyEntryTitle => write!(f, "entry title must not be empty"),
        }
    }
}

impl Error for ValidationError {}
