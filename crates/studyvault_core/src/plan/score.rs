//! Composite task scoring.
//!
//! # Responsibility
//! - Fold urgency, priority, effort and subject difficulty into one
//!   comparable score per task.
//!
//! # Invariants
//! - Active scores stay within `[0, 1]`; done tasks pin to `-1` so they
//!   sort behind everything.
//! - The same task, difficulty and `now` always produce the same score.

use chrono::{DateTime, Utc};

use crate::model::task::{Task, TaskStatus};

/// Hours ahead over which urgency decays from 1 to 0 (two weeks).
pub const URGENCY_WINDOW_HOURS: f64 = 336.0;
/// Difficulty assumed for tasks whose subject has none set.
pub const DEFAULT_SUBJECT_DIFFICULTY: u8 = 3;
/// Flat score bonus applied to overdue tasks, capped at 1.
pub const OVERDUE_BONUS: f64 = 0.2;

const URGENCY_WEIGHT: f64 = 0.45;
const PRIORITY_WEIGHT: f64 = 0.30;
const EFFORT_WEIGHT: f64 = 0.15;
const DIFFICULTY_WEIGHT: f64 = 0.10;

/// Scores a task for ranking.
///
/// Done tasks score `-1`. For active tasks the score is a weighted blend:
/// urgency 45%, priority 30%, effort 15%, difficulty 10%, each component
/// normalized into `[0, 1]`. Overdue tasks get a flat `+0.2`, capped at 1.
///
/// Priority is stored on a `1..=10` scale but normalizes as `(p - 1) / 4`,
/// so 5 through 10 all clamp to the top weight. Existing stores rank on
/// exactly this flattening; do not widen the divisor.
pub fn smart_score(task: &Task, subject_difficulty: Option<u8>, now: DateTime<Utc>) -> f64 {
    if task.status == TaskStatus::Done {
        return -1.0;
    }

    // Whole hours, truncated toward zero; overdue clamps to maximum urgency.
    let hours_until = (task.deadline - now).num_hours() as f64;
    let urgency = 1.0 - hours_until.clamp(0.0, URGENCY_WINDOW_HOURS) / URGENCY_WINDOW_HOURS;

    let priority = ((f64::from(task.priority) - 1.0) / 4.0).clamp(0.0, 1.0);
    let effort = (task.estimated_hours / 10.0).clamp(0.0, 1.0);

    let difficulty_level = subject_difficulty.unwrap_or(DEFAULT_SUBJECT_DIFFICULTY);
    let difficulty = ((f64::from(difficulty_level) - 1.0) / 4.0).clamp(0.0, 1.0);

    let score = URGENCY_WEIGHT * urgency
        + PRIORITY_WEIGHT * priority
        + EFFORT_WEIGHT * effort
        + DIFFICULTY_WEIGHT * difficulty;

    if task.deadline < now {
        (score + OVERDUE_BONUS).min(1.0)
    } else {
        score
    }
}
