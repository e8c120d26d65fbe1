//! Greedy study-plan generation.
//!
//! # Responsibility
//! - Spread remaining task effort over the coming days' capacity, highest
//!   score first.
//! - Flag days (and the plan) that cannot fit what is due.
//!
//! # Invariants
//! - Allocated hours never exceed a day's capacity or a task's remaining
//!   effort; done tasks are never allocated.
//! - Output is deterministic: ties keep the input task order.
//! - The walk never exceeds sixty days; once all effort is placed it still
//!   extends to at least seven when the horizon reaches that far.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::model::settings::{NormalizedSettings, PlannerSettings};
use crate::model::subject::SubjectId;
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::plan::score::smart_score;
use crate::plan::day_end;

/// Hard ceiling on plan length, in days.
pub const MAX_PLAN_DAYS: usize = 60;
/// Days the plan keeps covering after all effort is placed.
pub const MIN_PLAN_DAYS: usize = 7;

/// Hours of one task placed on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerAllocation {
    pub task_id: TaskId,
    pub title: String,
    pub hours: f64,
}

/// One planned day with its allocations and capacity bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerDay {
    pub date: chrono::NaiveDate,
    pub allocations: Vec<PlannerAllocation>,
    /// Capacity after the daily buffer, never negative.
    pub available_hours: f64,
    pub used_hours: f64,
    /// Set when effort due by this day's end is still unplaced.
    pub overload: bool,
}

/// The generated plan.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyPlan {
    pub days: Vec<PlannerDay>,
    /// Set when the horizon ended with effort still unplaced.
    pub overloaded: bool,
}

/// Distributes remaining effort across daily capacity, highest score first.
///
/// Walks day by day from `now`'s date to the latest active deadline,
/// bounded by [`MAX_PLAN_DAYS`]. Each day allocates to the highest-scored
/// tasks with effort remaining until capacity runs out. Scores are taken
/// once at `now` so the ranking is stable across the whole plan.
pub fn generate_study_plan(
    tasks: &[Task],
    subject_difficulty: &HashMap<SubjectId, u8>,
    settings: Option<&PlannerSettings>,
    now: DateTime<Utc>,
) -> StudyPlan {
    let normalized = NormalizedSettings::from_settings(settings);

    let active: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.status != TaskStatus::Done)
        .collect();

    let Some(horizon_deadline) = active.iter().map(|task| task.deadline).max() else {
        return StudyPlan {
            days: Vec::new(),
            overloaded: false,
        };
    };
    let horizon_end_date = horizon_deadline.date_naive();

    let mut remaining: HashMap<TaskId, f64> = active
        .iter()
        .map(|task| (task.id, task.estimated_hours.max(0.0)))
        .collect();
    let scores: HashMap<TaskId, f64> = active
        .iter()
        .map(|task| {
            let difficulty = subject_difficulty.get(&task.subject_id).copied();
            (task.id, smart_score(task, difficulty, now))
        })
        .collect();

    let mut days: Vec<PlannerDay> = Vec::new();
    let mut cursor = now.date_naive();

    while cursor <= horizon_end_date && days.len() < MAX_PLAN_DAYS {
        let all_done = remaining.values().all(|hours| *hours <= 0.0);
        if all_done && days.len() >= MIN_PLAN_DAYS {
            break;
        }

        let weekday = cursor.weekday().num_days_from_sunday() as usize;
        let available_hours =
            (normalized.hours_by_day[weekday] - normalized.buffer_hours).max(0.0);
        let mut capacity_left = available_hours;

        let mut candidates: Vec<&Task> = active
            .iter()
            .copied()
            .filter(|task| remaining.get(&task.id).copied().unwrap_or(0.0) > 0.0)
            .collect();
        candidates.sort_by(|a, b| {
            let score_a = scores.get(&a.id).copied().unwrap_or(-1.0);
            let score_b = scores.get(&b.id).copied().unwrap_or(-1.0);
            score_b.total_cmp(&score_a)
        });

        let mut allocations = Vec::new();
        for task in candidates {
            if capacity_left <= 0.0 {
                break;
            }
            let task_remaining = remaining.get(&task.id).copied().unwrap_or(0.0);
            if task_remaining <= 0.0 {
                continue;
            }

            let hours = task_remaining.min(capacity_left);
            allocations.push(PlannerAllocation {
                task_id: task.id,
                title: task.title.clone(),
                hours,
            });
            remaining.insert(task.id, task_remaining - hours);
            capacity_left -= hours;
        }

        let cutoff = day_end(cursor);
        let overload = active.iter().any(|task| {
            remaining.get(&task.id).copied().unwrap_or(0.0) > 0.0 && task.deadline < cutoff
        });

        days.push(PlannerDay {
            date: cursor,
            allocations,
            available_hours,
            used_hours: available_hours - capacity_left,
            overload,
        });

        cursor += Duration::days(1);
    }

    let overloaded = remaining.values().any(|hours| *hours > 0.0);
    StudyPlan { days, overloaded }
}
