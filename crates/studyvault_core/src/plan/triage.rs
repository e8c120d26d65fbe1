//! Task list filtering, sorting and dashboard aggregates.
//!
//! # Responsibility
//! - Apply the task-list filters and sort orders over in-memory task sets.
//! - Derive the dashboard numbers: overdue, due today, upcoming, weekly
//!   progress.
//!
//! # Invariants
//! - Filtering and sorting never mutate tasks; they produce borrowed views.
//! - All sorts are stable, so equal keys keep creation order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::settings::WeekStart;
use crate::model::subject::{Subject, SubjectId};
use crate::model::task::{Task, TaskId, TaskKind, TaskStatus};
use crate::plan::score::smart_score;
use crate::plan::urgency::{classify, is_due_soon, is_in_week, UrgencyLabel};

/// Filter set for task listings. Empty collections mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub subject_ids: Vec<SubjectId>,
    pub kinds: Vec<TaskKind>,
    pub statuses: Vec<TaskStatus>,
    /// Keep only active tasks due within the next seven days (overdue
    /// included).
    pub due_soon_only: bool,
    /// Case-insensitive title substring.
    pub search: String,
}

/// Available sort orders for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    /// Earliest deadline first.
    Deadline,
    /// Highest priority first, earliest deadline breaking ties.
    Priority,
    /// Subject name, ascending; tasks of unknown subjects sort first.
    Subject,
    /// Highest composite score first.
    Score,
}

/// Applies `filters` over `tasks`, preserving input order.
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    filters: &TaskFilters,
    now: DateTime<Utc>,
) -> Vec<&'a Task> {
    let needle = filters.search.trim().to_lowercase();

    tasks
        .iter()
        .filter(|task| {
            (filters.subject_ids.is_empty() || filters.subject_ids.contains(&task.subject_id))
                && (filters.kinds.is_empty() || filters.kinds.contains(&task.kind))
                && (filters.statuses.is_empty() || filters.statuses.contains(&task.status))
                && (!filters.due_soon_only || is_due_soon(task, now))
                && (needle.is_empty() || task.title.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Sorts a filtered view in place. All orders are stable.
pub fn sort_tasks(
    tasks: &mut [&Task],
    sort: TaskSort,
    subjects: &[Subject],
    subject_difficulty: &HashMap<SubjectId, u8>,
    now: DateTime<Utc>,
) {
    match sort {
        TaskSort::Deadline => tasks.sort_by_key(|task| task.deadline),
        TaskSort::Priority => tasks.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.deadline.cmp(&b.deadline))
        }),
        TaskSort::Subject => {
            let names: HashMap<SubjectId, &str> = subjects
                .iter()
                .map(|subject| (subject.id, subject.name.as_str()))
                .collect();
            tasks.sort_by(|a, b| {
                let name_a = names.get(&a.subject_id).copied().unwrap_or("");
                let name_b = names.get(&b.subject_id).copied().unwrap_or("");
                name_a.cmp(name_b)
            });
        }
        TaskSort::Score => {
            let scores: HashMap<TaskId, f64> = tasks
                .iter()
                .map(|task| {
                    let difficulty = subject_difficulty.get(&task.subject_id).copied();
                    (task.id, smart_score(task, difficulty, now))
                })
                .collect();
            tasks.sort_by(|a, b| {
                let score_a = scores.get(&a.id).copied().unwrap_or(-1.0);
                let score_b = scores.get(&b.id).copied().unwrap_or(-1.0);
                score_b.total_cmp(&score_a)
            });
        }
    }
}

/// Active tasks whose deadline has passed.
pub fn overdue_tasks<'a>(tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| classify(task, now) == UrgencyLabel::Overdue)
        .collect()
}

/// Active tasks due on `now`'s UTC calendar day.
pub fn due_today_tasks<'a>(tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| classify(task, now) == UrgencyLabel::Today)
        .collect()
}

/// The next `limit` active tasks by deadline, overdue ones first.
pub fn upcoming_tasks<'a>(tasks: &'a [Task], limit: usize) -> Vec<&'a Task> {
    let mut active: Vec<&Task> = tasks.iter().filter(|task| task.is_active()).collect();
    active.sort_by_key(|task| task.deadline);
    active.truncate(limit);
    active
}

/// Completion summary for the current calendar week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekProgress {
    pub completed: usize,
    pub total: usize,
    /// Rounded percentage; zero when the week holds no tasks.
    pub percent: u32,
}

/// Counts this week's tasks and how many are already done.
pub fn week_progress(tasks: &[Task], week_start: WeekStart, now: DateTime<Utc>) -> WeekProgress {
    let in_week: Vec<&Task> = tasks
        .iter()
        .filter(|task| is_in_week(task, week_start, now))
        .collect();

    let total = in_week.len();
    let completed = in_week
        .iter()
        .filter(|task| task.status == TaskStatus::Done)
        .count();
    let percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    WeekProgress {
        completed,
        total,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap()
    }

    fn task(title: &str, subject_id: SubjectId, kind: TaskKind, due_in_hours: i64) -> Task {
        let now = fixed_now();
        Task::new(
            title,
            subject_id,
            kind,
            now + Duration::hours(due_in_hours),
            2.0,
            3,
            now,
        )
    }

    #[test]
    fn filters_compose_and_preserve_order() {
        let now = fixed_now();
        let maths = Uuid::new_v4();
        let english = Uuid::new_v4();

        let mut essay = task("Comparative essay", english, TaskKind::Ee, 30);
        essay.priority = 5;
        let problem_set = task("Problem set 4", maths, TaskKind::Hw, 50);
        let mut old_essay = task("Essay rewrite", english, TaskKind::Ee, 20);
        old_essay.mark_done(now);
        let far_test = task("Mock exam ESSAY prep", maths, TaskKind::Test, 24 * 10);

        let tasks = vec![essay.clone(), problem_set.clone(), old_essay.clone(), far_test.clone()];

        let by_kind = filter_tasks(
            &tasks,
            &TaskFilters {
                kinds: vec![TaskKind::Ee],
                ..TaskFilters::default()
            },
            now,
        );
        assert_eq!(
            by_kind.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![essay.id, old_essay.id]
        );

        let due_soon = filter_tasks(
            &tasks,
            &TaskFilters {
                due_soon_only: true,
                ..TaskFilters::default()
            },
            now,
        );
        // Done and beyond-the-week tasks drop out.
        assert_eq!(
            due_soon.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![essay.id, problem_set.id]
        );

        let searched = filter_tasks(
            &tasks,
            &TaskFilters {
                search: "essay".into(),
                ..TaskFilters::default()
            },
            now,
        );
        assert_eq!(searched.len(), 3);

        let by_subject_and_status = filter_tasks(
            &tasks,
            &TaskFilters {
                subject_ids: vec![english],
                statuses: vec![TaskStatus::Done],
                ..TaskFilters::default()
            },
            now,
        );
        assert_eq!(
            by_subject_and_status.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![old_essay.id]
        );
    }

    #[test]
    fn priority_sort_breaks_ties_by_deadline() {
        let now = fixed_now();
        let subject = Uuid::new_v4();

        let mut later_high = task("later high", subject, TaskKind::Hw, 72);
        later_high.priority = 5;
        let mut sooner_high = task("sooner high", subject, TaskKind::Hw, 24);
        sooner_high.priority = 5;
        let low = task("low", subject, TaskKind::Hw, 1);

        let tasks = vec![later_high.clone(), sooner_high.clone(), low.clone()];
        let mut view: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut view, TaskSort::Priority, &[], &HashMap::new(), now);

        let order: Vec<TaskId> = view.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![sooner_high.id, later_high.id, low.id]);
    }

    #[test]
    fn subject_sort_places_unknown_subjects_first() {
        let now = fixed_now();
        let chemistry = Subject::new("Chemistry", now);
        let art = Subject::new("Art", now);

        let orphaned = task("orphaned", Uuid::new_v4(), TaskKind::Hw, 10);
        let in_chem = task("chem", chemistry.id, TaskKind::Hw, 10);
        let in_art = task("art", art.id, TaskKind::Hw, 10);

        let tasks = vec![in_chem.clone(), orphaned.clone(), in_art.clone()];
        let mut view: Vec<&Task> = tasks.iter().collect();
        sort_tasks(
            &mut view,
            TaskSort::Subject,
            &[chemistry, art],
            &HashMap::new(),
            now,
        );

        let order: Vec<TaskId> = view.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![orphaned.id, in_art.id, in_chem.id]);
    }

    #[test]
    fn score_sort_is_stable_for_equal_scores() {
        let now = fixed_now();
        let subject = Uuid::new_v4();

        let first = task("first", subject, TaskKind::Hw, 24);
        let twin = task("twin", subject, TaskKind::Hw, 24);
        let tasks = vec![first.clone(), twin.clone()];

        let mut view: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut view, TaskSort::Score, &[], &HashMap::new(), now);

        let order: Vec<TaskId> = view.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![first.id, twin.id]);
    }

    #[test]
    fn dashboard_aggregates_count_the_right_tasks() {
        let now = fixed_now();
        let subject = Uuid::new_v4();

        let overdue = task("overdue", subject, TaskKind::Hw, -5);
        let today = task("today", subject, TaskKind::Hw, 6);
        let tomorrow = task("tomorrow", subject, TaskKind::Hw, 30);
        let mut done_this_week = task("done", subject, TaskKind::Hw, 48);
        done_this_week.mark_done(now);

        let tasks = vec![
            overdue.clone(),
            today.clone(),
            tomorrow.clone(),
            done_this_week.clone(),
        ];

        assert_eq!(
            overdue_tasks(&tasks, now).iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![overdue.id]
        );
        assert_eq!(
            due_today_tasks(&tasks, now).iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![today.id]
        );

        let upcoming = upcoming_tasks(&tasks, 2);
        assert_eq!(
            upcoming.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![overdue.id, today.id]
        );

        let progress = week_progress(&tasks, WeekStart::Monday, now);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.percent, 25);
    }

    #[test]
    fn week_progress_is_zero_for_an_empty_week() {
        let now = fixed_now();
        let subject = Uuid::new_v4();
        let far = task("far away", subject, TaskKind::Hw, 24 * 30);

        let progress = week_progress(&[far], WeekStart::Monday, now);
        assert_eq!(progress, WeekProgress::default());
    }
}
