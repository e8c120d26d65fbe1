//! Deadline proximity classification.
//!
//! # Responsibility
//! - Label each task by how pressing its deadline is.
//! - Provide the week-window predicates used by dashboards and filters.
//!
//! # Invariants
//! - Labels are mutually exclusive; the first matching rule wins and done
//!   always wins over everything.
//! - Calendar comparisons ("today", week bounds) use UTC days.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::model::settings::WeekStart;
use crate::model::task::{Task, TaskStatus};
use crate::plan::{day_end, day_start};

/// Window for the `Soon` label, in whole hours.
pub const SOON_WINDOW_HOURS: i64 = 48;
/// Window for the `Week` label and the due-soon filter, in days.
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// How pressing a task's deadline is, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyLabel {
    Overdue,
    Today,
    Soon,
    Week,
    Normal,
    Done,
}

impl UrgencyLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyLabel::Overdue => "overdue",
            UrgencyLabel::Today => "today",
            UrgencyLabel::Soon => "soon",
            UrgencyLabel::Week => "week",
            UrgencyLabel::Normal => "normal",
            UrgencyLabel::Done => "done",
        }
    }
}

impl std::fmt::Display for UrgencyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a task's deadline pressure.
///
/// Rules apply in order: done, overdue (strictly before `now`), today
/// (same UTC calendar day), soon (within 48 whole hours), week (within the
/// next seven days inclusive), normal.
pub fn classify(task: &Task, now: DateTime<Utc>) -> UrgencyLabel {
    if task.status == TaskStatus::Done {
        return UrgencyLabel::Done;
    }
    if task.deadline < now {
        return UrgencyLabel::Overdue;
    }
    if task.deadline.date_naive() == now.date_naive() {
        return UrgencyLabel::Today;
    }
    if (task.deadline - now).num_hours() <= SOON_WINDOW_HOURS {
        return UrgencyLabel::Soon;
    }
    if task.deadline <= now + Duration::days(WEEK_WINDOW_DAYS) {
        return UrgencyLabel::Week;
    }
    UrgencyLabel::Normal
}

/// Whether a task belongs in the seven-day "due soon" filter.
///
/// Overdue tasks qualify; done tasks never do.
pub fn is_due_soon(task: &Task, now: DateTime<Utc>) -> bool {
    task.status != TaskStatus::Done && task.deadline <= now + Duration::days(WEEK_WINDOW_DAYS)
}

/// First and last instant of the calendar week containing `now`.
pub fn week_range(now: DateTime<Utc>, week_start: WeekStart) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let weekday = today.weekday().num_days_from_sunday();
    let back = (7 + weekday - week_start.first_day_from_sunday()) % 7;

    let first_day = today - Duration::days(i64::from(back));
    let last_day = first_day + Duration::days(6);
    (day_start(first_day), day_end(last_day))
}

/// Whether a task's deadline falls inside the current calendar week.
///
/// Deliberately ignores status: weekly progress counts done tasks too.
pub fn is_in_week(task: &Task, week_start: WeekStart, now: DateTime<Utc>) -> bool {
    let (start, end) = week_range(now, week_start);
    start <= task.deadline && task.deadline <= end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskKind;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn fixed_now() -> DateTime<Utc> {
        // A Sunday, 15:00 UTC.
        Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap()
    }

    fn task_due_at(deadline: DateTime<Utc>) -> Task {
        Task::new(
            "classified task",
            Uuid::new_v4(),
            TaskKind::Hw,
            deadline,
            1.0,
            3,
            fixed_now(),
        )
    }

    #[test]
    fn done_wins_over_every_deadline() {
        let now = fixed_now();
        let mut task = task_due_at(now - Duration::days(3));
        task.mark_done(now);
        assert_eq!(classify(&task, now), UrgencyLabel::Done);
    }

    #[test]
    fn labels_follow_rule_order() {
        let now = fixed_now();

        let overdue = task_due_at(now - Duration::hours(1));
        assert_eq!(classify(&overdue, now), UrgencyLabel::Overdue);

        let tonight = task_due_at(now + Duration::hours(8));
        assert_eq!(classify(&tonight, now), UrgencyLabel::Today);

        let in_two_days = task_due_at(now + Duration::hours(40));
        assert_eq!(classify(&in_two_days, now), UrgencyLabel::Soon);

        let this_week = task_due_at(now + Duration::days(6));
        assert_eq!(classify(&this_week, now), UrgencyLabel::Week);

        let next_month = task_due_at(now + Duration::days(30));
        assert_eq!(classify(&next_month, now), UrgencyLabel::Normal);
    }

    #[test]
    fn deadline_exactly_now_counts_as_today() {
        let now = fixed_now();
        let task = task_due_at(now);
        assert_eq!(classify(&task, now), UrgencyLabel::Today);
    }

    #[test]
    fn soon_boundary_uses_truncated_hours() {
        let now = fixed_now();
        // 48.5 hours away truncates to 48, which still counts as soon.
        let boundary = task_due_at(now + Duration::hours(48) + Duration::minutes(30));
        assert_eq!(classify(&boundary, now), UrgencyLabel::Soon);

        let past_boundary = task_due_at(now + Duration::hours(49));
        assert_ne!(classify(&past_boundary, now), UrgencyLabel::Soon);
    }

    #[test]
    fn week_window_is_inclusive_of_the_boundary() {
        let now = fixed_now();
        let on_boundary = task_due_at(now + Duration::days(7));
        assert_eq!(classify(&on_boundary, now), UrgencyLabel::Week);

        let beyond = task_due_at(now + Duration::days(7) + Duration::milliseconds(1));
        assert_eq!(classify(&beyond, now), UrgencyLabel::Normal);
    }

    #[test]
    fn due_soon_filter_includes_overdue_but_not_done() {
        let now = fixed_now();
        let overdue = task_due_at(now - Duration::days(2));
        assert!(is_due_soon(&overdue, now));

        let mut finished = task_due_at(now + Duration::days(1));
        finished.mark_done(now);
        assert!(!is_due_soon(&finished, now));

        let far = task_due_at(now + Duration::days(8));
        assert!(!is_due_soon(&far, now));
    }

    #[test]
    fn week_range_respects_the_configured_start() {
        let now = fixed_now(); // Sunday 2026-03-01.

        let (mon_start, mon_end) = week_range(now, WeekStart::Monday);
        // Monday-start week containing a Sunday began six days earlier.
        assert_eq!(mon_start, Utc.with_ymd_and_hms(2026, 2, 23, 0, 0, 0).unwrap());
        assert_eq!(
            mon_end,
            Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );

        let (sun_start, sun_end) = week_range(now, WeekStart::Sunday);
        assert_eq!(sun_start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(
            sun_end,
            Utc.with_ymd_and_hms(2026, 3, 7, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn week_membership_counts_done_tasks() {
        let now = fixed_now();
        let mut task = task_due_at(now + Duration::days(2));
        task.mark_done(now);
        assert!(is_in_week(&task, WeekStart::Sunday, now));
    }
}
