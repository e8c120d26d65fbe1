//! Scoring, urgency triage and study-plan scheduling.
//!
//! # Responsibility
//! - Rank tasks by composite score and classify how pressing they are.
//! - Spread remaining effort across daily capacity into a study plan.
//!
//! # Invariants
//! - Everything in this module is a pure function of its inputs; `now` is
//!   always passed in, never read from a clock.
//! - Equal inputs produce identical output, including ordering.

pub mod scheduler;
pub mod score;
pub mod triage;
pub mod urgency;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// First instant of `date` in UTC.
pub(crate) fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last represented instant of `date` in UTC (23:59:59.999).
pub(crate) fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + Duration::days(1) - Duration::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_bounds_cover_the_whole_utc_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(day_start(date), Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(
            day_end(date),
            Utc.with_ymd_and_hms(2026, 3, 15, 23, 59, 59).unwrap()
                + Duration::milliseconds(999)
        );
        assert!(day_end(date) < day_start(date + Duration::days(1)));
    }
}
