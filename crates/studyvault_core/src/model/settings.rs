//! Planner settings model.
//!
//! # Responsibility
//! - Define the stored shape of daily-capacity settings.
//! - Normalize partial/legacy payloads into a fully-populated form the
//!   scheduler can index directly.
//!
//! # Invariants
//! - Normalized capacity covers all seven weekdays, Sunday first.
//! - The normalized buffer is never negative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default study capacity per weekday, Sunday first.
pub const DEFAULT_HOURS_BY_DAY: [f64; 7] = [1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 1.0];

/// Default daily buffer subtracted from capacity before planning.
pub const DEFAULT_BUFFER_HOURS: f64 = 0.5;

/// First day of the week for weekly aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    Monday,
    Sunday,
}

impl WeekStart {
    /// Index of the week's first day, counted with Sunday as 0.
    pub fn first_day_from_sunday(self) -> u32 {
        match self {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Monday
    }
}

/// Stored planner settings.
///
/// The map may be sparse; missing weekdays fall back to the defaults at
/// normalization time. Serde defaults deliberately mirror how partial
/// payloads are read back: an absent buffer reads as `0`, not as the
/// fresh-store default of `0.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Capacity per weekday, keyed `0..=6` with Sunday as 0.
    #[serde(default)]
    pub hours_by_day: BTreeMap<u8, f64>,
    /// Hours reserved each day before allocation.
    #[serde(default)]
    pub buffer_hours: f64,
    #[serde(default)]
    pub week_start: WeekStart,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            hours_by_day: DEFAULT_HOURS_BY_DAY
                .iter()
                .enumerate()
                .map(|(i, h)| (i as u8, *h))
                .collect(),
            buffer_hours: DEFAULT_BUFFER_HOURS,
            week_start: WeekStart::Monday,
        }
    }
}

/// Fully-populated settings, ready for direct weekday indexing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSettings {
    /// Capacity per weekday, Sunday first.
    pub hours_by_day: [f64; 7],
    /// Clamped to `>= 0`.
    pub buffer_hours: f64,
    pub week_start: WeekStart,
}

impl NormalizedSettings {
    /// Normalizes optional stored settings into the indexable form.
    ///
    /// Stored weekday overrides are merged over the defaults; keys outside
    /// `0..=6` are ignored. `None` yields the fresh-store defaults.
    pub fn from_settings(settings: Option<&PlannerSettings>) -> Self {
        let mut hours_by_day = DEFAULT_HOURS_BY_DAY;
        match settings {
            None => Self {
                hours_by_day,
                buffer_hours: DEFAULT_BUFFER_HOURS,
                week_start: WeekStart::Monday,
            },
            Some(s) => {
                for (day, hours) in &s.hours_by_day {
                    if let Some(slot) = hours_by_day.get_mut(*day as usize) {
                        *slot = *hours;
                    }
                }
                Self {
                    hours_by_day,
                    buffer_hours: s.buffer_hours.max(0.0),
                    week_start: s.week_start,
                }
            }
        }
    }
}
