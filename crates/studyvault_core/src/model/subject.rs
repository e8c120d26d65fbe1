//! Subject domain model.
//!
//! # Responsibility
//! - Define the course/subject record tasks attach to.
//! - Provide the difficulty lookup used by scoring.
//!
//! # Invariants
//! - `id` is stable and never reused for another subject.
//! - `difficulty`, when set, stays within `1..=5`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ValidationError;

/// Stable identifier for a subject.
pub type SubjectId = Uuid;

/// A course or study area that tasks belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// Optional display colour, e.g. `#7c3aed`. Opaque to the core.
    pub color: Option<String>,
    /// Perceived difficulty on a `1..=5` scale; scoring substitutes a
    /// neutral default when unset.
    pub difficulty: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subject {
    /// Creates a new subject with a generated stable ID.
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: None,
            difficulty: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the write invariants for this subject.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptySubjectName);
        }
        if let Some(d) = self.difficulty {
            if !(1..=5).contains(&d) {
                return Err(ValidationError::SubjectDifficultyOutOfRange(d));
            }
        }
        Ok(())
    }
}

/// Builds the difficulty lookup used by scoring and planning.
///
/// Subjects without an explicit difficulty are omitted; consumers fall back
/// to the scoring default on a missing key.
pub fn difficulty_by_subject(subjects: &[Subject]) -> HashMap<SubjectId, u8> {
    subjects
        .iter()
        .filter_map(|s| s.difficulty.map(|d| (s.id, d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn validate_checks_name_and_difficulty() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut subject = Subject::new("Physics HL", now);
        assert!(subject.validate().is_ok());

        subject.difficulty = Some(5);
        assert!(subject.validate().is_ok());

        subject.difficulty = Some(0);
        assert_eq!(
            subject.validate(),
            Err(ValidationError::SubjectDifficultyOutOfRange(0))
        );

        subject.difficulty = None;
        subject.name = " ".into();
        assert_eq!(subject.validate(), Err(ValidationError::EmptySubjectName));
    }

    #[test]
    fn difficulty_map_skips_unset_subjects() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let mut physics = Subject::new("Physics HL", now);
        physics.difficulty = Some(4);
        let english = Subject::new("English A", now);

        let map = difficulty_by_subject(&[physics.clone(), english.clone()]);
        assert_eq!(map.get(&physics.id), Some(&4));
        assert_eq!(map.get(&english.id), None);
    }
}
