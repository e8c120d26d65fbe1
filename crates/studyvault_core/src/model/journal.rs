//! CAS, TOK and EE journal models.
//!
//! # Responsibility
//! - Define the reflective-log records kept alongside tasks: CAS activity
//!   entries and dated TOK/EE reflections.
//! - Aggregate CAS hours per strand for progress reporting.
//!
//! # Invariants
//! - CAS hours are finite and strictly positive.
//! - A CAS end date, when present, never precedes the start date.
//! - TOK and EE entries share one shape and differ only by journal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::ValidationError;

/// Stable identifier for a journal entry of any kind.
pub type EntryId = Uuid;

/// The three CAS strands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasStrand {
    Creativity,
    Activity,
    Service,
}

impl CasStrand {
    /// Every strand, in display order.
    pub const ALL: [CasStrand; 3] = [
        CasStrand::Creativity,
        CasStrand::Activity,
        CasStrand::Service,
    ];

    /// Canonical storage form, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            CasStrand::Creativity => "creativity",
            CasStrand::Activity => "activity",
            CasStrand::Service => "service",
        }
    }

    /// Parses the canonical storage form.
    pub fn parse(value: &str) -> Option<CasStrand> {
        match value {
            "creativity" => Some(CasStrand::Creativity),
            "activity" => Some(CasStrand::Activity),
            "service" => Some(CasStrand::Service),
            _ => None,
        }
    }

    /// Human-facing label used in exports and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            CasStrand::Creativity => "Creativity",
            CasStrand::Activity => "Activity",
            CasStrand::Service => "Service",
        }
    }
}

/// One logged CAS activity with hours and a reflection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasEntry {
    pub id: EntryId,
    pub strand: CasStrand,
    pub date_start: NaiveDate,
    /// Set for multi-day activities; `None` means a single day.
    pub date_end: Option<NaiveDate>,
    /// Hours spent. Finite, `> 0`.
    pub hours: f64,
    pub reflection: String,
    /// Free-form link or note pointing at evidence.
    pub evidence_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CasEntry {
    /// Creates a new CAS entry with a generated stable ID.
    pub fn new(
        strand: CasStrand,
        date_start: NaiveDate,
        hours: f64,
        reflection: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            strand,
            date_start,
            date_end: None,
            hours,
            reflection: reflection.into(),
            evidence_uri: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the write invariants for this entry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.hours.is_finite() || self.hours <= 0.0 {
            return Err(ValidationError::CasHoursNotPositive(self.hours));
        }
        if let Some(end) = self.date_end {
            if end < self.date_start {
                return Err(ValidationError::CasDateRangeInverted);
            }
        }
        if self.reflection.trim().is_empty() {
            return Err(ValidationError::EmptyReflection);
        }
        Ok(())
    }
}

/// Which reflective journal a `ReflectionEntry` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Journal {
    Tok,
    Ee,
}

impl Journal {
    /// Human-facing label used in exports and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Journal::Tok => "TOK",
            Journal::Ee => "EE",
        }
    }
}

/// A dated reflection in the TOK or EE journal.
///
/// The journal itself is not part of the record; the two journals are
/// stored and queried separately and share this one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub title: String,
    pub reflection: String,
    pub evidence_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReflectionEntry {
    /// Creates a new reflection with a generated stable ID.
    pub fn new(
        date: NaiveDate,
        title: impl Into<String>,
        reflection: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            title: title.into(),
            reflection: reflection.into(),
            evidence_uri: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the write invariants for this entry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyEntryTitle);
        }
        if self.reflection.trim().is_empty() {
            return Err(ValidationError::EmptyReflection);
        }
        Ok(())
    }
}

/// CAS hour totals, overall and per strand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CasTotals {
    pub total: f64,
    pub creativity: f64,
    pub activity: f64,
    pub service: f64,
}

impl CasTotals {
    /// Sums hours across entries, bucketed by strand.
    pub fn from_entries(entries: &[CasEntry]) -> Self {
        let mut totals = CasTotals::default();
        for entry in entries {
            totals.total += entry.hours;
            match entry.strand {
                CasStrand::Creativity => totals.creativity += entry.hours,
                CasStrand::Activity => totals.activity += entry.hours,
                CasStrand::Service => totals.service += entry.hours,
            }
        }
        totals
    }

    /// Hours logged for one strand.
    pub fn for_strand(&self, strand: CasStrand) -> f64 {
        match strand {
            CasStrand::Creativity => self.creativity,
            CasStrand::Activity => self.activity,
            CasStrand::Service => self.service,
        }
    }
}
