//! Versioned snapshot of the whole store.
//!
//! # Responsibility
//! - Capture every row of the working set into one serializable value.
//! - Restore a snapshot into a freshly-migrated working set.
//! - Encode/decode snapshot bytes with a version gate.
//!
//! # Invariants
//! - `version` is checked before any other field is interpreted; snapshots
//!   from a newer build are refused, never partially read.
//! - Restore goes through the repositories, so every row is re-validated.
//! - Capture uses the repositories' deterministic list orders.

use std::error::Error;
use std::fmt::{Display, Formatter};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::model::journal::{CasEntry, Journal, ReflectionEntry};
use crate::model::subject::Subject;
use crate::model::task::Task;
use crate::repo::journal_repo::{JournalRepository, SqliteJournalRepository};
use crate::repo::settings_repo::{
    SettingsRepository, SqliteSettingsRepository, PLANNER_SETTINGS_KEY,
};
use crate::repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::RepoResult;

/// Snapshot format version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug)]
pub enum SnapshotError {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
    UnsupportedVersion { found: u32, latest_supported: u32 },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "snapshot failed to encode: {err}"),
            Self::Decode(err) => write!(f, "snapshot failed to decode: {err}"),
            Self::UnsupportedVersion {
                found,
                latest_supported,
            } => write!(
                f,
                "snapshot version {found} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::UnsupportedVersion { .. } => None,
        }
    }
}

/// Complete store contents as one value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub subjects: Vec<Subject>,
    pub tasks: Vec<Task>,
    pub cas_entries: Vec<CasEntry>,
    pub tok_entries: Vec<ReflectionEntry>,
    pub ee_entries: Vec<ReflectionEntry>,
    /// Raw planner-settings payload, carried opaquely so an unreadable
    /// payload survives a save/load cycle unchanged.
    pub planner_settings: Option<String>,
}

/// Minimal probe read before the full parse, so a newer snapshot is
/// reported as a version mismatch instead of a shape mismatch.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl StoreSnapshot {
    /// An empty store at the current version.
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            subjects: Vec::new(),
            tasks: Vec::new(),
            cas_entries: Vec::new(),
            tok_entries: Vec::new(),
            ee_entries: Vec::new(),
            planner_settings: None,
        }
    }

    /// Reads every row of the working set into a snapshot.
    pub fn capture(conn: &Connection) -> RepoResult<Self> {
        let subject_repo = SqliteSubjectRepository::try_new(conn)?;
        let task_repo = SqliteTaskRepository::try_new(conn)?;
        let journal_repo = SqliteJournalRepository::try_new(conn)?;
        let settings_repo = SqliteSettingsRepository::try_new(conn)?;

        Ok(Self {
            version: SNAPSHOT_VERSION,
            subjects: subject_repo.list_subjects()?,
            tasks: task_repo.list_tasks(&TaskListQuery::default())?,
            cas_entries: journal_repo.list_cas_entries()?,
            tok_entries: journal_repo.list_reflections(Journal::Tok)?,
            ee_entries: journal_repo.list_reflections(Journal::Ee)?,
            planner_settings: settings_repo.get_setting(PLANNER_SETTINGS_KEY)?,
        })
    }

    /// Writes every snapshot row into a freshly-migrated working set.
    pub fn restore(&self, conn: &Connection) -> RepoResult<()> {
        let subject_repo = SqliteSubjectRepository::try_new(conn)?;
        let task_repo = SqliteTaskRepository::try_new(conn)?;
        let journal_repo = SqliteJournalRepository::try_new(conn)?;
        let settings_repo = SqliteSettingsRepository::try_new(conn)?;

        for subject in &self.subjects {
            subject_repo.create_subject(subject)?;
        }
        for task in &self.tasks {
            task_repo.create_task(task)?;
        }
        for entry in &self.cas_entries {
            journal_repo.create_cas_entry(entry)?;
        }
        for entry in &self.tok_entries {
            journal_repo.create_reflection(Journal::Tok, entry)?;
        }
        for entry in &self.ee_entries {
            journal_repo.create_reflection(Journal::Ee, entry)?;
        }
        if let Some(payload) = &self.planner_settings {
            settings_repo.set_setting(PLANNER_SETTINGS_KEY, payload)?;
        }

        Ok(())
    }

    /// Serializes the snapshot to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec(self).map_err(SnapshotError::Encode)
    }

    /// Parses snapshot bytes, refusing versions newer than this build.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let probe: VersionProbe = serde_json::from_slice(bytes).map_err(SnapshotError::Decode)?;
        if probe.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: probe.version,
                latest_supported: SNAPSHOT_VERSION,
            });
        }

        serde_json::from_slice(bytes).map_err(SnapshotError::Decode)
    }
}
