//! Unlocked vault session.
//!
//! # Responsibility
//! - Run the unlock state machine: create, migrate or open the store.
//! - Expose read and write entry points over the in-memory working set.
//! - Re-encrypt and persist the store after every successful mutation.
//!
//! # Invariants
//! - A `Session` only exists after the passphrase was proven against the
//!   store; there is no half-unlocked state.
//! - Every mutation returns only after the encrypted blob was atomically
//!   rewritten; dropping a session loses nothing.
//! - Dropping a session wipes the derived key.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use rusqlite::Connection;

use crate::crypto::{self, derive_key, generate_salt, EncryptionKey};
use crate::db::{open_memory_db, DbError};
use crate::model::journal::{CasEntry, CasTotals, EntryId, Journal, ReflectionEntry};
use crate::model::settings::PlannerSettings;
use crate::model::subject::{difficulty_by_subject, Subject, SubjectId};
use crate::model::task::{Task, TaskId, TaskStatus};
use crate::plan::scheduler::{generate_study_plan, StudyPlan};
use crate::repo::journal_repo::{JournalRepository, SqliteJournalRepository};
use crate::repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
use crate::repo::subject_repo::{SqliteSubjectRepository, SubjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskListQuery, TaskRepository};
use crate::repo::RepoError;
use crate::vault::{StoreSnapshot, Vault, VaultError, VaultStatus};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug)]
pub enum SessionError {
    Vault(VaultError),
    Db(DbError),
    Repo(RepoError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vault(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Vault(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<VaultError> for SessionError {
    fn from(value: VaultError) -> Self {
        Self::Vault(value)
    }
}

impl From<DbError> for SessionError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// An unlocked store: decrypted working set plus the key to write it back.
#[derive(Debug)]
pub struct Session {
    vault: Vault,
    conn: Connection,
    key: EncryptionKey,
}

impl Session {
    /// Unlocks the vault with `secret`, handling all three store states.
    ///
    /// - No store file: creates an empty store and seals it immediately.
    /// - Store without salt: reads the legacy plaintext snapshot, then
    ///   encrypts it in place under a fresh salt.
    /// - Store and salt: decrypts and authenticates the blob; a wrong
    ///   passphrase surfaces as [`VaultError::Authentication`].
    pub fn unlock(vault: &Vault, secret: &str) -> SessionResult<Session> {
        let started_at = Instant::now();
        let status = vault.status();
        let mode = unlock_mode(status);
        info!("event=vault_unlock module=session status=start mode={mode}");

        let result = match status {
            VaultStatus::Absent => Self::create_new(vault, secret),
            VaultStatus::LegacyPlaintext => Self::migrate_legacy(vault, secret),
            VaultStatus::Encrypted => Self::open_encrypted(vault, secret),
        };

        match &result {
            Ok(_) => info!(
                "event=vault_unlock module=session status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=vault_unlock module=session status=error mode={mode} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }

        result
    }

    fn create_new(vault: &Vault, secret: &str) -> SessionResult<Session> {
        let salt = generate_salt();
        vault.write_salt(&salt)?;

        let key = derive_key(secret, &salt);
        let conn = open_memory_db()?;
        let session = Session {
            vault: vault.clone(),
            conn,
            key,
        };
        session.persist()?;
        Ok(session)
    }

    fn migrate_legacy(vault: &Vault, secret: &str) -> SessionResult<Session> {
        // Parse the plaintext before touching anything on disk, so a
        // corrupt legacy store aborts the migration with no side effects.
        let plaintext = vault.read_store()?;
        let snapshot = StoreSnapshot::decode(&plaintext).map_err(VaultError::from)?;

        let conn = open_memory_db()?;
        snapshot.restore(&conn)?;

        let salt = generate_salt();
        vault.write_salt(&salt)?;
        let key = derive_key(secret, &salt);

        let session = Session {
            vault: vault.clone(),
            conn,
            key,
        };
        session.persist()?;
        info!("event=vault_migrate module=session status=ok tasks={}", snapshot.tasks.len());
        Ok(session)
    }

    fn open_encrypted(vault: &Vault, secret: &str) -> SessionResult<Session> {
        let salt = vault.read_salt()?;
        let key = derive_key(secret, &salt);

        let blob = vault.read_store()?;
        let plaintext = crypto::open_blob(&blob, &key).map_err(VaultError::from)?;
        let snapshot = StoreSnapshot::decode(&plaintext).map_err(VaultError::from)?;

        let conn = open_memory_db()?;
        snapshot.restore(&conn)?;

        Ok(Session {
            vault: vault.clone(),
            conn,
            key,
        })
    }

    /// Captures, seals and atomically rewrites the store blob.
    fn persist(&self) -> SessionResult<()> {
        let started_at = Instant::now();
        let snapshot = StoreSnapshot::capture(&self.conn)?;
        let bytes = snapshot.encode().map_err(VaultError::from)?;
        let blob = crypto::seal_blob(&bytes, &self.key).map_err(VaultError::from)?;

        match self.vault.write_store(&blob) {
            Ok(()) => {
                debug!(
                    "event=store_persist module=session status=ok bytes={} duration_ms={}",
                    blob.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_persist module=session status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err.into())
            }
        }
    }

    /// The vault this session writes back to.
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Ends the session, wiping the derived key.
    pub fn logout(self) {
        info!("event=vault_logout module=session status=ok");
    }

    // Reads.

    /// All tasks in creation order.
    pub fn tasks(&self) -> SessionResult<Vec<Task>> {
        self.tasks_matching(&TaskListQuery::default())
    }

    /// Tasks matching `query`, in creation order.
    pub fn tasks_matching(&self, query: &TaskListQuery) -> SessionResult<Vec<Task>> {
        let repo = SqliteTaskRepository::try_new(&self.conn)?;
        Ok(repo.list_tasks(query)?)
    }

    pub fn task(&self, id: TaskId) -> SessionResult<Option<Task>> {
        let repo = SqliteTaskRepository::try_new(&self.conn)?;
        Ok(repo.get_task(id)?)
    }

    /// All subjects, ordered by name.
    pub fn subjects(&self) -> SessionResult<Vec<Subject>> {
        let repo = SqliteSubjectRepository::try_new(&self.conn)?;
        Ok(repo.list_subjects()?)
    }

    pub fn subject(&self, id: SubjectId) -> SessionResult<Option<Subject>> {
        let repo = SqliteSubjectRepository::try_new(&self.conn)?;
        Ok(repo.get_subject(id)?)
    }

    /// All CAS entries, newest first.
    pub fn cas_entries(&self) -> SessionResult<Vec<CasEntry>> {
        let repo = SqliteJournalRepository::try_new(&self.conn)?;
        Ok(repo.list_cas_entries()?)
    }

    /// CAS hour totals, overall and per strand.
    pub fn cas_totals(&self) -> SessionResult<CasTotals> {
        Ok(CasTotals::from_entries(&self.cas_entries()?))
    }

    /// TOK or EE entries, newest first.
    pub fn reflections(&self, journal: Journal) -> SessionResult<Vec<ReflectionEntry>> {
        let repo = SqliteJournalRepository::try_new(&self.conn)?;
        Ok(repo.list_reflections(journal)?)
    }

    /// Stored planner settings, if any readable ones exist.
    pub fn planner_settings(&self) -> SessionResult<Option<PlannerSettings>> {
        let repo = SqliteSettingsRepository::try_new(&self.conn)?;
        Ok(repo.planner_settings()?)
    }

    /// Builds the study plan for the current store contents.
    pub fn study_plan(&self, now: DateTime<Utc>) -> SessionResult<StudyPlan> {
        let tasks = self.tasks()?;
        let subjects = self.subjects()?;
        let difficulty = difficulty_by_subject(&subjects);
        let settings = self.planner_settings()?;
        let plan = generate_study_plan(&tasks, &difficulty, settings.as_ref(), now);
        debug!(
            "event=plan_generate module=session status=ok tasks={} days={} overloaded={}",
            tasks.len(),
            plan.days.len(),
            plan.overloaded
        );
        Ok(plan)
    }

    // Writes. Every method persists the sealed store before returning.

    pub fn create_subject(&mut self, subject: &Subject) -> SessionResult<SubjectId> {
        let id = SqliteSubjectRepository::try_new(&self.conn)?.create_subject(subject)?;
        self.persist()?;
        Ok(id)
    }

    pub fn update_subject(&mut self, subject: &Subject) -> SessionResult<()> {
        SqliteSubjectRepository::try_new(&self.conn)?.update_subject(subject)?;
        self.persist()
    }

    /// Deletes a subject. Tasks keep their `subject_id`; scoring falls back
    /// to the default difficulty for them.
    pub fn delete_subject(&mut self, id: SubjectId) -> SessionResult<()> {
        SqliteSubjectRepository::try_new(&self.conn)?.delete_subject(id)?;
        self.persist()
    }

    pub fn create_task(&mut self, task: &Task) -> SessionResult<TaskId> {
        let id = SqliteTaskRepository::try_new(&self.conn)?.create_task(task)?;
        self.persist()?;
        Ok(id)
    }

    pub fn update_task(&mut self, task: &Task) -> SessionResult<()> {
        SqliteTaskRepository::try_new(&self.conn)?.update_task(task)?;
        self.persist()
    }

    pub fn delete_task(&mut self, id: TaskId) -> SessionResult<()> {
        SqliteTaskRepository::try_new(&self.conn)?.delete_task(id)?;
        self.persist()
    }

    /// Flips a task between done and not-started, returning the new status.
    pub fn toggle_task(&mut self, id: TaskId, now: DateTime<Utc>) -> SessionResult<TaskStatus> {
        let status = SqliteTaskRepository::try_new(&self.conn)?.toggle_task_status(id, now)?;
        self.persist()?;
        Ok(status)
    }

    pub fn create_cas_entry(&mut self, entry: &CasEntry) -> SessionResult<EntryId> {
        let id = SqliteJournalRepository::try_new(&self.conn)?.create_cas_entry(entry)?;
        self.persist()?;
        Ok(id)
    }

    pub fn update_cas_entry(&mut self, entry: &CasEntry) -> SessionResult<()> {
        SqliteJournalRepository::try_new(&self.conn)?.update_cas_entry(entry)?;
        self.persist()
    }

    pub fn delete_cas_entry(&mut self, id: EntryId) -> SessionResult<()> {
        SqliteJournalRepository::try_new(&self.conn)?.delete_cas_entry(id)?;
        self.persist()
    }

    pub fn create_reflection(
        &mut self,
        journal: Journal,
        entry: &ReflectionEntry,
    ) -> SessionResult<EntryId> {
        let id = SqliteJournalRepository::try_new(&self.conn)?.create_reflection(journal, entry)?;
        self.persist()?;
        Ok(id)
    }

    pub fn update_reflection(
        &mut self,
        journal: Journal,
        entry: &ReflectionEntry,
    ) -> SessionResult<()> {
        SqliteJournalRepository::try_new(&self.conn)?.update_reflection(journal, entry)?;
        self.persist()
    }

    pub fn delete_reflection(&mut self, journal: Journal, id: EntryId) -> SessionResult<()> {
        SqliteJournalRepository::try_new(&self.conn)?.delete_reflection(journal, id)?;
        self.persist()
    }

    pub fn save_planner_settings(&mut self, settings: &PlannerSettings) -> SessionResult<()> {
        SqliteSettingsRepository::try_new(&self.conn)?.save_planner_settings(settings)?;
        self.persist()
    }
}

fn unlock_mode(status: VaultStatus) -> &'static str {
    match status {
        VaultStatus::Absent => "new",
        VaultStatus::LegacyPlaintext => "migrate",
        VaultStatus::Encrypted => "standard",
    }
}
