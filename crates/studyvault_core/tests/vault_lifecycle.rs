use chrono::{Duration, NaiveDate, TimeZone, Utc};
use studyvault_core::crypto::SALT_LEN;
use studyvault_core::vault::{SnapshotError, StoreSnapshot};
use studyvault_core::{
    CasEntry, CasStrand, PlannerSettings, Session, SessionError, Subject, Task, TaskKind,
    TaskStatus, Vault, VaultError, VaultStatus,
};
use tempfile::TempDir;

const PASSPHRASE: &str = "correct horse battery staple";

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

fn sample_task(subject: &Subject) -> Task {
    Task::new(
        "Biology IA draft",
        subject.id,
        TaskKind::Ia,
        fixed_now() + Duration::days(5),
        4.0,
        4,
        fixed_now(),
    )
}

#[test]
fn first_unlock_creates_both_artifacts() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path().join("vault"));
    assert_eq!(vault.status(), VaultStatus::Absent);

    let session = Session::unlock(&vault, PASSPHRASE).unwrap();

    assert_eq!(vault.status(), VaultStatus::Encrypted);
    assert!(vault.store_path().exists());
    assert!(vault.salt_path().exists());
    assert_eq!(
        std::fs::read(vault.salt_path()).unwrap().len(),
        SALT_LEN
    );
    assert!(session.tasks().unwrap().is_empty());
    assert!(session.subjects().unwrap().is_empty());
    session.logout();
}

#[test]
fn data_survives_logout_and_unlock() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    let mut session = Session::unlock(&vault, PASSPHRASE).unwrap();
    let mut subject = Subject::new("Biology HL", fixed_now());
    subject.difficulty = Some(4);
    session.create_subject(&subject).unwrap();
    let task = sample_task(&subject);
    session.create_task(&task).unwrap();
    let cas = CasEntry::new(
        CasStrand::Service,
        NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
        2.0,
        "Food bank shift",
        fixed_now(),
    );
    session.create_cas_entry(&cas).unwrap();
    session.logout();

    let reopened = Session::unlock(&vault, PASSPHRASE).unwrap();
    let tasks = reopened.tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
    assert_eq!(tasks[0].deadline, task.deadline);

    let subjects = reopened.subjects().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].difficulty, Some(4));

    let entries = reopened.cas_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].hours, 2.0);
}

#[test]
fn mutations_persist_without_an_explicit_save() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    let mut session = Session::unlock(&vault, PASSPHRASE).unwrap();
    let subject = Subject::new("History SL", fixed_now());
    session.create_subject(&subject).unwrap();
    let task = sample_task(&subject);
    session.create_task(&task).unwrap();
    session.toggle_task(task.id, fixed_now()).unwrap();
    // Dropped, not logged out; the store must already be sealed on disk.
    drop(session);

    let reopened = Session::unlock(&vault, PASSPHRASE).unwrap();
    let tasks = reopened.tasks().unwrap();
    assert_eq!(tasks[0].status, TaskStatus::Done);
    assert!(tasks[0].completed_at.is_some());
}

#[test]
fn planner_settings_round_trip_through_relock() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    let mut session = Session::unlock(&vault, PASSPHRASE).unwrap();
    assert!(session.planner_settings().unwrap().is_none());

    let settings = PlannerSettings {
        buffer_hours: 1.0,
        ..PlannerSettings::default()
    };
    session.save_planner_settings(&settings).unwrap();
    session.logout();

    let reopened = Session::unlock(&vault, PASSPHRASE).unwrap();
    let loaded = reopened.planner_settings().unwrap().unwrap();
    assert_eq!(loaded.buffer_hours, 1.0);
}

#[test]
fn wrong_passphrase_is_rejected() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    Session::unlock(&vault, PASSPHRASE).unwrap().logout();

    let err = Session::unlock(&vault, "not the passphrase").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Vault(VaultError::Authentication)
    ));
    assert_eq!(err.to_string(), "invalid password or corrupted data");
}

#[test]
fn tampered_store_fails_authentication() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    let mut session = Session::unlock(&vault, PASSPHRASE).unwrap();
    let subject = Subject::new("Physics HL", fixed_now());
    session.create_subject(&subject).unwrap();
    session.logout();

    let mut blob = std::fs::read(vault.store_path()).unwrap();
    let middle = blob.len() / 2;
    blob[middle] ^= 0x01;
    std::fs::write(vault.store_path(), &blob).unwrap();

    let err = Session::unlock(&vault, PASSPHRASE).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Vault(VaultError::Authentication)
    ));
}

#[test]
fn legacy_plaintext_store_is_migrated_on_unlock() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    let mut snapshot = StoreSnapshot::empty();
    let subject = Subject::new("Chemistry SL", fixed_now());
    let task = sample_task(&subject);
    snapshot.subjects.push(subject.clone());
    snapshot.tasks.push(task.clone());
    let plaintext = snapshot.encode().unwrap();
    vault.write_store(&plaintext).unwrap();
    assert_eq!(vault.status(), VaultStatus::LegacyPlaintext);

    let session = Session::unlock(&vault, PASSPHRASE).unwrap();
    assert_eq!(vault.status(), VaultStatus::Encrypted);
    assert_eq!(session.tasks().unwrap()[0].id, task.id);
    assert_eq!(session.subjects().unwrap()[0].id, subject.id);
    session.logout();

    // The blob on disk must be sealed now, not the old plaintext.
    let sealed = vault.read_store().unwrap();
    assert_ne!(sealed, plaintext);
    assert!(StoreSnapshot::decode(&sealed).is_err());

    let reopened = Session::unlock(&vault, PASSPHRASE).unwrap();
    assert_eq!(reopened.tasks().unwrap().len(), 1);
}

#[test]
fn corrupt_legacy_store_aborts_migration_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    vault.write_store(b"definitely not a snapshot").unwrap();
    assert_eq!(vault.status(), VaultStatus::LegacyPlaintext);

    let err = Session::unlock(&vault, PASSPHRASE).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Vault(VaultError::Snapshot(SnapshotError::Decode(_)))
    ));

    // No salt was written and the original bytes are untouched.
    assert_eq!(vault.status(), VaultStatus::LegacyPlaintext);
    assert_eq!(
        vault.read_store().unwrap(),
        b"definitely not a snapshot".to_vec()
    );
}

#[test]
fn legacy_store_from_a_newer_build_is_refused() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    vault
        .write_store(br#"{"version":99,"layout":"from the future"}"#)
        .unwrap();

    let err = Session::unlock(&vault, PASSPHRASE).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Vault(VaultError::Snapshot(SnapshotError::UnsupportedVersion {
            found: 99,
            ..
        }))
    ));
    assert_eq!(vault.status(), VaultStatus::LegacyPlaintext);
}

#[test]
fn study_plan_reads_the_unlocked_store() {
    let dir = TempDir::new().unwrap();
    let vault = Vault::new(dir.path());

    let mut session = Session::unlock(&vault, PASSPHRASE).unwrap();
    let mut subject = Subject::new("Biology HL", fixed_now());
    subject.difficulty = Some(5);
    session.create_subject(&subject).unwrap();
    session.create_task(&sample_task(&subject)).unwrap();

    let plan = session.study_plan(fixed_now()).unwrap();
    assert!(!plan.days.is_empty());
    let allocated: f64 = plan
        .days
        .iter()
        .flat_map(|day| day.allocations.iter())
        .map(|allocation| allocation.hours)
        .sum();
    assert!(allocated > 0.0);
}

#[test]
fn two_vaults_in_different_directories_are_independent() {
    let dir = TempDir::new().unwrap();
    let vault_a = Vault::new(dir.path().join("a"));
    let vault_b = Vault::new(dir.path().join("b"));

    let mut session_a = Session::unlock(&vault_a, "alpha").unwrap();
    let subject = Subject::new("Spanish B", fixed_now());
    session_a.create_subject(&subject).unwrap();
    session_a.logout();

    let session_b = Session::unlock(&vault_b, "beta").unwrap();
    assert!(session_b.subjects().unwrap().is_empty());

    // Passphrases do not cross over either.
    let err = Session::unlock(&vault_a, "beta").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Vault(VaultError::Authentication)
    ));
}
