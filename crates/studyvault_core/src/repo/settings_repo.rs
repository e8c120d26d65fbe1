//! Settings repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide key/value access to the `settings` table.
//! - Encode and decode the planner-settings payload.
//!
//! # Invariants
//! - An unreadable planner payload reads as "no settings" (with a warning)
//!   rather than failing the caller; defaults then apply downstream.

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use crate::model::settings::PlannerSettings;
use crate::repo::{ensure_connection_ready, RepoResult};

/// Key under which planner settings are stored.
pub const PLANNER_SETTINGS_KEY: &str = "planner_settings";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[("settings", &["key", "value"])];

/// Repository interface for settings access.
pub trait SettingsRepository {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>>;
    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()>;
    fn planner_settings(&self) -> RepoResult<Option<PlannerSettings>>;
    fn save_planner_settings(&self, settings: &PlannerSettings) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn get_setting(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2);",
            params![key, value],
        )?;
        Ok(())
    }

    fn planner_settings(&self) -> RepoResult<Option<PlannerSettings>> {
        let Some(payload) = self.get_setting(PLANNER_SETTINGS_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&payload) {
            Ok(settings) => Ok(Some(settings)),
            Err(err) => {
                warn!(
                    "event=settings_read module=repo status=warn error_code=planner_settings_unreadable error={err}"
                );
                Ok(None)
            }
        }
    }

    fn save_planner_settings(&self, settings: &PlannerSettings) -> RepoResult<()> {
        let payload = serde_json::to_string(settings).map_err(|err| {
            crate::repo::RepoError::InvalidData(format!(
                "planner settings failed to serialize: {err}"
            ))
        })?;
        self.set_setting(PLANNER_SETTINGS_KEY, &payload)
    }
}
