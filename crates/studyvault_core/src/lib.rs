//! Core domain logic for StudyVault.
//! This crate is the single source of truth for business invariants.

pub mod crypto;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod plan;
pub mod repo;
pub mod session;
pub mod vault;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::journal::{CasEntry, CasStrand, CasTotals, EntryId, Journal, ReflectionEntry};
pub use model::settings::{NormalizedSettings, PlannerSettings, WeekStart};
pub use model::subject::{difficulty_by_subject, Subject, SubjectId};
pub use model::task::{Task, TaskId, TaskKind, TaskStatus};
pub use model::ValidationError;
pub use plan::scheduler::{generate_study_plan, PlannerAllocation, PlannerDay, StudyPlan};
pub use plan::score::smart_score;
pub use plan::triage::{TaskFilters, TaskSort, WeekProgress};
pub use plan::urgency::{classify, UrgencyLabel};
pub use repo::task_repo::TaskListQuery;
pub use repo::RepoError;
pub use session::{Session, SessionError};
pub use vault::{Vault, VaultError, VaultStatus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
