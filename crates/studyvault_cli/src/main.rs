//! StudyVault command line.
//!
//! # Responsibility
//! - Resolve the vault directory and passphrase, then exercise the core
//!   flows end to end: unlock, list, plan, export, edit.
//! - Keep output plain text for people; the structured event log lives
//!   under the vault's `logs/` directory.

use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use studyvault_core::export::{cas_entries_csv, reflections_csv, tasks_csv};
use studyvault_core::plan::triage::{
    due_today_tasks, filter_tasks, overdue_tasks, sort_tasks, upcoming_tasks, week_progress,
};
use studyvault_core::{
    classify, default_log_level, difficulty_by_subject, init_logging, smart_score, Journal,
    Session, Subject, SubjectId, Task, TaskFilters, TaskId, TaskKind, TaskSort, TaskStatus, Vault,
    VaultStatus,
};

/// StudyVault - encrypted task vault and study planner
#[derive(Parser, Debug)]
#[command(name = "studyvault")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    STUDYVAULT_DIR           Vault directory (alternative to --vault-dir)\n    STUDYVAULT_PASSPHRASE    Passphrase (alternative to --passphrase)"
)]
pub struct Cli {
    /// Vault directory holding the store and salt files
    #[arg(long, global = true)]
    pub vault_dir: Option<PathBuf>,

    /// Passphrase; prompted for when neither this nor STUDYVAULT_PASSPHRASE is set
    #[arg(long, global = true)]
    pub passphrase: Option<String>,

    /// Level for the rolling file log under <vault-dir>/logs
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show vault state and dashboard counts
    Status,

    /// List tasks with filters and sort orders
    Tasks {
        /// Only active tasks due within seven days, overdue included
        #[arg(long)]
        due_soon: bool,

        /// Case-insensitive title substring
        #[arg(long, default_value = "")]
        search: String,

        /// Keep one task type: ia, ee, hw, test, revision or cas
        #[arg(long)]
        kind: Option<String>,

        /// Keep one status: not_started, in_progress or done
        #[arg(long)]
        status: Option<String>,

        /// Keep one subject, by name or ID prefix
        #[arg(long)]
        subject: Option<String>,

        /// Sort order
        #[arg(long, value_enum, default_value_t = SortOrder::Deadline)]
        sort: SortOrder,
    },

    /// Print the generated study plan
    Plan {
        /// Print at most this many days
        #[arg(long)]
        days: Option<usize>,
    },

    /// Export store contents as CSV
    Export {
        /// What to export
        #[arg(value_enum)]
        what: ExportKind,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Create a subject
    AddSubject {
        /// Subject name
        name: String,

        /// Perceived difficulty, 1-5
        #[arg(long)]
        difficulty: Option<u8>,

        /// Display colour, e.g. #7c3aed
        #[arg(long)]
        color: Option<String>,
    },

    /// Create a task
    AddTask {
        /// Task title
        title: String,

        /// Subject the task belongs to, by name or ID prefix
        #[arg(long)]
        subject: String,

        /// Task type: ia, ee, hw, test, revision or cas
        #[arg(long, default_value = "hw")]
        kind: String,

        /// Deadline: RFC 3339, or a bare date read as 23:59:59 UTC that day
        #[arg(long)]
        due: String,

        /// Estimated effort in hours
        #[arg(long, default_value_t = 1.0)]
        hours: f64,

        /// Importance, 1-10
        #[arg(long, default_value_t = 3)]
        priority: u8,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Flip a task between done and not started
    Toggle {
        /// Task ID, or a unique ID prefix
        task_id: String,
    },
}

/// Sort orders accepted on the command line, mirroring [`TaskSort`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Deadline,
    Priority,
    Subject,
    Score,
}

impl From<SortOrder> for TaskSort {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Deadline => TaskSort::Deadline,
            SortOrder::Priority => TaskSort::Priority,
            SortOrder::Subject => TaskSort::Subject,
            SortOrder::Score => TaskSort::Score,
        }
    }
}

/// CSV export targets.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Tasks,
    Cas,
    Tok,
    Ee,
}

struct TasksArgs {
    due_soon: bool,
    search: String,
    kind: Option<String>,
    status: Option<String>,
    subject: Option<String>,
    sort: TaskSort,
}

struct AddTaskArgs {
    title: String,
    subject: String,
    kind: String,
    due: String,
    hours: f64,
    priority: u8,
    notes: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let vault_dir = resolve_vault_dir(cli.vault_dir);
    let level = cli
        .log_level
        .unwrap_or_else(|| default_log_level().to_string());
    let log_dir = vault_dir.join("logs");
    // A read-only log directory should not block vault access.
    if let Err(err) = init_logging(&level, &log_dir.to_string_lossy()) {
        eprintln!("warning: file logging unavailable: {err}");
    }

    let vault = Vault::new(&vault_dir);
    let now = Utc::now();

    match cli.command {
        Command::Status => run_status(&vault, cli.passphrase, now),
        Command::Tasks {
            due_soon,
            search,
            kind,
            status,
            subject,
            sort,
        } => run_tasks(
            &vault,
            cli.passphrase,
            TasksArgs {
                due_soon,
                search,
                kind,
                status,
                subject,
                sort: sort.into(),
            },
            now,
        ),
        Command::Plan { days } => run_plan(&vault, cli.passphrase, days, now),
        Command::Export { what, out } => run_export(&vault, cli.passphrase, what, out),
        Command::AddSubject {
            name,
            difficulty,
            color,
        } => run_add_subject(&vault, cli.passphrase, name, difficulty, color, now),
        Command::AddTask {
            title,
            subject,
            kind,
            due,
            hours,
            priority,
            notes,
        } => run_add_task(
            &vault,
            cli.passphrase,
            AddTaskArgs {
                title,
                subject,
                kind,
                due,
                hours,
                priority,
                notes,
            },
            now,
        ),
        Command::Toggle { task_id } => run_toggle(&vault, cli.passphrase, &task_id, now),
    }
}

fn run_status(
    vault: &Vault,
    passphrase: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let state = vault.status();
    println!("Vault:      {}", vault.dir().display());
    println!("Store:      {}", status_label(state));

    let session = unlock(vault, passphrase)?;
    if state == VaultStatus::LegacyPlaintext {
        println!("            migrated to an encrypted store");
    }

    let tasks = session.tasks()?;
    let subjects = session.subjects()?;
    let week_start = session
        .planner_settings()?
        .map(|s| s.week_start)
        .unwrap_or_default();
    let progress = week_progress(&tasks, week_start, now);
    let totals = session.cas_totals()?;
    let open = tasks.iter().filter(|t| t.is_active()).count();

    println!();
    println!("Subjects:   {}", subjects.len());
    println!("Tasks:      {} ({open} open)", tasks.len());
    println!("Overdue:    {}", overdue_tasks(&tasks, now).len());
    println!("Due today:  {}", due_today_tasks(&tasks, now).len());
    println!(
        "This week:  {}/{} done ({}%)",
        progress.completed, progress.total, progress.percent
    );
    println!(
        "CAS hours:  {:.1} (creativity {:.1}, activity {:.1}, service {:.1})",
        totals.total, totals.creativity, totals.activity, totals.service
    );

    let upcoming = upcoming_tasks(&tasks, 5);
    if !upcoming.is_empty() {
        println!();
        println!("Next up:");
        for task in upcoming {
            println!(
                "  [{:<7}] {}  (due {})",
                classify(task, now).as_str(),
                task.title,
                task.deadline.format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

fn run_tasks(
    vault: &Vault,
    passphrase: Option<String>,
    args: TasksArgs,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let session = unlock(vault, passphrase)?;
    let tasks = session.tasks()?;
    let subjects = session.subjects()?;
    let difficulty = difficulty_by_subject(&subjects);

    let mut filters = TaskFilters {
        due_soon_only: args.due_soon,
        search: args.search,
        ..TaskFilters::default()
    };
    if let Some(kind) = args.kind {
        filters.kinds = vec![parse_kind(&kind)?];
    }
    if let Some(status) = args.status {
        filters.statuses = vec![parse_status(&status)?];
    }
    if let Some(subject) = args.subject {
        filters.subject_ids = vec![resolve_subject(&subjects, &subject)?];
    }

    let mut view = filter_tasks(&tasks, &filters, now);
    sort_tasks(&mut view, args.sort, &subjects, &difficulty, now);

    if view.is_empty() {
        println!("No tasks match.");
        return Ok(());
    }

    let names: HashMap<SubjectId, &str> = subjects
        .iter()
        .map(|s| (s.id, s.name.as_str()))
        .collect();
    println!("Tasks ({}):", view.len());
    for task in view {
        println!(
            "  [{:<7}] {:<8} {}  {}  ({})  due {}  {}h  p{}  score {:.3}",
            classify(task, now).as_str(),
            task.kind.label(),
            short_id(task.id),
            task.title,
            names.get(&task.subject_id).copied().unwrap_or("?"),
            task.deadline.format("%Y-%m-%d %H:%M"),
            task.estimated_hours,
            task.priority,
            smart_score(task, difficulty.get(&task.subject_id).copied(), now),
        );
    }
    Ok(())
}

fn run_plan(
    vault: &Vault,
    passphrase: Option<String>,
    days: Option<usize>,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let session = unlock(vault, passphrase)?;
    let plan = session.study_plan(now)?;

    if plan.days.is_empty() {
        println!("Nothing to plan: no active tasks.");
        return Ok(());
    }

    let shown = days.unwrap_or(plan.days.len()).min(plan.days.len());
    for day in &plan.days[..shown] {
        let marker = if day.overload { "  OVERLOADED" } else { "" };
        println!(
            "{}  {:.1}/{:.1}h{}",
            day.date.format("%a %Y-%m-%d"),
            day.used_hours,
            day.available_hours,
            marker
        );
        for alloc in &day.allocations {
            println!("    {:>4.1}h  {}", alloc.hours, alloc.title);
        }
    }
    if shown < plan.days.len() {
        println!("... {} more day(s)", plan.days.len() - shown);
    }
    if plan.overloaded {
        println!();
        println!("Warning: the horizon ends with work still unplaced.");
    }
    Ok(())
}

fn run_export(
    vault: &Vault,
    passphrase: Option<String>,
    what: ExportKind,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let session = unlock(vault, passphrase)?;
    let csv = match what {
        ExportKind::Tasks => tasks_csv(&session.tasks()?),
        ExportKind::Cas => cas_entries_csv(&session.cas_entries()?),
        ExportKind::Tok => reflections_csv(&session.reflections(Journal::Tok)?),
        ExportKind::Ee => reflections_csv(&session.reflections(Journal::Ee)?),
    };
    match out {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            println!("Wrote {} bytes to {}", csv.len(), path.display());
        }
        None => println!("{csv}"),
    }
    Ok(())
}

fn run_add_subject(
    vault: &Vault,
    passphrase: Option<String>,
    name: String,
    difficulty: Option<u8>,
    color: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let mut session = unlock(vault, passphrase)?;
    let mut subject = Subject::new(name, now);
    subject.difficulty = difficulty;
    subject.color = color;
    let id = session.create_subject(&subject)?;
    println!("Created subject {} ({})", subject.name, short_id(id));
    Ok(())
}

fn run_add_task(
    vault: &Vault,
    passphrase: Option<String>,
    args: AddTaskArgs,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let kind = parse_kind(&args.kind)?;
    let deadline = parse_deadline(&args.due)?;

    let mut session = unlock(vault, passphrase)?;
    let subject_id = resolve_subject(&session.subjects()?, &args.subject)?;

    let mut task = Task::new(
        args.title,
        subject_id,
        kind,
        deadline,
        args.hours,
        args.priority,
        now,
    );
    task.notes = args.notes;
    let id = session.create_task(&task)?;
    println!(
        "Created task {} ({}), due {}",
        task.title,
        short_id(id),
        deadline.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

fn run_toggle(
    vault: &Vault,
    passphrase: Option<String>,
    task_id: &str,
    now: DateTime<Utc>,
) -> Result<(), Box<dyn Error>> {
    let mut session = unlock(vault, passphrase)?;
    let id = resolve_task(&session.tasks()?, task_id)?;
    let status = session.toggle_task(id, now)?;
    println!("Task {} is now {}", short_id(id), status.label());
    Ok(())
}

fn unlock(vault: &Vault, passphrase: Option<String>) -> Result<Session, Box<dyn Error>> {
    let secret = resolve_passphrase(passphrase)?;
    Ok(Session::unlock(vault, &secret)?)
}

/// Flag, then `STUDYVAULT_DIR`, then the platform data directory.
fn resolve_vault_dir(flag: Option<PathBuf>) -> PathBuf {
    let dir = flag
        .or_else(|| std::env::var_os("STUDYVAULT_DIR").map(PathBuf::from))
        .unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("studyvault"))
                .unwrap_or_else(|| PathBuf::from("/tmp/studyvault"))
        });
    if dir.is_absolute() {
        dir
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&dir))
            .unwrap_or(dir)
    }
}

/// Flag, then `STUDYVAULT_PASSPHRASE`, then a stdin prompt.
fn resolve_passphrase(flag: Option<String>) -> Result<String, Box<dyn Error>> {
    if let Some(secret) = flag {
        return Ok(secret);
    }
    if let Some(secret) = std::env::var_os("STUDYVAULT_PASSPHRASE") {
        return Ok(secret.to_string_lossy().into_owned());
    }

    print!("Passphrase: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let secret = line.trim_end_matches(['\n', '\r']).to_string();
    if secret.is_empty() {
        return Err("passphrase must not be empty".into());
    }
    Ok(secret)
}

fn status_label(status: VaultStatus) -> &'static str {
    match status {
        VaultStatus::Absent => "absent (first unlock creates it)",
        VaultStatus::LegacyPlaintext => "legacy plaintext (unlock migrates it)",
        VaultStatus::Encrypted => "encrypted",
    }
}

fn parse_kind(value: &str) -> Result<TaskKind, Box<dyn Error>> {
    TaskKind::parse(value).ok_or_else(|| {
        format!("unknown task kind `{value}`; expected ia|ee|hw|test|revision|cas").into()
    })
}

fn parse_status(value: &str) -> Result<TaskStatus, Box<dyn Error>> {
    TaskStatus::parse(value).ok_or_else(|| {
        format!("unknown task status `{value}`; expected not_started|in_progress|done").into()
    })
}

/// Accepts RFC 3339, or a bare `YYYY-MM-DD` read as 23:59:59 UTC that day.
fn parse_deadline(value: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(end) = date.and_hms_opt(23, 59, 59) {
            return Ok(end.and_utc());
        }
    }
    Err(format!("could not parse deadline `{value}`; use RFC 3339 or YYYY-MM-DD").into())
}

/// Resolves a subject by exact name (case-insensitive) or ID prefix.
fn resolve_subject(subjects: &[Subject], needle: &str) -> Result<SubjectId, Box<dyn Error>> {
    let lowered = needle.to_lowercase();
    let matches: Vec<&Subject> = subjects
        .iter()
        .filter(|s| s.name.to_lowercase() == lowered || s.id.to_string().starts_with(&lowered))
        .collect();
    match matches.len() {
        0 => Err(format!("no subject matching `{needle}`").into()),
        1 => Ok(matches[0].id),
        n => Err(format!("`{needle}` is ambiguous; it matches {n} subjects").into()),
    }
}

/// Resolves a task by full ID or unique ID prefix.
fn resolve_task(tasks: &[Task], needle: &str) -> Result<TaskId, Box<dyn Error>> {
    let lowered = needle.to_lowercase();
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.to_string().starts_with(&lowered))
        .collect();
    match matches.len() {
        0 => Err(format!("no task with ID `{needle}`").into()),
        1 => Ok(matches[0].id),
        n => Err(format!("`{needle}` is ambiguous; it matches {n} tasks").into()),
    }
}

fn short_id(id: TaskId) -> String {
    id.to_string().chars().take(8).collect()
}
