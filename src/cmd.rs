//! Command implementations for the CLI interface.
//!
//! Each subcommand loads the task file, applies one operation, and (for
//! mutations) writes the result straight back to the write path.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use chrono::{Datelike, Duration, NaiveDateTime};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use crossterm::style::{style, Color, Stylize};
use tracing::debug;

use crate::cli::Cli;
use crate::config::{default_config_path, Config};
use crate::dates::{checked_span, format_relative, now_local, parse_deadline, weekday_name};
use crate::db::{Database, Draft};
use crate::error::{Error, Result};
use crate::fields::*;
use crate::ident;
use crate::task::Task;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI (default).
    Ui,

    /// Print tasks, most important first.
    List {
        /// Include completed and cancelled tasks.
        #[arg(long)]
        all: bool,
    },

    /// Show one task in full.
    Show {
        /// Task id (case-insensitive).
        id: String,
    },

    /// Add a new task.
    Add {
        /// Task name.
        name: String,
        /// Hard deadline: 241231T2359, 241231, mon..sun, today, tomorrow, "in 3d".
        #[arg(long)]
        hard: String,
        /// Soft deadline, same formats. Defaults to three days before the hard deadline.
        #[arg(long)]
        soft: Option<String>,
        /// Priority; higher is more important.
        #[arg(long, short, allow_negative_numbers = true)]
        priority: Option<i64>,
        /// Resolve a weekday that already passed to this week instead of next week.
        #[arg(long)]
        this_week: bool,
    },

    /// Mark an active task completed.
    Complete { id: String },

    /// Mark an active task cancelled.
    Cancel { id: String },

    /// Return a completed or cancelled task to active.
    Reopen { id: String },

    /// Rename a task.
    Rename { id: String, name: String },

    /// Set a task's priority.
    Priority {
        id: String,
        #[arg(allow_negative_numbers = true)]
        value: i64,
        /// Add VALUE to the current priority instead of replacing it.
        #[arg(long)]
        relative: bool,
    },

    /// Push a task's deadlines out.
    Delay {
        id: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        days: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        hours: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        mins: i64,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        secs: i64,
        /// Which deadline(s) to move.
        #[arg(long, value_enum, default_value_t = DelayMode::Both)]
        mode: DelayMode,
        /// Do not count this towards the task's delay total.
        #[arg(long)]
        no_count: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Write a default configuration file if none exists.
    InitConfig,
}

/// Resolved paths and settings for one run.
pub struct Session {
    pub read: PathBuf,
    pub write: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl Session {
    /// Merge command-line flags over the configuration file.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().unwrap_or_else(default_config_path);
        let config = Config::load(&config_path)?;
        let read = cli.read.clone().unwrap_or_else(|| config.data_file());
        let write = cli.write.clone().unwrap_or_else(|| read.clone());
        debug!(read = %read.display(), write = %write.display(), "resolved task files");
        Ok(Session {
            read,
            write,
            config_path,
            config,
        })
    }

    /// Load the read file, reporting skipped records on stderr.
    pub fn open(&self) -> Result<Database> {
        let (db, issues) = Database::load(&self.read)?;
        for issue in issues {
            eprintln!("Warning: {issue}");
        }
        Ok(db)
    }

    fn persist(&self, db: &Database) -> Result<()> {
        db.save(&self.write)
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(session: &Session) -> Result<()> {
    run_tui(session)
}

/// Wrap `text` in the ANSI style for `tier`.
pub fn paint(text: &str, tier: Tier) -> String {
    let styled = style(text);
    match tier {
        Tier::Overdue => styled.with(Color::Red).bold().underlined().to_string(),
        Tier::Danger => styled.with(Color::Red).to_string(),
        Tier::Warning => styled.with(Color::Yellow).to_string(),
        Tier::Delayed => styled.with(Color::Cyan).to_string(),
        Tier::Ok => styled.with(Color::Green).to_string(),
        Tier::Closed => styled.with(Color::DarkGrey).to_string(),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Format one table row without color.
pub fn format_row(task: &Task, now: NaiveDateTime) -> String {
    format!(
        "{:<6} {:<30} {:<16} {:<16} {:>5}  {}",
        task.id,
        truncate(&task.name, 30),
        format_relative(task.soft, now),
        format_relative(task.hard, now),
        task.priority,
        task.status(now).label(),
    )
}

/// Print tasks in a table, one color per urgency tier.
pub fn print_table(tasks: &[&Task], now: NaiveDateTime, all: bool) {
    let color = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    println!(
        "{}, {}",
        now.format("%Y-%m-%d %H:%M"),
        weekday_name(now.weekday())
    );
    println!("{}", if all { "All Tasks:" } else { "Current Tasks:" });
    println!(
        "{:<6} {:<30} {:<16} {:<16} {:>5}  {}",
        "ID", "Name", "Soft Deadline", "Hard Deadline", "Pri", "Status"
    );
    for task in tasks {
        let row = format_row(task, now);
        if color {
            println!("{}", paint(&row, task.tier(now)));
        } else {
            println!("{row}");
        }
    }
}

pub fn cmd_list(session: &Session, all: bool) -> Result<()> {
    let db = session.open()?;
    let now = now_local();
    print_table(&db.ranked(now, all), now, all);
    Ok(())
}

pub fn cmd_show(session: &Session, id: &str) -> Result<()> {
    let db = session.open()?;
    let now = now_local();
    let task = db
        .get(id)
        .ok_or_else(|| Error::NotFound(ident::normalise(id)))?;
    println!("{task}");
    println!("Status {}", task.status(now).label());
    println!(
        "Due   {} (soft) / {} (hard)",
        format_relative(task.soft, now),
        format_relative(task.hard, now)
    );
    Ok(())
}

/// Add a new task. An unreadable deadline aborts without touching the file.
pub fn cmd_add(
    session: &Session,
    name: String,
    hard: String,
    soft: Option<String>,
    priority: Option<i64>,
    this_week: bool,
) -> Result<()> {
    let now = now_local();
    let past = if this_week {
        PastWeekday::ThisWeek
    } else {
        session.config.past_weekday
    };
    let hard = parse_deadline(&hard, now, past)?;
    let soft = soft.map(|s| parse_deadline(&s, now, past)).transpose()?;

    let mut db = session.open()?;
    let created = db.create(Draft {
        name,
        priority: priority.unwrap_or(session.config.default_priority),
        hard,
        soft,
    })?;
    if let Some(correction) = created.correction {
        eprintln!("Warning: {correction}");
    }
    session.persist(&db)?;
    println!("Added task {}", created.id);
    Ok(())
}

pub fn cmd_complete(session: &Session, id: &str) -> Result<()> {
    let mut db = session.open()?;
    let new_id = db.complete(id)?;
    session.persist(&db)?;
    println!("Completed {} (now {new_id})", ident::normalise(id));
    Ok(())
}

pub fn cmd_cancel(session: &Session, id: &str) -> Result<()> {
    let mut db = session.open()?;
    let new_id = db.cancel(id)?;
    session.persist(&db)?;
    println!("Cancelled {} (now {new_id})", ident::normalise(id));
    Ok(())
}

pub fn cmd_reopen(session: &Session, id: &str) -> Result<()> {
    let mut db = session.open()?;
    let new_id = db.reopen(id)?;
    session.persist(&db)?;
    println!("Reopened {} (now {new_id})", ident::normalise(id));
    Ok(())
}

pub fn cmd_rename(session: &Session, id: &str, name: &str) -> Result<()> {
    let mut db = session.open()?;
    db.rename(id, name)?;
    session.persist(&db)?;
    println!("Renamed {}", ident::normalise(id));
    Ok(())
}

pub fn cmd_priority(session: &Session, id: &str, value: i64, relative: bool) -> Result<()> {
    let mut db = session.open()?;
    let priority = if relative {
        db.prioritise(id, value)?
    } else {
        db.set_priority(id, value)?;
        value
    };
    session.persist(&db)?;
    println!("Priority of {} set to {priority}", ident::normalise(id));
    Ok(())
}

pub fn cmd_delay(
    session: &Session,
    id: &str,
    diff: Duration,
    mode: DelayMode,
    counted: bool,
) -> Result<()> {
    let mut db = session.open()?;
    if let Some(correction) = db.delay(id, diff, mode, counted)? {
        eprintln!("Warning: {correction}");
    }
    session.persist(&db)?;
    if let Some(task) = db.get(id) {
        println!(
            "Delayed {} ({} deadline): soft {} hard {}, delayed {} time(s)",
            task.id,
            mode.label().to_lowercase(),
            task.soft.format("%Y-%m-%d %H:%M"),
            task.hard.format("%Y-%m-%d %H:%M"),
            task.delays
        );
    }
    Ok(())
}

/// Total delay from the individual unit flags.
pub fn delay_duration(days: i64, hours: i64, mins: i64, secs: i64) -> Result<Duration> {
    checked_span(days, hours, mins, secs)
        .ok_or_else(|| Error::InvalidNumber(format!("{days}d {hours}h {mins}m {secs}s")))
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tk", &mut io::stdout());
}

pub fn cmd_init_config(session: &Session) -> Result<()> {
    if session.config_path.exists() {
        println!("Config already exists: {}", session.config_path.display());
        return Ok(());
    }
    Config::default().save(&session.config_path)?;
    println!("Wrote {}", session.config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("much longer than that", 10), "much long…");
    }

    #[test]
    fn test_format_row() {
        let now = at(2025, 1, 8, 12, 0);
        let mut t = task("abc", day(2025, 1, 9), day(2025, 1, 10), 7);
        t.name = "Pay rent".into();
        let row = format_row(&t, now);
        assert!(row.starts_with("abc    Pay rent"));
        assert!(row.contains("Tomorrow"));
        assert!(row.contains("Friday"));
        assert!(row.trim_end().ends_with("Soon"));
    }

    #[test]
    fn test_paint_wraps_text() {
        let out = paint("row", Tier::Ok);
        assert!(out.contains("row"));
        assert_ne!(out, "row");
    }

    #[test]
    fn test_delay_duration() {
        assert_eq!(
            delay_duration(1, 2, 3, 4).unwrap(),
            Duration::seconds(86_400 + 2 * 3_600 + 3 * 60 + 4)
        );
        assert_eq!(delay_duration(-2, 0, 0, 0).unwrap(), Duration::days(-2));
        assert!(matches!(
            delay_duration(i64::MAX / 1000, 0, 0, 0),
            Err(Error::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_session_defaults_write_to_read() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            read: Some(dir.path().join("t.txt")),
            write: None,
            config: Some(dir.path().join("missing.toml")),
            command: None,
        };
        let session = Session::from_cli(&cli).unwrap();
        assert_eq!(session.write, session.read);
        assert_eq!(session.config, Config::default());
    }

    #[test]
    fn test_add_then_complete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            read: Some(dir.path().join("t.txt")),
            write: None,
            config: Some(dir.path().join("missing.toml")),
            command: None,
        };
        let session = Session::from_cli(&cli).unwrap();
        cmd_add(&session, "Water plants".into(), "in 5d".into(), None, Some(3), false).unwrap();
        let db = session.open().unwrap();
        assert_eq!(db.len(), 1);
        let id = db.tasks().next().unwrap().id.clone();
        assert_eq!(id.len(), 3);

        cmd_complete(&session, &id).unwrap();
        let db = session.open().unwrap();
        let t = db.tasks().next().unwrap();
        assert_eq!(t.state, Lifecycle::Completed);
        assert!(t.id.starts_with(&id));
    }

    #[test]
    fn test_add_with_bad_date_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        let cli = Cli {
            read: Some(path.clone()),
            write: None,
            config: Some(dir.path().join("missing.toml")),
            command: None,
        };
        let session = Session::from_cli(&cli).unwrap();
        let err = cmd_add(&session, "Nope".into(), "someday".into(), None, None, false);
        assert!(matches!(err, Err(Error::UnresolvableDate(_))));
        assert!(!path.exists());

        let err = cmd_add(&session, "Far".into(), "in 1000000000d".into(), None, None, false);
        assert!(matches!(err, Err(Error::UnresolvableDate(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_show_reports_normalised_id() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            read: Some(dir.path().join("t.txt")),
            write: None,
            config: Some(dir.path().join("missing.toml")),
            command: None,
        };
        let session = Session::from_cli(&cli).unwrap();
        let err = cmd_show(&session, "  NoPe ");
        assert!(matches!(err, Err(Error::NotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_delay_out_of_range_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "abc 250105T0000 250108T0000 Report 5 0\n").unwrap();
        let cli = Cli {
            read: Some(path.clone()),
            write: None,
            config: Some(dir.path().join("missing.toml")),
            command: None,
        };
        let session = Session::from_cli(&cli).unwrap();
        let diff = delay_duration(1_000_000_000, 0, 0, 0).unwrap();
        let err = cmd_delay(&session, "abc", diff, DelayMode::Both, true);
        assert!(matches!(err, Err(Error::DeadlineOutOfRange(_))));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "abc 250105T0000 250108T0000 Report 5 0\n"
        );
    }
}
