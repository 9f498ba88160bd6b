//! # tk - deadline-driven task ranking
//!
//! A small personal task tracker for the terminal. Every task carries a soft
//! deadline (when you would like it done), a hard deadline (when it must be
//! done) and an integer priority. Tasks are ranked by how urgent they are
//! right now, then by priority, then by deadline.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive UI
//! tk
//!
//! # Add a task due on Friday, aiming to finish it by Wednesday
//! tk add "File expenses" --hard fri --soft wed -p 5
//!
//! # Print the current ranking
//! tk list
//!
//! # Push a task back two days without counting it as a delay
//! tk delay k3x --days 2 --no-count
//! ```
//!
//! ## Identifiers
//!
//! Identifiers encode the lifecycle in their length: three characters for
//! active tasks, six once completed and five once cancelled. Closing a task
//! extends its identifier; reopening it truncates back to the original three.
//!
//! ## Storage
//!
//! Tasks live in `~/.taskrank/tasks.txt`, one task per line:
//!
//! ```text
//! k3x 250105T0900 250108T1700 File_expenses 5 0
//! ```
//!
//! Files ending in `.json` use a JSON layout instead. `--read` and `--write`
//! pick different source and destination files.
//!
//! Set `RUST_LOG=tk=debug` to trace loading and saving on stderr.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod cli;
pub mod cmd;
pub mod codec;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod fields;
pub mod ident;
pub mod rank;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;

fn init_tracing() {
    // Opt-in via RUST_LOG; an unparsable filter disables logging instead of failing.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd_completions(*shell);
        return Ok(());
    }

    let session = Session::from_cli(&cli)?;

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Ui => cmd_ui(&session),
        Commands::List { all } => cmd_list(&session, all),
        Commands::Show { id } => cmd_show(&session, &id),
        Commands::Add {
            name,
            hard,
            soft,
            priority,
            this_week,
        } => cmd_add(&session, name, hard, soft, priority, this_week),
        Commands::Complete { id } => cmd_complete(&session, &id),
        Commands::Cancel { id } => cmd_cancel(&session, &id),
        Commands::Reopen { id } => cmd_reopen(&session, &id),
        Commands::Rename { id, name } => cmd_rename(&session, &id, &name),
        Commands::Priority {
            id,
            value,
            relative,
        } => cmd_priority(&session, &id, value, relative),
        Commands::Delay {
            id,
            days,
            hours,
            mins,
            secs,
            mode,
            no_count,
        } => cmd_delay(
            &session,
            &id,
            delay_duration(days, hours, mins, secs)?,
            mode,
            !no_count,
        ),
        Commands::Completions { .. } => unreachable!("completions handled above"),
        Commands::InitConfig => cmd_init_config(&session),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
