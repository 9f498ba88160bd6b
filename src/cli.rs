use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Deadline-driven personal task tracker.
/// Tasks are read from --read and written to --write (defaults to the read file).
#[derive(Parser)]
#[command(name = "tk", version, about = "Rank and track tasks by urgency, priority and deadlines")]
pub struct Cli {
    /// Task file to load. Files ending in .json use the JSON layout.
    #[arg(short, long, global = true)]
    pub read: Option<PathBuf>,

    /// Task file to save to. Defaults to the read file.
    #[arg(short, long, global = true)]
    pub write: Option<PathBuf>,

    /// Configuration file.
    #[arg(long, global = true, env = "TASKRANK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
