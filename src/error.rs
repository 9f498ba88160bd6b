//! Error type shared by every module.

use thiserror::Error;

use crate::fields::Lifecycle;
use crate::task::Correction;

/// Everything that can go wrong while loading, mutating or saving tasks.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Task '{0}' not found")]
    NotFound(String),

    #[error("Cannot move task '{id}' from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: Lifecycle,
        to: Lifecycle,
    },

    #[error("Unable to identify date '{0}'")]
    UnresolvableDate(String),

    #[error("Task name cannot be empty")]
    EmptyName,

    #[error("'{0}' is not a valid whole number")]
    InvalidNumber(String),

    #[error("Delaying task '{0}' would move a deadline out of range")]
    DeadlineOutOfRange(String),

    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Line {line}: duplicate id '{id}', kept as '{kept_as}'")]
    DuplicateId {
        line: usize,
        id: String,
        kept_as: String,
    },

    #[error("Line {line}: {correction}")]
    SoftAfterHard { line: usize, correction: Correction },

    #[error("No free identifier of length {0}")]
    IdsExhausted(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
