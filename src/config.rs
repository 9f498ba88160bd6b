//! User configuration stored as TOML under `~/.taskrank/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::fields::PastWeekday;

/// Settings that shape defaults; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task file used when `--read` is not given.
    pub data_file: Option<PathBuf>,
    /// Priority given to new tasks when none is typed.
    pub default_priority: i64,
    /// Whether the UI starts with completed and cancelled tasks visible.
    pub show_completed: bool,
    /// How a weekday that already passed this week is resolved.
    pub past_weekday: PastWeekday,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            default_priority: 10,
            show_completed: false,
            past_weekday: PastWeekday::NextWeek,
        }
    }
}

/// Directory holding the config and the default task file.
pub fn home_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".taskrank")
}

pub fn default_config_path() -> PathBuf {
    home_dir().join("config.toml")
}

impl Config {
    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Task file to read when none was passed on the command line.
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| home_dir().join("tasks.txt"))
    }
}
