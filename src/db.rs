//! Task storage and lifecycle operations.
//!
//! This module provides the `Database` struct: the single owner of every task,
//! keyed by identifier. Display order is never stored; callers ask for a
//! [`Database::ranked`] view whenever they render. Identifier changes caused by
//! lifecycle transitions remove the old key and insert the new one inside the
//! same method, so the store never holds a stale entry.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::fields::{DelayMode, Lifecycle};
use crate::ident::{self, IdSource, RandomIds};
use crate::rank;
use crate::task::{default_soft, Correction, Task};

/// On-disk layout, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One whitespace-separated record per line; state encoded in the id length.
    Lines,
    /// Pretty JSON with an explicit state per task.
    Json,
}

impl Format {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Lines,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    tasks: Vec<Task>,
}

/// Input for [`Database::create`].
#[derive(Debug, Clone)]
pub struct Draft {
    pub name: String,
    pub priority: i64,
    pub hard: NaiveDateTime,
    /// Defaults to three days before `hard`.
    pub soft: Option<NaiveDateTime>,
}

/// Result of a successful [`Database::create`].
#[derive(Debug, Clone)]
pub struct Created {
    pub id: String,
    pub correction: Option<Correction>,
}

/// In-memory task store.
pub struct Database {
    tasks: BTreeMap<String, Task>,
    ids: Box<dyn IdSource>,
}

impl Default for Database {
    fn default() -> Self {
        Self::with_ids(Box::new(RandomIds))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(data)?;
    f.sync_all()
}

impl Database {
    /// Empty store drawing identifiers from `ids`.
    pub fn with_ids(ids: Box<dyn IdSource>) -> Self {
        Database {
            tasks: BTreeMap::new(),
            ids,
        }
    }

    /// Load a task file, creating an empty store if it does not exist.
    ///
    /// Bad records are skipped and returned alongside the store; only I/O
    /// failures and unreadable JSON abort the load.
    pub fn load(path: &Path) -> Result<(Self, Vec<Error>)> {
        Self::load_with(path, Box::new(RandomIds))
    }

    pub fn load_with(path: &Path, ids: Box<dyn IdSource>) -> Result<(Self, Vec<Error>)> {
        let mut db = Self::with_ids(ids);
        if !path.exists() {
            debug!(path = %path.display(), "task file missing, starting empty");
            return Ok((db, Vec::new()));
        }
        let raw = fs::read_to_string(path)?;
        let issues = match Format::for_path(path) {
            Format::Lines => db.read_lines(&raw),
            Format::Json => db.read_json(&raw)?,
        };
        for issue in &issues {
            warn!(path = %path.display(), "{issue}");
        }
        info!(path = %path.display(), tasks = db.len(), issues = issues.len(), "loaded tasks");
        Ok((db, issues))
    }

    /// Add every well-formed line of `raw`, returning the problems found.
    pub fn read_lines(&mut self, raw: &str) -> Vec<Error> {
        let mut issues = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode(line) {
                Ok(task) => self.admit(task, line_no, &mut issues),
                Err(reason) => issues.push(Error::Malformed {
                    line: line_no,
                    reason,
                }),
            }
        }
        issues
    }

    fn read_json(&mut self, raw: &str) -> Result<Vec<Error>> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        let mut issues = Vec::new();
        for (idx, mut task) in snapshot.tasks.into_iter().enumerate() {
            let entry = idx + 1;
            task.id = ident::normalise(&task.id);
            match ident::decode(&task.id) {
                Ok(state) if state == task.state => {}
                Ok(state) => {
                    issues.push(Error::Malformed {
                        line: entry,
                        reason: format!(
                            "identifier '{}' encodes {state} but the task is {}",
                            task.id, task.state
                        ),
                    });
                    continue;
                }
                Err(reason) => {
                    issues.push(Error::Malformed { line: entry, reason });
                    continue;
                }
            }
            self.admit(task, entry, &mut issues);
        }
        Ok(issues)
    }

    /// Correct a stored soft deadline that falls after the hard one, then
    /// insert the task. Both are reported against `line`.
    fn admit(&mut self, mut task: Task, line: usize, issues: &mut Vec<Error>) {
        if let Some(correction) = task.enforce_deadline_order() {
            issues.push(Error::SoftAfterHard { line, correction });
        }
        if let Some(issue) = self.insert_loaded(task, line) {
            issues.push(issue);
        }
    }

    /// Insert a task read from storage. A duplicate id keeps both tasks: the
    /// later one is re-keyed to a fresh id encoding the same state.
    fn insert_loaded(&mut self, mut task: Task, line: usize) -> Option<Error> {
        if !self.tasks.contains_key(&task.id) {
            self.tasks.insert(task.id.clone(), task);
            return None;
        }
        let original = task.id.clone();
        let (prefix, len) = match task.state {
            Lifecycle::Active => (String::new(), Lifecycle::Active.id_len()),
            state => {
                let prefix = ident::active_prefix(&original).to_string();
                let len = state.id_len() - prefix.len();
                (prefix, len)
            }
        };
        let tasks = &self.tasks;
        match ident::fresh(self.ids.as_mut(), &prefix, len, |c| tasks.contains_key(c)) {
            Ok(kept_as) => {
                task.id = kept_as.clone();
                self.tasks.insert(kept_as.clone(), task);
                Some(Error::DuplicateId {
                    line,
                    id: original,
                    kept_as,
                })
            }
            Err(e) => Some(Error::Malformed {
                line,
                reason: format!("duplicate id '{original}' dropped: {e}"),
            }),
        }
    }

    /// Write every task to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let data = match Format::for_path(path) {
            Format::Lines => {
                let mut out = String::new();
                for task in self.tasks.values() {
                    out.push_str(&codec::encode(task));
                    out.push('\n');
                }
                out
            }
            Format::Json => {
                let snapshot = Snapshot {
                    tasks: self.tasks.values().cloned().collect(),
                };
                serde_json::to_string_pretty(&snapshot)?
            }
        };
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(e) = write_synced(&tmp, data.as_bytes()).and_then(|()| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(path = %path.display(), tasks = self.len(), "saved tasks");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(&ident::normalise(id))
    }

    /// All tasks in identifier order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Tasks most important first, optionally hiding completed and cancelled ones.
    pub fn ranked(&self, now: NaiveDateTime, include_closed: bool) -> Vec<&Task> {
        rank::ranked(
            self.tasks
                .values()
                .filter(|t| include_closed || !t.state.is_terminal()),
            now,
        )
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        let key = ident::normalise(id);
        self.tasks.get_mut(&key).ok_or(Error::NotFound(key))
    }

    fn state_of(&self, id: &str) -> Result<(String, Lifecycle)> {
        let key = ident::normalise(id);
        match self.tasks.get(&key) {
            Some(task) => Ok((key, task.state)),
            None => Err(Error::NotFound(key)),
        }
    }

    fn id_taken(&self, candidate: &str) -> bool {
        self.tasks.contains_key(candidate)
    }

    /// Add a new active task under a fresh identifier.
    pub fn create(&mut self, draft: Draft) -> Result<Created> {
        let soft = draft.soft.unwrap_or_else(|| default_soft(draft.hard));
        let tasks = &self.tasks;
        let id = ident::fresh(self.ids.as_mut(), "", Lifecycle::Active.id_len(), |c| {
            tasks.contains_key(c)
        })?;
        let (task, correction) = Task::new(id.clone(), soft, draft.hard, &draft.name, draft.priority)?;
        if let Some(c) = &correction {
            warn!(id = %id, "{c}");
        }
        self.tasks.insert(id.clone(), task);
        info!(id = %id, "created task");
        Ok(Created { id, correction })
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<()> {
        self.task_mut(id)?.rename(name)
    }

    pub fn set_priority(&mut self, id: &str, priority: i64) -> Result<()> {
        self.task_mut(id)?.set_priority(priority);
        Ok(())
    }

    /// Shift priority by `delta`, returning the new value.
    pub fn prioritise(&mut self, id: &str, delta: i64) -> Result<i64> {
        let task = self.task_mut(id)?;
        task.prioritise(delta);
        Ok(task.priority)
    }

    /// Push deadlines of `id` by `diff`; see [`Task::extend`].
    pub fn delay(
        &mut self,
        id: &str,
        diff: Duration,
        mode: DelayMode,
        counted: bool,
    ) -> Result<Option<Correction>> {
        let task = self.task_mut(id)?;
        let correction = task.extend(diff, mode, counted)?;
        debug!(id = %task.id, delays = task.delays, "delayed task");
        Ok(correction)
    }

    /// Active → Completed. Returns the new 6-character id.
    pub fn complete(&mut self, id: &str) -> Result<String> {
        self.close(id, Lifecycle::Completed)
    }

    /// Active → Cancelled. Returns the new 5-character id.
    pub fn cancel(&mut self, id: &str) -> Result<String> {
        self.close(id, Lifecycle::Cancelled)
    }

    fn close(&mut self, id: &str, to: Lifecycle) -> Result<String> {
        let (key, from) = self.state_of(id)?;
        if from != Lifecycle::Active {
            return Err(Error::InvalidTransition { id: key, from, to });
        }
        let suffix = to.id_len() - key.len();
        let tasks = &self.tasks;
        let new_id = ident::fresh(self.ids.as_mut(), &key, suffix, |c| tasks.contains_key(c))?;
        Ok(self.rekey(&key, new_id, to))
    }

    /// Completed or Cancelled → Active. Returns the new 3-character id, which
    /// is the old prefix unless another task took it meanwhile.
    pub fn reopen(&mut self, id: &str) -> Result<String> {
        let (key, from) = self.state_of(id)?;
        if from == Lifecycle::Active {
            return Err(Error::InvalidTransition {
                id: key,
                from,
                to: Lifecycle::Active,
            });
        }
        let prefix = ident::active_prefix(&key).to_string();
        let new_id = if self.id_taken(&prefix) {
            let tasks = &self.tasks;
            ident::fresh(self.ids.as_mut(), "", Lifecycle::Active.id_len(), |c| {
                tasks.contains_key(c)
            })?
        } else {
            prefix
        };
        Ok(self.rekey(&key, new_id, Lifecycle::Active))
    }

    /// Active ↔ Completed.
    pub fn toggle_complete(&mut self, id: &str) -> Result<String> {
        let (key, from) = self.state_of(id)?;
        match from {
            Lifecycle::Active => self.complete(&key),
            Lifecycle::Completed => self.reopen(&key),
            Lifecycle::Cancelled => Err(Error::InvalidTransition {
                id: key,
                from,
                to: Lifecycle::Completed,
            }),
        }
    }

    /// Active ↔ Cancelled.
    pub fn toggle_cancel(&mut self, id: &str) -> Result<String> {
        let (key, from) = self.state_of(id)?;
        match from {
            Lifecycle::Active => self.cancel(&key),
            Lifecycle::Cancelled => self.reopen(&key),
            Lifecycle::Completed => Err(Error::InvalidTransition {
                id: key,
                from,
                to: Lifecycle::Cancelled,
            }),
        }
    }

    fn rekey(&mut self, old: &str, new_id: String, state: Lifecycle) -> String {
        if let Some(mut task) = self.tasks.remove(old) {
            info!(from = %old, to = %new_id, state = %state, "task changed state");
            task.id = new_id.clone();
            task.state = state;
            self.tasks.insert(new_id.clone(), task);
        }
        new_id
    }
}
