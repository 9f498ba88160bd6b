//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct: one tracked unit of work with a
//! soft and a hard deadline, a signed priority and a delay counter. Urgency is
//! never stored; it is derived from the deadlines against a caller-supplied
//! `now` every time it is asked for.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dates::floor_days;
use crate::error::{Error, Result};
use crate::fields::*;

/// Days between the default soft deadline and the hard deadline.
pub const SOFT_LEAD_DAYS: i64 = 3;

/// A soft-deadline correction applied to keep `soft <= hard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub rejected: NaiveDateTime,
    pub soft: NaiveDateTime,
}

impl std::fmt::Display for Correction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Soft deadline {} fell after the hard deadline; moved to {}",
            self.rejected.format("%Y-%m-%d %H:%M"),
            self.soft.format("%Y-%m-%d %H:%M"),
        )
    }
}

/// A tracked piece of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub soft: NaiveDateTime,
    pub hard: NaiveDateTime,
    pub name: String,
    pub priority: i64,
    pub state: Lifecycle,
    /// How many times a deadline has been pushed out.
    #[serde(default)]
    pub delays: u32,
}

/// Turn tabs and newlines into plain spaces so a name survives the
/// whitespace-separated line format, and reject names that end up empty.
pub fn clean_name(name: &str) -> Result<String> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err(Error::EmptyName);
    }
    Ok(cleaned)
}

/// Default soft deadline for a given hard deadline. At the very start of the
/// representable range it collapses onto `hard`.
pub fn default_soft(hard: NaiveDateTime) -> NaiveDateTime {
    hard.checked_sub_signed(Duration::days(SOFT_LEAD_DAYS))
        .unwrap_or(hard)
}

impl Task {
    /// Build an active task, correcting a soft deadline that falls after the hard one.
    pub fn new(
        id: String,
        soft: NaiveDateTime,
        hard: NaiveDateTime,
        name: &str,
        priority: i64,
    ) -> Result<(Self, Option<Correction>)> {
        let mut task = Task {
            id,
            soft,
            hard,
            name: clean_name(name)?,
            priority,
            state: Lifecycle::Active,
            delays: 0,
        };
        let correction = task.enforce_deadline_order();
        Ok((task, correction))
    }

    /// Urgency at `now`.
    pub fn status(&self, now: NaiveDateTime) -> Status {
        match self.state {
            Lifecycle::Completed => return Status::Completed,
            Lifecycle::Cancelled => return Status::Cancelled,
            Lifecycle::Active => {}
        }
        let hard_days = floor_days(self.hard - now);
        let soft_days = floor_days(self.soft - now);
        if hard_days < 0 {
            Status::Overdue
        } else if soft_days < 0 {
            Status::Danger
        } else if soft_days < 3 {
            Status::Soon
        } else {
            Status::Normal
        }
    }

    /// Color band for renderers. Repeated delays escalate to `Warning` even
    /// when the deadlines are comfortable.
    pub fn tier(&self, now: NaiveDateTime) -> Tier {
        if self.state.is_terminal() {
            return Tier::Closed;
        }
        match self.status(now) {
            Status::Overdue => Tier::Overdue,
            Status::Danger => Tier::Danger,
            Status::Soon => Tier::Warning,
            _ if self.delays >= 2 => Tier::Warning,
            _ if self.delays >= 1 => Tier::Delayed,
            _ => Tier::Ok,
        }
    }

    /// Push one or both deadlines by `diff`.
    ///
    /// `counted` controls whether the delay counter moves. A shift past the
    /// representable date range fails and leaves the task unchanged.
    pub fn extend(
        &mut self,
        diff: Duration,
        mode: DelayMode,
        counted: bool,
    ) -> Result<Option<Correction>> {
        let shift = |when: NaiveDateTime, moves: bool| {
            if moves {
                when.checked_add_signed(diff)
            } else {
                Some(when)
            }
        };
        let soft = shift(self.soft, mode.moves_soft());
        let hard = shift(self.hard, mode.moves_hard());
        let (Some(soft), Some(hard)) = (soft, hard) else {
            return Err(Error::DeadlineOutOfRange(self.id.clone()));
        };
        self.soft = soft;
        self.hard = hard;
        if counted {
            self.delays = self.delays.saturating_add(1);
        }
        Ok(self.enforce_deadline_order())
    }

    pub fn prioritise(&mut self, delta: i64) {
        self.priority = self.priority.saturating_add(delta);
    }

    pub fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.name = clean_name(name)?;
        Ok(())
    }

    /// Move soft to `hard - 3 days` if it falls after hard.
    pub fn enforce_deadline_order(&mut self) -> Option<Correction> {
        if self.soft <= self.hard {
            return None;
        }
        let rejected = self.soft;
        self.soft = default_soft(self.hard);
        Some(Correction {
            rejected,
            soft: self.soft,
        })
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} {} {}", self.id, self.name, self.priority)?;
        writeln!(f, "Soft {}", self.soft.format("%y-%m-%d %H:%M"))?;
        writeln!(f, "Hard {}", self.hard.format("%y-%m-%d %H:%M"))?;
        writeln!(f, "Delayed {} time(s)", self.delays)?;
        write!(f, "{}", self.state)
    }
}
