//! Enumerations and field types for task tracking.
//!
//! This module defines the small closed sets the rest of the crate works with:
//! lifecycle states, derived urgency status, display tiers and the knobs used
//! when delaying or scheduling a task.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where a task sits in its life.
///
/// The persisted line format does not store this directly: it is recovered
/// from the identifier length (see [`Lifecycle::id_len`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Lifecycle {
    Active,
    Completed,
    Cancelled,
}

impl Lifecycle {
    /// Identifier length that encodes this state.
    pub fn id_len(self) -> usize {
        match self {
            Lifecycle::Active => 3,
            Lifecycle::Cancelled => 5,
            Lifecycle::Completed => 6,
        }
    }

    /// Decode a state from an identifier length.
    pub fn from_id_len(len: usize) -> Option<Self> {
        match len {
            3 => Some(Lifecycle::Active),
            5 => Some(Lifecycle::Cancelled),
            6 => Some(Lifecycle::Completed),
            _ => None,
        }
    }

    /// Position in the ranking cascade. Active outranks Completed, which
    /// outranks Cancelled.
    pub fn rank(self) -> i8 {
        match self {
            Lifecycle::Active => 0,
            Lifecycle::Completed => -1,
            Lifecycle::Cancelled => -2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Lifecycle::Active
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::Active => "Active",
            Lifecycle::Completed => "Completed",
            Lifecycle::Cancelled => "Cancelled",
        })
    }
}

/// Urgency derived from deadlines and lifecycle at a given instant.
///
/// Variants are declared in ascending rank so the derived `Ord` agrees with
/// [`Status::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Cancelled,
    Completed,
    Normal,
    Soon,
    Danger,
    Overdue,
}

impl Status {
    pub fn rank(self) -> i8 {
        match self {
            Status::Cancelled => -2,
            Status::Completed => -1,
            Status::Normal => 0,
            Status::Soon => 1,
            Status::Danger => 2,
            Status::Overdue => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Cancelled => "Cancelled",
            Status::Completed => "Completed",
            Status::Normal => "Normal",
            Status::Soon => "Soon",
            Status::Danger => "Danger",
            Status::Overdue => "Overdue",
        }
    }
}

/// Color band a renderer paints a row with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Hard deadline passed.
    Overdue,
    /// Soft deadline passed, hard deadline not yet.
    Danger,
    /// Soft deadline within three days, or delayed at least twice.
    Warning,
    /// Delayed once, otherwise comfortable.
    Delayed,
    Ok,
    /// Completed or cancelled.
    Closed,
}

/// Which deadline(s) a delay moves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DelayMode {
    Soft,
    Hard,
    #[default]
    Both,
}

impl DelayMode {
    pub fn moves_soft(self) -> bool {
        matches!(self, DelayMode::Soft | DelayMode::Both)
    }

    pub fn moves_hard(self) -> bool {
        matches!(self, DelayMode::Hard | DelayMode::Both)
    }

    pub fn label(self) -> &'static str {
        match self {
            DelayMode::Soft => "Soft",
            DelayMode::Hard => "Hard",
            DelayMode::Both => "Both",
        }
    }
}

/// How a weekday name that already passed this week is resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PastWeekday {
    /// Keep the date from earlier this week (a deadline in the past).
    ThisWeek,
    /// Roll forward to the same weekday next week.
    #[default]
    NextWeek,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_len_round_trips() {
        for state in [Lifecycle::Active, Lifecycle::Completed, Lifecycle::Cancelled] {
            assert_eq!(Lifecycle::from_id_len(state.id_len()), Some(state));
        }
        assert_eq!(Lifecycle::from_id_len(4), None);
        assert_eq!(Lifecycle::from_id_len(0), None);
    }

    #[test]
    fn test_status_order_matches_rank() {
        let all = [
            Status::Cancelled,
            Status::Completed,
            Status::Normal,
            Status::Soon,
            Status::Danger,
            Status::Overdue,
        ];
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_delay_mode_moves() {
        assert!(DelayMode::Soft.moves_soft() && !DelayMode::Soft.moves_hard());
        assert!(!DelayMode::Hard.moves_soft() && DelayMode::Hard.moves_hard());
        assert!(DelayMode::Both.moves_soft() && DelayMode::Both.moves_hard());
    }
}
