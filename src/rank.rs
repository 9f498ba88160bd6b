//! Display ordering of tasks.
//!
//! [`compare`] returns `Ordering::Greater` when `a` is more important than `b`.
//! The cascade, first mismatch wins:
//!
//! 1. lifecycle (active, then completed, then cancelled)
//! 2. urgency status, where `Normal` counts as `Soon`
//! 3. priority
//! 4. deadlines: a task whose deadlines are both strictly later is less
//!    important; otherwise the earlier soft deadline wins.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::fields::Status;
use crate::task::Task;

/// Status rank as seen by the comparator.
///
/// `Normal` is folded into `Soon` here only; [`Task::status`] still reports
/// `Normal` for display.
pub fn ranking_status(task: &Task, now: NaiveDateTime) -> i8 {
    match task.status(now) {
        Status::Normal => Status::Soon.rank(),
        s => s.rank(),
    }
}

fn compare_deadlines(a: &Task, b: &Task) -> Ordering {
    if a.soft > b.soft && a.hard > b.hard {
        return Ordering::Less;
    }
    if a.soft < b.soft && a.hard < b.hard {
        return Ordering::Greater;
    }
    b.soft.cmp(&a.soft)
}

/// Importance of `a` relative to `b` at `now`.
pub fn compare(a: &Task, b: &Task, now: NaiveDateTime) -> Ordering {
    a.state
        .rank()
        .cmp(&b.state.rank())
        .then_with(|| ranking_status(a, now).cmp(&ranking_status(b, now)))
        .then_with(|| a.priority.cmp(&b.priority))
        .then_with(|| compare_deadlines(a, b))
}

/// Tasks sorted most important first. Ties keep their input order.
pub fn ranked<'a, I>(tasks: I, now: NaiveDateTime) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut out: Vec<&Task> = tasks.into_iter().collect();
    out.sort_by(|a, b| compare(b, a, now));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Lifecycle;
    use crate::task::testing::*;

    fn now() -> NaiveDateTime {
        at(2025, 1, 3, 12, 0)
    }

    #[test]
    fn test_overdue_beats_danger_regardless_of_priority() {
        let overdue = task("aaa", day(2024, 12, 20), at(2025, 1, 2, 12, 0), -100);
        let danger = task("bbb", day(2025, 1, 1), day(2025, 1, 20), 1_000);
        assert_eq!(overdue.status(now()), Status::Overdue);
        assert_eq!(danger.status(now()), Status::Danger);
        assert_eq!(compare(&overdue, &danger, now()), Ordering::Greater);
        assert_eq!(compare(&danger, &overdue, now()), Ordering::Less);
    }

    #[test]
    fn test_earlier_deadlines_rank_higher() {
        let a = task("aaa", day(2025, 1, 10), day(2025, 1, 15), 5);
        let b = task("bbb", day(2025, 1, 5), day(2025, 1, 8), 5);
        assert_eq!(ranking_status(&a, now()), ranking_status(&b, now()));
        assert_eq!(compare(&b, &a, now()), Ordering::Greater);
        let order: Vec<&str> = ranked([&a, &b], now()).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, ["bbb", "aaa"]);
    }

    #[test]
    fn test_normal_ranks_like_soon() {
        let normal = task("aaa", day(2025, 2, 1), day(2025, 2, 5), 10);
        let soon = task("bbb", day(2025, 1, 4), day(2025, 1, 8), 3);
        assert_eq!(normal.status(now()), Status::Normal);
        assert_eq!(soon.status(now()), Status::Soon);
        // Same effective status, so priority decides.
        assert_eq!(compare(&normal, &soon, now()), Ordering::Greater);
    }

    #[test]
    fn test_lifecycle_order() {
        let active = task("aaa", day(2025, 2, 1), day(2025, 2, 5), -10);
        let done = task("aaaxyz", day(2024, 1, 1), day(2024, 1, 2), 100);
        let dropped = task("aaaxy", day(2024, 1, 1), day(2024, 1, 2), 100);
        assert_eq!(done.state, Lifecycle::Completed);
        assert_eq!(dropped.state, Lifecycle::Cancelled);
        assert_eq!(compare(&active, &done, now()), Ordering::Greater);
        assert_eq!(compare(&done, &dropped, now()), Ordering::Greater);
        let order: Vec<&str> = ranked([&dropped, &done, &active], now())
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(order, ["aaa", "aaaxyz", "aaaxy"]);
    }

    #[test]
    fn test_priority_breaks_status_tie() {
        let low = task("aaa", day(2025, 1, 1), day(2025, 1, 9), 1);
        let high = task("bbb", day(2025, 1, 2), day(2025, 1, 30), 2);
        assert_eq!(compare(&high, &low, now()), Ordering::Greater);
    }

    #[test]
    fn test_mixed_deadlines_fall_back_to_soft() {
        // a: earlier soft, later hard.
        let a = task("aaa", day(2025, 2, 1), day(2025, 3, 1), 0);
        let b = task("bbb", day(2025, 2, 5), day(2025, 2, 20), 0);
        assert_eq!(compare(&a, &b, now()), Ordering::Greater);
        assert_eq!(compare(&b, &a, now()), Ordering::Less);
    }

    #[test]
    fn test_equal_tasks_compare_equal() {
        let a = task("aaa", day(2025, 2, 1), day(2025, 3, 1), 0);
        let mut b = a.clone();
        b.id = "bbb".into();
        assert_eq!(compare(&a, &b, now()), Ordering::Equal);
        let order: Vec<&str> = ranked([&a, &b], now()).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, ["aaa", "bbb"]);
    }

    mod properties {
        use chrono::Duration;
        use proptest::prelude::*;

        use super::*;

        fn arb_task() -> impl Strategy<Value = Task> {
            (
                prop_oneof![Just("aaa"), Just("aaabbb"), Just("aaabb")],
                -20i64..40,
                0i64..20,
                -3i64..3,
                0u32..3,
            )
                .prop_map(|(id, soft_offset, gap, priority, delays)| {
                    let soft = day(2025, 1, 3) + Duration::hours(soft_offset * 12);
                    let hard = soft + Duration::hours(gap * 12);
                    let mut t = task(id, soft, hard, priority);
                    t.delays = delays;
                    t
                })
        }

        proptest! {
            #[test]
            fn status_is_pure(t in arb_task()) {
                prop_assert_eq!(t.status(now()), t.status(now()));
            }

            #[test]
            fn compare_is_irreflexive(a in arb_task()) {
                prop_assert_eq!(compare(&a, &a, now()), Ordering::Equal);
            }

            #[test]
            fn compare_is_antisymmetric(a in arb_task(), b in arb_task()) {
                prop_assert_eq!(compare(&a, &b, now()), compare(&b, &a, now()).reverse());
            }

            #[test]
            fn compare_is_transitive(a in arb_task(), b in arb_task(), c in arb_task()) {
                let n = now();
                if compare(&a, &b, n) == Ordering::Greater && compare(&b, &c, n) == Ordering::Greater {
                    prop_assert_eq!(compare(&a, &c, n), Ordering::Greater);
                }
                if compare(&a, &b, n) == Ordering::Equal && compare(&b, &c, n) == Ordering::Equal {
                    prop_assert_eq!(compare(&a, &c, n), Ordering::Equal);
                }
            }

            #[test]
            fn equivalence_is_respected(a in arb_task(), b in arb_task(), c in arb_task()) {
                let n = now();
                if compare(&a, &b, n) == Ordering::Equal {
                    prop_assert_eq!(compare(&a, &c, n), compare(&b, &c, n));
                }
            }
        }
    }
}
