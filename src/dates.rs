//! Date parsing and formatting helpers.
//!
//! Deadlines are local naive timestamps with minute precision. Everything here
//! takes `now` explicitly so callers (and tests) control the clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::error::{Error, Result};
use crate::fields::PastWeekday;

/// Timestamp layout of the persisted line format and of full user input.
pub const STAMP_FORMAT: &str = "%y%m%dT%H%M";

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days in `d`, rounded toward negative infinity.
///
/// A deadline one minute in the past is day -1, not day 0.
pub fn floor_days(d: Duration) -> i64 {
    d.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Sum of whole days, hours, minutes and seconds, or `None` when any part or
/// the total falls outside chrono's duration range.
pub fn checked_span(days: i64, hours: i64, mins: i64, secs: i64) -> Option<Duration> {
    Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(mins)?)?
        .checked_add(&Duration::try_seconds(secs)?)
}

/// Current local time truncated to the minute.
pub fn now_local() -> NaiveDateTime {
    truncate_to_minute(chrono::Local::now().naive_local())
}

pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Full English weekday name.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    let days = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    days.into_iter().find(|d| {
        let full = weekday_name(*d).to_lowercase();
        s == full || s == &full[..3]
    })
}

/// Resolve a deadline expression typed by the user.
///
/// Supports:
/// - `241231T2359` (two-digit year, date and time)
/// - `241231` (midnight)
/// - `mon`..`sun` or full weekday names (midnight, this week; see [`PastWeekday`])
/// - `today`, `tomorrow`
/// - `in 3d`, `in 2w`
pub fn parse_deadline(input: &str, now: NaiveDateTime, past: PastWeekday) -> Result<NaiveDateTime> {
    let s = input.trim().to_lowercase();
    let today = now.date();
    let unresolvable = || Error::UnresolvableDate(input.trim().to_string());
    let days_from_today = |n: i64| {
        Duration::try_days(n)
            .and_then(|d| today.checked_add_signed(d))
            .map(midnight)
            .ok_or_else(unresolvable)
    };

    match s.as_str() {
        "today" => return Ok(midnight(today)),
        "tomorrow" => return days_from_today(1),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(n) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return days_from_today(n);
        }
        if let Some(n) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return n.checked_mul(7).ok_or_else(unresolvable).and_then(days_from_today);
        }
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(&s.to_uppercase(), STAMP_FORMAT) {
        return Ok(dt);
    }
    if s.len() == 6 {
        if let Ok(d) = NaiveDate::parse_from_str(&s, "%y%m%d") {
            return Ok(midnight(d));
        }
    }

    if let Some(target) = parse_weekday(&s) {
        let current = today.weekday().num_days_from_monday() as i64;
        let wanted = target.num_days_from_monday() as i64;
        let mut offset = wanted - current;
        if offset < 0 && past == PastWeekday::NextWeek {
            offset += 7;
        }
        return days_from_today(offset);
    }

    Err(unresolvable())
}

/// Format a deadline relative to `now` ("Today", "Next Monday", "3d ago").
pub fn format_relative(when: NaiveDateTime, now: NaiveDateTime) -> String {
    let days = floor_days(when - now);
    // Calendar days first, so a deadline at midnight today still reads "Today".
    if when.date() == now.date() {
        return "Today".into();
    }
    if now.date().pred_opt() == Some(when.date()) {
        return "Yesterday".into();
    }
    if now.date().succ_opt() == Some(when.date()) {
        return "Tomorrow".into();
    }
    if days < 0 {
        return format!("{}d ago", -days);
    }
    if days < 7 {
        let name = weekday_name(when.weekday());
        if when.weekday().num_days_from_monday() > now.weekday().num_days_from_monday() {
            return name.to_string();
        }
        return format!("Next {name}");
    }
    if days < 10 {
        return format!("In {days}d");
    }
    when.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    // 2025-01-08 is a Wednesday.
    fn wednesday_noon() -> NaiveDateTime {
        at(2025, 1, 8, 12, 0)
    }

    #[test]
    fn test_floor_days_rounds_down() {
        assert_eq!(floor_days(Duration::minutes(-1)), -1);
        assert_eq!(floor_days(Duration::minutes(1)), 0);
        assert_eq!(floor_days(Duration::hours(47)), 1);
        assert_eq!(floor_days(Duration::hours(-25)), -2);
        assert_eq!(floor_days(Duration::zero()), 0);
    }

    #[test]
    fn test_checked_span() {
        assert_eq!(checked_span(1, 2, 3, 4), Some(Duration::seconds(86_400 + 7_384)));
        assert_eq!(checked_span(0, -1, 0, 30), Some(Duration::seconds(-3_570)));
        assert_eq!(checked_span(i64::MAX / 1000, 0, 0, 0), None);
        assert_eq!(checked_span(0, 0, 0, i64::MAX), None);
        let most = i64::MAX / 1000 / 86_400;
        assert_eq!(checked_span(most, most, 0, 0), None);
    }

    #[test]
    fn test_parse_stamp_and_date() {
        let now = wednesday_noon();
        assert_eq!(
            parse_deadline("250131T2359", now, PastWeekday::NextWeek).unwrap(),
            at(2025, 1, 31, 23, 59)
        );
        assert_eq!(
            parse_deadline("250131t0930", now, PastWeekday::NextWeek).unwrap(),
            at(2025, 1, 31, 9, 30)
        );
        assert_eq!(
            parse_deadline("250131", now, PastWeekday::NextWeek).unwrap(),
            at(2025, 1, 31, 0, 0)
        );
    }

    #[test]
    fn test_parse_relative_words() {
        let now = wednesday_noon();
        assert_eq!(parse_deadline("today", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 8, 0, 0));
        assert_eq!(parse_deadline("Tomorrow", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 9, 0, 0));
        assert_eq!(parse_deadline("in 3d", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 11, 0, 0));
        assert_eq!(parse_deadline("in 2w", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 22, 0, 0));
    }

    #[test]
    fn test_parse_weekday_future_and_past() {
        let now = wednesday_noon();
        assert_eq!(parse_deadline("Fri", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 10, 0, 0));
        assert_eq!(parse_deadline("wednesday", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 8, 0, 0));
        assert_eq!(parse_deadline("Mon", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 13, 0, 0));
        assert_eq!(parse_deadline("Mon", now, PastWeekday::ThisWeek).unwrap(), at(2025, 1, 6, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let now = wednesday_noon();
        for bad in ["", "someday", "2501", "251399", "in xd"] {
            assert!(matches!(
                parse_deadline(bad, now, PastWeekday::NextWeek),
                Err(Error::UnresolvableDate(_))
            ), "{bad} should not parse");
        }
    }

    #[test]
    fn test_parse_far_offsets_are_unresolvable() {
        let now = wednesday_noon();
        for far in ["in 1000000000d", "in -1000000000d", "in 9223372036854775807d", "in 2000000000000000000w"] {
            assert!(matches!(
                parse_deadline(far, now, PastWeekday::NextWeek),
                Err(Error::UnresolvableDate(input)) if input == far
            ), "{far} should not resolve");
        }
        assert_eq!(parse_deadline("in 0d", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 8, 0, 0));
        assert_eq!(parse_deadline("in -1w", now, PastWeekday::NextWeek).unwrap(), at(2025, 1, 1, 0, 0));
    }

    #[test]
    fn test_format_relative() {
        let now = wednesday_noon();
        assert_eq!(format_relative(at(2025, 1, 5, 12, 0), now), "3d ago");
        assert_eq!(format_relative(at(2025, 1, 7, 18, 0), now), "Yesterday");
        assert_eq!(format_relative(at(2025, 1, 8, 18, 0), now), "Today");
        assert_eq!(format_relative(at(2025, 1, 8, 0, 0), now), "Today");
        assert_eq!(format_relative(at(2025, 1, 7, 0, 0), now), "Yesterday");
        assert_eq!(format_relative(at(2025, 1, 9, 0, 0), now), "Tomorrow");
        assert_eq!(format_relative(at(2025, 1, 10, 12, 0), now), "Friday");
        assert_eq!(format_relative(at(2025, 1, 13, 12, 0), now), "Next Monday");
        assert_eq!(format_relative(at(2025, 1, 16, 12, 0), now), "In 8d");
        assert_eq!(format_relative(at(2025, 2, 1, 9, 5), now), "2025-02-01 09:05");
    }

    #[test]
    fn test_truncate_to_minute() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 8)
            .unwrap()
            .and_hms_opt(12, 34, 56)
            .unwrap();
        assert_eq!(truncate_to_minute(dt), at(2025, 1, 8, 12, 34));
    }
}
