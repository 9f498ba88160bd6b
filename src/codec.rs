//! Line-oriented persisted format.
//!
//! One task per line, whitespace separated:
//!
//! ```text
//! <id> <soft:yyMMddTHHmm> <hard:yyMMddTHHmm> <name> <priority> <delays>
//! ```
//!
//! Spaces in names are written as `_`. A literal underscore is written as
//! `\_` and a backslash as `\\`, so every name round-trips. Lifecycle state
//! is not a field: it is decoded from the identifier length.

use chrono::NaiveDateTime;

use crate::dates::STAMP_FORMAT;
use crate::ident;
use crate::task::Task;

const FIELDS: usize = 6;

/// Escape a name into a single whitespace-free token.
pub fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '_' => out.push_str("\\_"),
            ' ' => out.push('_'),
            c => out.push(c),
        }
    }
    out
}

/// Reverse of [`encode_name`]. A dangling backslash is kept as-is.
pub fn decode_name(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            },
            '_' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Render one task as a line (without the trailing newline).
pub fn encode(task: &Task) -> String {
    format!(
        "{} {} {} {} {} {}",
        task.id,
        task.soft.format(STAMP_FORMAT),
        task.hard.format(STAMP_FORMAT),
        encode_name(&task.name),
        task.priority,
        task.delays
    )
}

fn stamp(field: &str, what: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(field, STAMP_FORMAT)
        .map_err(|e| format!("bad {what} deadline '{field}': {e}"))
}

/// Parse one non-blank line into a task.
///
/// The id is lowercased; its length decides the lifecycle state.
pub fn decode(line: &str) -> Result<Task, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != FIELDS {
        return Err(format!("expected {FIELDS} fields, found {}", fields.len()));
    }

    let id = ident::normalise(fields[0]);
    let state = ident::decode(&id)?;
    let soft = stamp(fields[1], "soft")?;
    let hard = stamp(fields[2], "hard")?;
    let name = decode_name(fields[3]);
    let priority = fields[4]
        .parse::<i64>()
        .map_err(|e| format!("bad priority '{}': {e}", fields[4]))?;
    let delays = fields[5]
        .parse::<u32>()
        .map_err(|e| format!("bad delay count '{}': {e}", fields[5]))?;

    Ok(Task {
        id,
        soft,
        hard,
        name,
        priority,
        state,
        delays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Lifecycle;
    use crate::task::testing::*;

    #[test]
    fn test_encode_line() {
        let mut t = task("abc", at(2025, 1, 10, 9, 30), at(2025, 1, 15, 17, 0), -4);
        t.name = "Write the report".into();
        t.delays = 2;
        assert_eq!(encode(&t), "abc 250110T0930 250115T1700 Write_the_report -4 2");
    }

    #[test]
    fn test_decode_line() {
        let t = decode("ABCDEF 250110T0930 250115T1700 Write_the_report 7 1").unwrap();
        assert_eq!(t.id, "abcdef");
        assert_eq!(t.state, Lifecycle::Completed);
        assert_eq!(t.soft, at(2025, 1, 10, 9, 30));
        assert_eq!(t.hard, at(2025, 1, 15, 17, 0));
        assert_eq!(t.name, "Write the report");
        assert_eq!(t.priority, 7);
        assert_eq!(t.delays, 1);
    }

    #[test]
    fn test_line_round_trip() {
        let mut t = task("xy7q1", at(2025, 3, 1, 8, 0), at(2025, 3, 2, 8, 0), 12);
        t.name = r"snake_case and back\slash".into();
        t.delays = 4;
        let back = decode(&encode(&t)).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(encode_name("a b_c"), r"a_b\_c");
        assert_eq!(decode_name(r"a_b\_c"), "a b_c");
        assert_eq!(encode_name(r"x\y"), r"x\\y");
        assert_eq!(decode_name(r"x\\y"), r"x\y");
        assert_eq!(decode_name("trailing\\"), "trailing\\");
        // Lines written without escapes still decode the old way.
        assert_eq!(decode_name("Buy_milk"), "Buy milk");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let cases = [
            "abc 250110T0930 250115T1700 name 1",
            "abc 250110T0930 250115T1700 name 1 0 extra",
            "abcd 250110T0930 250115T1700 name 1 0",
            "ab! 250110T0930 250115T1700 name 1 0",
            "abc 2501100930 250115T1700 name 1 0",
            "abc 250110T0930 251315T1700 name 1 0",
            "abc 250110T0930 250115T1700 name one 0",
            "abc 250110T0930 250115T1700 name 1 -1",
        ];
        for line in cases {
            assert!(decode(line).is_err(), "{line} should be rejected");
        }
    }
}
