//! Form handling for the terminal user interface.
//!
//! Three forms share the same navigation: `TaskForm` creates a task,
//! `EditForm` changes name and priority, and `DelayForm` pushes deadlines
//! out. Text fields and selectors are addressed by their position in the
//! visual order given by the `*_ORDER` constants.

use chrono::{Duration, NaiveDateTime};

use crate::dates::{checked_span, parse_deadline};
use crate::db::Draft;
use crate::error::{Error, Result};
use crate::fields::{DelayMode, PastWeekday};
use crate::task::Task;
use crate::tui::input::InputField;

pub const NAME_ORDER: usize = 0;
pub const PRIORITY_ORDER: usize = 1;
pub const HARD_ORDER: usize = 2;
pub const SOFT_ORDER: usize = 3;
pub const PAST_WEEKDAY_ORDER: usize = 4;

pub const DAYS_ORDER: usize = 0;
pub const HOURS_ORDER: usize = 1;
pub const MINS_ORDER: usize = 2;
pub const SECS_ORDER: usize = 3;
pub const MODE_ORDER: usize = 4;
pub const COUNTED_ORDER: usize = 5;

/// Field navigation and editing shared by every form.
pub trait Form {
    fn field_count(&self) -> usize;
    fn current_field(&self) -> usize;
    fn set_current_field(&mut self, idx: usize);
    /// The text field at `idx`, or `None` for selectors.
    fn text_field_mut(&mut self, idx: usize) -> Option<&mut InputField>;
    /// Step the selector at `idx`; text fields ignore this.
    fn cycle(&mut self, _idx: usize, _forward: bool) {}

    fn update_active_field(&mut self) {
        let current = self.current_field();
        for idx in 0..self.field_count() {
            if let Some(field) = self.text_field_mut(idx) {
                field.active = idx == current;
            }
        }
    }

    fn next_field(&mut self) {
        let next = (self.current_field() + 1) % self.field_count();
        self.set_current_field(next);
        self.update_active_field();
    }

    fn prev_field(&mut self) {
        let count = self.field_count();
        let prev = (self.current_field() + count - 1) % count;
        self.set_current_field(prev);
        self.update_active_field();
    }

    fn active_text(&mut self) -> Option<&mut InputField> {
        let idx = self.current_field();
        self.text_field_mut(idx)
    }

    /// Type into the active field. Space flips a selector.
    fn handle_char(&mut self, c: char) {
        let idx = self.current_field();
        match self.text_field_mut(idx) {
            Some(field) => field.handle_char(c),
            None if c == ' ' => self.cycle(idx, true),
            None => {}
        }
    }

    fn handle_backspace(&mut self) {
        if let Some(field) = self.active_text() {
            field.handle_backspace();
        }
    }

    fn handle_delete(&mut self) {
        if let Some(field) = self.active_text() {
            field.handle_delete();
        }
    }

    /// Move the cursor, or step a selector.
    fn handle_left_right(&mut self, right: bool) {
        let idx = self.current_field();
        match self.text_field_mut(idx) {
            Some(field) if right => field.move_cursor_right(),
            Some(field) => field.move_cursor_left(),
            None => self.cycle(idx, right),
        }
    }
}

fn parse_int(field: &InputField, empty: i64) -> Result<i64> {
    let raw = field.trimmed();
    if raw.is_empty() {
        return Ok(empty);
    }
    raw.parse()
        .map_err(|_| Error::InvalidNumber(raw.to_string()))
}

/// Form for creating a task.
pub struct TaskForm {
    pub name: InputField,
    pub priority: InputField,
    pub hard: InputField,
    pub soft: InputField,
    pub past: PastWeekday,
    pub current_field: usize,
    default_priority: i64,
}

impl TaskForm {
    pub fn new(default_priority: i64, past: PastWeekday) -> Self {
        let mut form = Self {
            name: InputField::new(),
            priority: InputField::new(),
            hard: InputField::new(),
            soft: InputField::new(),
            past,
            current_field: NAME_ORDER,
            default_priority,
        };
        form.update_active_field();
        form
    }

    /// Validate the form into a [`Draft`]; empty priority means the default.
    pub fn to_draft(&self, now: NaiveDateTime) -> Result<Draft> {
        let priority = parse_int(&self.priority, self.default_priority)?;
        let hard = parse_deadline(self.hard.trimmed(), now, self.past)?;
        let soft = match self.soft.trimmed() {
            "" => None,
            raw => Some(parse_deadline(raw, now, self.past)?),
        };
        Ok(Draft {
            name: self.name.value.clone(),
            priority,
            hard,
            soft,
        })
    }

    pub fn past_label(&self) -> &'static str {
        match self.past {
            PastWeekday::ThisWeek => "This week",
            PastWeekday::NextWeek => "Next week",
        }
    }
}

impl Form for TaskForm {
    fn field_count(&self) -> usize {
        5
    }

    fn current_field(&self) -> usize {
        self.current_field
    }

    fn set_current_field(&mut self, idx: usize) {
        self.current_field = idx;
    }

    fn text_field_mut(&mut self, idx: usize) -> Option<&mut InputField> {
        match idx {
            NAME_ORDER => Some(&mut self.name),
            PRIORITY_ORDER => Some(&mut self.priority),
            HARD_ORDER => Some(&mut self.hard),
            SOFT_ORDER => Some(&mut self.soft),
            _ => None,
        }
    }

    fn cycle(&mut self, idx: usize, _forward: bool) {
        if idx == PAST_WEEKDAY_ORDER {
            self.past = match self.past {
                PastWeekday::ThisWeek => PastWeekday::NextWeek,
                PastWeekday::NextWeek => PastWeekday::ThisWeek,
            };
        }
    }
}

/// Form for renaming and re-prioritising an existing task.
pub struct EditForm {
    pub id: String,
    pub name: InputField,
    pub priority: InputField,
    pub current_field: usize,
}

impl EditForm {
    pub fn from_task(task: &Task) -> Self {
        let mut form = Self {
            id: task.id.clone(),
            name: InputField::with_value(&task.name),
            priority: InputField::with_value(&task.priority.to_string()),
            current_field: NAME_ORDER,
        };
        form.update_active_field();
        form
    }

    /// New name and priority. An empty priority is rejected.
    pub fn values(&self) -> Result<(String, i64)> {
        let raw = self.priority.trimmed();
        let priority = raw
            .parse()
            .map_err(|_| Error::InvalidNumber(raw.to_string()))?;
        Ok((self.name.value.clone(), priority))
    }
}

impl Form for EditForm {
    fn field_count(&self) -> usize {
        2
    }

    fn current_field(&self) -> usize {
        self.current_field
    }

    fn set_current_field(&mut self, idx: usize) {
        self.current_field = idx;
    }

    fn text_field_mut(&mut self, idx: usize) -> Option<&mut InputField> {
        match idx {
            NAME_ORDER => Some(&mut self.name),
            PRIORITY_ORDER => Some(&mut self.priority),
            _ => None,
        }
    }
}

/// Form for delaying a task.
pub struct DelayForm {
    pub id: String,
    pub days: InputField,
    pub hours: InputField,
    pub mins: InputField,
    pub secs: InputField,
    pub mode: DelayMode,
    pub counted: bool,
    pub current_field: usize,
}

const MODES: [DelayMode; 3] = [DelayMode::Soft, DelayMode::Hard, DelayMode::Both];

impl DelayForm {
    pub fn new(id: &str) -> Self {
        let mut form = Self {
            id: id.to_string(),
            days: InputField::new(),
            hours: InputField::new(),
            mins: InputField::new(),
            secs: InputField::new(),
            mode: DelayMode::Both,
            counted: true,
            current_field: DAYS_ORDER,
        };
        form.update_active_field();
        form
    }

    /// Sum of the unit fields; blank fields count as zero.
    pub fn duration(&self) -> Result<Duration> {
        let days = parse_int(&self.days, 0)?;
        let hours = parse_int(&self.hours, 0)?;
        let mins = parse_int(&self.mins, 0)?;
        let secs = parse_int(&self.secs, 0)?;
        checked_span(days, hours, mins, secs)
            .ok_or_else(|| Error::InvalidNumber(format!("{days}d {hours}h {mins}m {secs}s")))
    }
}

impl Form for DelayForm {
    fn field_count(&self) -> usize {
        6
    }

    fn current_field(&self) -> usize {
        self.current_field
    }

    fn set_current_field(&mut self, idx: usize) {
        self.current_field = idx;
    }

    fn text_field_mut(&mut self, idx: usize) -> Option<&mut InputField> {
        match idx {
            DAYS_ORDER => Some(&mut self.days),
            HOURS_ORDER => Some(&mut self.hours),
            MINS_ORDER => Some(&mut self.mins),
            SECS_ORDER => Some(&mut self.secs),
            _ => None,
        }
    }

    fn cycle(&mut self, idx: usize, forward: bool) {
        match idx {
            MODE_ORDER => {
                let pos = MODES.iter().position(|m| *m == self.mode).unwrap_or(2);
                let next = if forward { pos + 1 } else { pos + MODES.len() - 1 };
                self.mode = MODES[next % MODES.len()];
            }
            COUNTED_ORDER => self.counted = !self.counted,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::testing::*;

    fn type_str(form: &mut impl Form, s: &str) {
        for c in s.chars() {
            form.handle_char(c);
        }
    }

    #[test]
    fn test_task_form_to_draft() {
        let now = at(2025, 1, 8, 12, 0);
        let mut form = TaskForm::new(10, PastWeekday::NextWeek);
        type_str(&mut form, "Book flights");
        form.next_field();
        form.next_field();
        type_str(&mut form, "250120");
        let draft = form.to_draft(now).unwrap();
        assert_eq!(draft.name, "Book flights");
        assert_eq!(draft.priority, 10);
        assert_eq!(draft.hard, day(2025, 1, 20));
        assert!(draft.soft.is_none());
    }

    #[test]
    fn test_task_form_past_weekday_selector() {
        let now = at(2025, 1, 8, 12, 0);
        let mut form = TaskForm::new(10, PastWeekday::NextWeek);
        type_str(&mut form, "x");
        form.set_current_field(HARD_ORDER);
        type_str(&mut form, "mon");
        assert_eq!(form.to_draft(now).unwrap().hard, day(2025, 1, 13));

        form.set_current_field(PAST_WEEKDAY_ORDER);
        form.handle_left_right(true);
        assert_eq!(form.past, PastWeekday::ThisWeek);
        assert_eq!(form.to_draft(now).unwrap().hard, day(2025, 1, 6));
    }

    #[test]
    fn test_task_form_errors() {
        let now = at(2025, 1, 8, 12, 0);
        let mut form = TaskForm::new(10, PastWeekday::NextWeek);
        form.set_current_field(PRIORITY_ORDER);
        type_str(&mut form, "high");
        assert!(matches!(form.to_draft(now), Err(Error::InvalidNumber(_))));

        form.priority.clear();
        form.set_current_field(HARD_ORDER);
        type_str(&mut form, "someday");
        assert!(matches!(form.to_draft(now), Err(Error::UnresolvableDate(_))));
    }

    #[test]
    fn test_navigation_wraps_and_marks_active() {
        let mut form = TaskForm::new(10, PastWeekday::NextWeek);
        assert!(form.name.active);
        form.prev_field();
        assert_eq!(form.current_field, PAST_WEEKDAY_ORDER);
        assert!(!form.name.active);
        form.next_field();
        assert_eq!(form.current_field, NAME_ORDER);
        assert!(form.name.active);
    }

    #[test]
    fn test_edit_form_values() {
        let t = task("abc", day(2025, 1, 5), day(2025, 1, 8), 5);
        let mut form = EditForm::from_task(&t);
        assert_eq!(form.values().unwrap(), (t.name.clone(), 5));
        form.next_field();
        form.handle_backspace();
        type_str(&mut form, "-3");
        assert_eq!(form.values().unwrap().1, -3);
        form.priority.clear();
        assert!(form.values().is_err());
    }

    #[test]
    fn test_delay_form() {
        let mut form = DelayForm::new("abc");
        type_str(&mut form, "2");
        form.next_field();
        type_str(&mut form, "3");
        assert_eq!(form.duration().unwrap(), Duration::hours(51));

        form.set_current_field(MODE_ORDER);
        form.handle_left_right(true);
        assert_eq!(form.mode, DelayMode::Soft);
        form.handle_left_right(false);
        form.handle_left_right(false);
        assert_eq!(form.mode, DelayMode::Hard);

        form.set_current_field(COUNTED_ORDER);
        form.handle_char(' ');
        assert!(!form.counted);

        form.set_current_field(SECS_ORDER);
        type_str(&mut form, "x");
        assert!(matches!(form.duration(), Err(Error::InvalidNumber(_))));

        form.secs.clear();
        form.days.clear();
        form.days.handle_char('-');
        for c in i64::MAX.to_string().chars() {
            form.days.handle_char(c);
        }
        assert!(matches!(form.duration(), Err(Error::InvalidNumber(_))));
    }
}
