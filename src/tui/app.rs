//! Main application logic for the terminal user interface.
//!
//! `App` owns the loaded store and the screen state. The ranked view is
//! recomputed on every draw, so urgency follows the clock while the UI is
//! open. Selection is tracked by task id and survives re-ranking and
//! lifecycle changes that rewrite the id.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDateTime};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::cmd::{truncate, Session};
use crate::dates::{format_relative, now_local, weekday_name};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::fields::{PastWeekday, Tier};
use crate::tui::{
    colors::{tier_style, DARK_GREEN, DARK_RED, GOLD},
    enums::{AppState, PendingAction},
    input::InputField,
    task_form::*,
    utils::centered_rect,
};

/// Main application state for the terminal user interface.
pub struct App {
    state: AppState,
    db: Database,
    read: PathBuf,
    write: PathBuf,
    table_state: TableState,
    /// Ids in ranked order as of the last draw.
    visible: Vec<String>,
    selected: Option<String>,
    show_closed: bool,
    task_form: TaskForm,
    edit_form: Option<EditForm>,
    delay_form: Option<DelayForm>,
    pending: Option<PendingAction>,
    status_message: String,
    dirty: bool,
    default_priority: i64,
    past_weekday: PastWeekday,
}

fn load_summary(db: &Database, issues: &[Error]) -> String {
    match issues.first() {
        None => format!("Loaded {} tasks", db.len()),
        Some(first) => format!(
            "Loaded {} tasks, {} warning(s): {first}",
            db.len(),
            issues.len()
        ),
    }
}

impl App {
    /// Load the session's read file into a fresh UI.
    pub fn new(session: &Session) -> Result<Self> {
        let (db, issues) = Database::load(&session.read)?;
        let status_message = load_summary(&db, &issues);
        let mut app = App {
            state: AppState::TaskList,
            db,
            read: session.read.clone(),
            write: session.write.clone(),
            table_state: TableState::default(),
            visible: Vec::new(),
            selected: None,
            show_closed: session.config.show_completed,
            task_form: TaskForm::new(session.config.default_priority, session.config.past_weekday),
            edit_form: None,
            delay_form: None,
            pending: None,
            status_message,
            dirty: false,
            default_priority: session.config.default_priority,
            past_weekday: session.config.past_weekday,
        };
        app.refresh_view(now_local());
        Ok(app)
    }

    /// Re-rank and keep the selection on the same task where possible.
    fn refresh_view(&mut self, now: NaiveDateTime) {
        self.visible = self
            .db
            .ranked(now, self.show_closed)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();

        if self.visible.is_empty() {
            self.selected = None;
            self.table_state.select(None);
            return;
        }
        let idx = self
            .selected
            .as_ref()
            .and_then(|id| self.visible.iter().position(|v| v == id))
            .unwrap_or_else(|| {
                self.table_state
                    .selected()
                    .unwrap_or(0)
                    .min(self.visible.len() - 1)
            });
        self.table_state.select(Some(idx));
        self.selected = Some(self.visible[idx].clone());
    }

    fn move_selection(&mut self, down: bool) {
        if self.visible.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(self.visible.len() - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
        self.selected = Some(self.visible[next].clone());
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn report(&mut self, result: Result<String>) {
        match result {
            Ok(msg) => self.set_status_message(msg),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn save(&mut self) -> Result<String> {
        self.db.save(&self.write)?;
        self.dirty = false;
        Ok(format!("Saved {} tasks to {}", self.db.len(), self.write.display()))
    }

    fn reload(&mut self) -> Result<String> {
        let (db, issues) = Database::load(&self.read)?;
        self.db = db;
        self.dirty = false;
        let msg = load_summary(&self.db, &issues);
        self.refresh_view(now_local());
        Ok(msg)
    }

    fn toggle_complete(&mut self) -> Result<String> {
        let Some(id) = self.selected.clone() else {
            return Ok("No task selected".to_string());
        };
        let new_id = self.db.toggle_complete(&id)?;
        self.after_transition(&id, new_id)
    }

    fn toggle_cancel(&mut self) -> Result<String> {
        let Some(id) = self.selected.clone() else {
            return Ok("No task selected".to_string());
        };
        let new_id = self.db.toggle_cancel(&id)?;
        self.after_transition(&id, new_id)
    }

    fn nudge_priority(&mut self, delta: i64) -> Result<String> {
        let Some(id) = self.selected.clone() else {
            return Ok("No task selected".to_string());
        };
        let priority = self.db.prioritise(&id, delta)?;
        self.dirty = true;
        Ok(format!("Priority of {id} is now {priority}"))
    }

    fn after_transition(&mut self, old: &str, new_id: String) -> Result<String> {
        self.dirty = true;
        self.selected = Some(new_id.clone());
        let state = self
            .db
            .get(&new_id)
            .map(|t| t.state.to_string())
            .unwrap_or_default();
        Ok(format!("{old} is now {state} ({new_id})"))
    }

    fn create_task(&mut self) -> Result<String> {
        let draft = self.task_form.to_draft(now_local())?;
        let created = self.db.create(draft)?;
        self.dirty = true;
        self.selected = Some(created.id.clone());
        Ok(match created.correction {
            Some(c) => format!("Added {} (warning: {c})", created.id),
            None => format!("Added {}", created.id),
        })
    }

    fn update_task(&mut self) -> Result<String> {
        let Some(form) = self.edit_form.as_ref() else {
            return Ok("No task selected".to_string());
        };
        let id = form.id.clone();
        let (name, priority) = form.values()?;
        self.db.rename(&id, &name)?;
        self.db.set_priority(&id, priority)?;
        self.dirty = true;
        Ok(format!("Updated {id}"))
    }

    fn delay_task(&mut self) -> Result<String> {
        let Some(form) = self.delay_form.as_ref() else {
            return Ok("No task selected".to_string());
        };
        let id = form.id.clone();
        let (diff, mode, counted) = (form.duration()?, form.mode, form.counted);
        let correction = self.db.delay(&id, diff, mode, counted)?;
        self.dirty = true;
        let delays = self.db.get(&id).map(|t| t.delays).unwrap_or_default();
        Ok(match correction {
            Some(c) => format!("Delayed {id} (warning: {c})"),
            None => format!("Delayed {id}, {delays} delay(s) so far"),
        })
    }

    /// Ask before discarding unsaved changes.
    fn guard(&mut self, action: PendingAction) -> bool {
        if self.dirty {
            self.pending = Some(action);
            self.state = AppState::Confirm;
            false
        } else {
            true
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return self.guard(PendingAction::QuitUnsaved);
            }
            KeyCode::Char('q') | KeyCode::Esc => return self.guard(PendingAction::QuitUnsaved),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Char('t') => {
                self.show_closed = !self.show_closed;
                self.refresh_view(now_local());
            }
            KeyCode::Char('a') => {
                self.task_form = TaskForm::new(self.default_priority, self.past_weekday);
                self.state = AppState::AddTask;
            }
            KeyCode::Char('e') => {
                if let Some(task) = self.selected.as_deref().and_then(|id| self.db.get(id)) {
                    self.edit_form = Some(EditForm::from_task(task));
                    self.state = AppState::EditTask;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected.clone() {
                    self.delay_form = Some(DelayForm::new(&id));
                    self.state = AppState::DelayTask;
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let result = self.nudge_priority(1);
                self.report(result);
            }
            KeyCode::Char('-') => {
                let result = self.nudge_priority(-1);
                self.report(result);
            }
            KeyCode::Char('c') => {
                let result = self.toggle_complete();
                self.report(result);
            }
            KeyCode::Char('x') => {
                let result = self.toggle_cancel();
                self.report(result);
            }
            KeyCode::Char('s') => {
                let result = self.save();
                self.report(result);
            }
            KeyCode::Char('r') => {
                if self.guard(PendingAction::ReloadUnsaved) {
                    let result = self.reload();
                    self.report(result);
                }
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn active_form(&mut self) -> Option<&mut dyn Form> {
        match self.state {
            AppState::AddTask => Some(&mut self.task_form as &mut dyn Form),
            AppState::EditTask => self.edit_form.as_mut().map(|f| f as &mut dyn Form),
            AppState::DelayTask => self.delay_form.as_mut().map(|f| f as &mut dyn Form),
            _ => None,
        }
    }

    fn handle_form_input(&mut self, key: KeyCode) {
        if key == KeyCode::Esc {
            self.state = AppState::TaskList;
            return;
        }
        if key == KeyCode::Enter {
            let result = match self.state {
                AppState::AddTask => self.create_task(),
                AppState::EditTask => self.update_task(),
                _ => self.delay_task(),
            };
            match result {
                Ok(msg) => {
                    self.state = AppState::TaskList;
                    self.set_status_message(msg);
                    self.refresh_view(now_local());
                }
                // Stay on the form so the input can be fixed.
                Err(e) => self.set_status_message(format!("Error: {e}")),
            }
            return;
        }
        let Some(form) = self.active_form() else {
            return;
        };
        match key {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Left => form.handle_left_right(false),
            KeyCode::Right => form.handle_left_right(true),
            KeyCode::Backspace => form.handle_backspace(),
            KeyCode::Delete => form.handle_delete(),
            KeyCode::Home => {
                if let Some(field) = form.active_text() {
                    field.home();
                }
            }
            KeyCode::End => {
                if let Some(field) = form.active_text() {
                    field.end();
                }
            }
            KeyCode::Char(c) => form.handle_char(c),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let pending = self.pending.take();
                self.state = AppState::TaskList;
                match pending {
                    Some(PendingAction::QuitUnsaved) => return true,
                    Some(PendingAction::ReloadUnsaved) => {
                        let result = self.reload();
                        self.report(result);
                    }
                    None => {}
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending = None;
                self.state = AppState::TaskList;
            }
            _ => {}
        }
        false
    }

    /// Dispatch one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        debug!(?key, state = ?self.state, "key");
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key, modifiers),
            AppState::AddTask | AppState::EditTask | AppState::DelayTask => {
                self.handle_form_input(key);
                false
            }
            AppState::Help => {
                self.state = AppState::TaskList;
                false
            }
            AppState::Confirm => self.handle_confirm_input(key),
        }
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect, now: NaiveDateTime) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let heading = if self.show_closed { "All Tasks" } else { "Current Tasks" };
        let header_text = Line::from(vec![
            Span::styled(
                format!("{}, {}", now.format("%Y-%m-%d %H:%M"), weekday_name(now.weekday())),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                heading,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, chunks[0]);

        let header = Row::new(
            ["ID", "Name", "Soft", "Hard", "Priority", "Status"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(DARK_GREEN).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|id| self.db.get(id))
            .map(|task| {
                Row::new(vec![
                    Cell::from(task.id.clone()),
                    Cell::from(truncate(&task.name, 40)),
                    Cell::from(format_relative(task.soft, now)),
                    Cell::from(format_relative(task.hard, now)),
                    Cell::from(task.priority.to_string()),
                    Cell::from(task.status(now).label()),
                ])
                .style(tier_style(task.tier(now)))
            })
            .collect();

        let widths = [
            Constraint::Length(7),
            Constraint::Min(20),
            Constraint::Length(17),
            Constraint::Length(17),
            Constraint::Length(9),
            Constraint::Length(10),
        ];

        let title = format!(
            "Tasks ({}/{}){} - Press 'h' for help",
            self.visible.len(),
            self.db.len(),
            if self.dirty { " [modified]" } else { "" }
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.table_state);
    }

    /// Render a popup of labelled fields with the cursor in the focused text field.
    fn render_form(
        f: &mut Frame,
        area: Rect,
        title: &str,
        fields: &[(&str, FieldView<'_>)],
        current: usize,
    ) {
        let height = (fields.len() as u16) * 3 + 4;
        let popup = centered_rect(60, 90, area);
        let popup = Rect {
            height: height.min(popup.height),
            ..popup
        };
        f.render_widget(Clear, popup);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{title} - Enter to save, Esc to cancel"));
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                fields
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .chain(std::iter::once(Constraint::Min(0))),
            )
            .split(inner);

        for (idx, (label, view)) in fields.iter().enumerate() {
            let focused = idx == current;
            let border = if focused {
                Style::default().fg(GOLD)
            } else {
                Style::default()
            };
            let text = match view {
                FieldView::Text(input) => input.value.clone(),
                FieldView::Choice(choice) => format!("< {choice} >"),
            };
            let widget = Paragraph::new(text).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(*label)
                    .border_style(border),
            );
            f.render_widget(widget, chunks[idx]);
            if let (true, FieldView::Text(input)) = (focused, view) {
                let chunk = chunks[idx];
                f.set_cursor_position((chunk.x + input.cursor as u16 + 1, chunk.y + 1));
            }
        }
    }

    fn render_active_form(&self, f: &mut Frame, area: Rect) {
        match self.state {
            AppState::AddTask => {
                let form = &self.task_form;
                Self::render_form(
                    f,
                    area,
                    "Add Task",
                    &[
                        ("Name *", FieldView::Text(&form.name)),
                        ("Priority", FieldView::Text(&form.priority)),
                        ("Hard deadline *", FieldView::Text(&form.hard)),
                        ("Soft deadline (default: 3 days before hard)", FieldView::Text(&form.soft)),
                        ("Past weekday means", FieldView::Choice(form.past_label())),
                    ],
                    form.current_field,
                );
            }
            AppState::EditTask => {
                if let Some(form) = &self.edit_form {
                    Self::render_form(
                        f,
                        area,
                        &format!("Edit {}", form.id),
                        &[
                            ("Name *", FieldView::Text(&form.name)),
                            ("Priority", FieldView::Text(&form.priority)),
                        ],
                        form.current_field,
                    );
                }
            }
            AppState::DelayTask => {
                if let Some(form) = &self.delay_form {
                    Self::render_form(
                        f,
                        area,
                        &format!("Delay {}", form.id),
                        &[
                            ("Days", FieldView::Text(&form.days)),
                            ("Hours", FieldView::Text(&form.hours)),
                            ("Minutes", FieldView::Text(&form.mins)),
                            ("Seconds", FieldView::Text(&form.secs)),
                            ("Move deadline", FieldView::Choice(form.mode.label())),
                            (
                                "Count as a delay",
                                FieldView::Choice(if form.counted { "Yes" } else { "No" }),
                            ),
                        ],
                        form.current_field,
                    );
                }
            }
            _ => {}
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let legend = |tier: Tier, text: &'static str| {
            Line::from(vec![Span::styled("  ■ ", tier_style(tier)), Span::raw(text)])
        };
        let help_text = vec![
            Line::from(Span::styled("Task List", bold)),
            Line::from("  ↑/↓, k/j     Move selection"),
            Line::from("  t            Show/hide completed and cancelled tasks"),
            Line::from("  a            Add a task"),
            Line::from("  e            Edit name and priority"),
            Line::from("  +/-          Raise or lower priority by one"),
            Line::from("  d            Delay the selected task"),
            Line::from("  c            Toggle completed"),
            Line::from("  x            Toggle cancelled"),
            Line::from("  s            Save"),
            Line::from("  r            Reload from disk"),
            Line::from("  h/F1         Show this help"),
            Line::from("  q/Esc        Quit"),
            Line::from(""),
            Line::from(Span::styled("Forms", bold)),
            Line::from("  Tab/↑/↓      Move between fields"),
            Line::from("  ←/→, Space   Change a selector"),
            Line::from("  Enter        Save"),
            Line::from("  Esc          Cancel"),
            Line::from(""),
            Line::from(Span::styled("Deadline Formats", bold)),
            Line::from("  241231T2359  Date and time"),
            Line::from("  241231       Date at midnight"),
            Line::from("  mon..sun     Weekday at midnight"),
            Line::from("  today, tomorrow, in 3d, in 2w"),
            Line::from(""),
            Line::from(Span::styled("Colors", bold)),
            legend(Tier::Overdue, "Past the hard deadline"),
            legend(Tier::Danger, "Past the soft deadline"),
            legend(Tier::Warning, "Soft deadline within 3 days, or delayed twice"),
            legend(Tier::Delayed, "Delayed once"),
            legend(Tier::Ok, "On track"),
            legend(Tier::Closed, "Completed or cancelled"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Unsaved Changes")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));
        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.pending.map(|p| p.prompt()).unwrap_or(""),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to go back"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => format!("{} | Press 'h' for help", self.read.display()),
                AppState::AddTask => "Add Task".to_string(),
                AppState::EditTask => "Edit Task".to_string(),
                AppState::DelayTask => "Delay Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm".to_string(),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(DARK_GREEN).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Draw the whole screen for the current state.
    pub fn render(&mut self, f: &mut Frame) {
        let now = now_local();
        self.refresh_view(now);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0], now);
                self.render_confirm(f, chunks[0]);
            }
            AppState::TaskList => self.render_task_list(f, chunks[0], now),
            AppState::AddTask | AppState::EditTask | AppState::DelayTask => {
                self.render_task_list(f, chunks[0], now);
                self.render_active_form(f, chunks[0]);
            }
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop; returns when the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// What a form row shows.
enum FieldView<'a> {
    Text(&'a InputField),
    Choice(&'a str),
}
