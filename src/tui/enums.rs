//! Enumerations for TUI state management.

/// Screen currently shown by the terminal user interface.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    EditTask,
    DelayTask,
    Help,
    Confirm,
}

/// Action waiting on a yes/no answer.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PendingAction {
    /// Quit with unsaved changes.
    QuitUnsaved,
    /// Reload from disk, discarding unsaved changes.
    ReloadUnsaved,
}

impl PendingAction {
    pub fn prompt(self) -> &'static str {
        match self {
            PendingAction::QuitUnsaved => "Quit without saving your changes?",
            PendingAction::ReloadUnsaved => "Reload the task file and discard your changes?",
        }
    }
}
