//! Input field handling for the terminal user interface.

/// A single-line text input. `cursor` counts characters, not bytes.
#[derive(Clone, Debug, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text and the cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            active: false,
        }
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.value
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_editing() {
        let mut f = InputField::new();
        for c in "tsk".chars() {
            f.handle_char(c);
        }
        f.move_cursor_left();
        f.move_cursor_left();
        f.handle_char('a');
        assert_eq!(f.value, "task");
        assert_eq!(f.cursor, 2);

        f.handle_backspace();
        assert_eq!(f.value, "tsk");
        f.handle_delete();
        assert_eq!(f.value, "tk");
        assert_eq!(f.cursor, 1);
    }

    #[test]
    fn test_multibyte_characters() {
        let mut f = InputField::with_value("café");
        assert_eq!(f.cursor, 4);
        f.handle_backspace();
        assert_eq!(f.value, "caf");
        f.handle_char('é');
        f.home();
        f.handle_char('¡');
        assert_eq!(f.value, "¡café");
        f.end();
        assert_eq!(f.cursor, 5);
    }

    #[test]
    fn test_cursor_bounds() {
        let mut f = InputField::with_value("ab");
        f.move_cursor_right();
        assert_eq!(f.cursor, 2);
        f.handle_delete();
        assert_eq!(f.value, "ab");
        f.home();
        f.move_cursor_left();
        assert_eq!(f.cursor, 0);
        f.handle_backspace();
        assert_eq!(f.value, "ab");
        f.clear();
        assert_eq!(f.value, "");
        assert_eq!(f.cursor, 0);
    }
}
