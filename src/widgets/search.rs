use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use tui_input::{Input, InputRequest};

use crate::theme::Theme;

pub const DEFAULT_CHAR_LIMIT: usize = 156;
const PLACEHOLDER: &str = "Search...";
/// Ticks between cursor blink phases (about half a second at the default tick).
const BLINK_TICKS: u8 = 5;

/// Single-line query editor used by the table's search mode.
///
/// Editing is delegated to [`tui_input::Input`]; this type adds the char
/// limit, focus, cursor blink and the styled line.
#[derive(Debug, Clone)]
pub struct SearchInput {
    input: Input,
    char_limit: usize,
    focused: bool,
    cursor_visible: bool,
    blink_ticks: u8,
}

impl Default for SearchInput {
    fn default() -> Self {
        Self::new(DEFAULT_CHAR_LIMIT)
    }
}

impl SearchInput {
    pub fn new(char_limit: usize) -> Self {
        Self {
            input: Input::default(),
            char_limit: char_limit.max(1),
            focused: false,
            cursor_visible: true,
            blink_ticks: 0,
        }
    }

    pub fn value(&self) -> String {
        self.input.value().to_string()
    }

    /// Cursor position in chars.
    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.wake_cursor();
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    /// Empties the buffer and blurs.
    pub fn reset(&mut self) {
        self.input.reset();
        self.blur();
    }

    /// Returns false when the char limit is reached.
    pub fn insert(&mut self, c: char) -> bool {
        if self.input.value().chars().count() >= self.char_limit || c.is_control() {
            return false;
        }
        self.edit(InputRequest::InsertChar(c));
        true
    }

    pub fn backspace(&mut self) {
        self.edit(InputRequest::DeletePrevChar);
    }

    pub fn delete(&mut self) {
        self.edit(InputRequest::DeleteNextChar);
    }

    pub fn clear(&mut self) {
        self.edit(InputRequest::DeleteLine);
    }

    pub fn move_left(&mut self) {
        self.edit(InputRequest::GoToPrevChar);
    }

    pub fn move_right(&mut self) {
        self.edit(InputRequest::GoToNextChar);
    }

    pub fn move_home(&mut self) {
        self.edit(InputRequest::GoToStart);
    }

    pub fn move_end(&mut self) {
        self.edit(InputRequest::GoToEnd);
    }

    pub fn tick(&mut self) {
        if !self.focused {
            return;
        }
        self.blink_ticks += 1;
        if self.blink_ticks >= BLINK_TICKS {
            self.blink_ticks = 0;
            self.cursor_visible = !self.cursor_visible;
        }
    }

    pub fn line(&self, theme: &Theme) -> Line<'static> {
        let text_style = Style::default().fg(theme.text);
        let cursor_style = if self.focused() && self.cursor_visible {
            text_style.add_modifier(Modifier::REVERSED)
        } else {
            text_style
        };

        let chars = self.input.value().chars().collect::<Vec<_>>();
        if chars.is_empty() {
            let mut placeholder = PLACEHOLDER.chars();
            let first = placeholder.next().map(String::from).unwrap_or_default();
            return Line::from(vec![
                Span::styled(first, cursor_style.fg(theme.muted)),
                Span::styled(placeholder.collect::<String>(), Style::default().fg(theme.muted)),
            ]);
        }

        let cursor = self.cursor().min(chars.len());
        let before = chars[..cursor].iter().collect::<String>();
        let (under, after) = match chars.get(cursor) {
            Some(c) => (c.to_string(), chars[cursor + 1..].iter().collect::<String>()),
            None => (" ".to_string(), String::new()),
        };
        Line::from(vec![
            Span::styled(before, text_style),
            Span::styled(under, cursor_style),
            Span::styled(after, text_style),
        ])
    }

    fn edit(&mut self, request: InputRequest) {
        self.input.handle(request);
        // Editing keeps the cursor solid so the caret doesn't vanish mid-typing.
        self.wake_cursor();
    }

    fn wake_cursor(&mut self) {
        self.cursor_visible = true;
        self.blink_ticks = 0;
    }
}
