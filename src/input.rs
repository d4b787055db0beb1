use crate::widgets::TableMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartSearch,
    Cancel,
    Select,
    Up,
    Down,
    InputChar(char),
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    ClearInput,
    /// A key with no built-in meaning, as a normalized signature such as `ctrl+d`.
    Hotkey(String),
}

pub fn map_key(mode: TableMode, key: KeyEvent) -> Option<Action> {
    match mode {
        TableMode::Loading => None,
        TableMode::Browsing => map_browsing_key(key),
        TableMode::Searching => map_search_key(key),
    }
}

fn map_browsing_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('/') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::StartSearch)
        }
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        _ => key_event_signature(key).map(Action::Hotkey),
    }
}

fn map_search_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Enter => Some(Action::Select),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Delete => Some(Action::Delete),
        KeyCode::Left => Some(Action::CursorLeft),
        KeyCode::Right => Some(Action::CursorRight),
        KeyCode::Home => Some(Action::CursorHome),
        KeyCode::End => Some(Action::CursorEnd),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::ClearInput)
        }
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::CursorHome)
        }
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::CursorEnd)
        }
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

pub fn key_event_signature(key: KeyEvent) -> Option<String> {
    let mut shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let key_name = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char('+') => "plus".to_string(),
        KeyCode::Char(c) if c.is_alphabetic() => {
            shift |= c.is_uppercase();
            c.to_lowercase().to_string()
        }
        // Shifted symbols already encode the shift in the character itself.
        KeyCode::Char(c) => {
            shift = false;
            c.to_string()
        }
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "backtab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::Insert => "insert".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::PageUp => "pageup".to_string(),
        KeyCode::PageDown => "pagedown".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    Some(join_signature(
        key.modifiers.contains(KeyModifiers::CONTROL),
        key.modifiers.contains(KeyModifiers::ALT),
        shift,
        key_name,
    ))
}

/// Normalizes a user-facing key spec (`"D"`, `"Ctrl + d"`, `"pgup"`) to the
/// signature format produced by [`key_event_signature`].
pub fn normalize_hotkey_spec(spec: &str) -> Option<String> {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut key: Option<String> = None;

    for raw in spec.split('+').map(str::trim).filter(|token| !token.is_empty()) {
        let token = raw.to_lowercase();
        match token.as_str() {
            "ctrl" | "control" => ctrl = true,
            "alt" => alt = true,
            "shift" => shift = true,
            _ => {
                let mut chars = raw.chars();
                if let (Some(c), None) = (chars.next(), chars.next())
                    && c.is_uppercase()
                {
                    shift = true;
                }
                key = normalize_hotkey_key_token(&token);
            }
        }
    }

    // `spec.split('+')` swallows a lone plus sign.
    if key.is_none() && spec.trim().ends_with('+') {
        key = Some("plus".to_string());
    }

    let key = key?;
    if is_claimed(ctrl, alt, shift, &key) {
        return None;
    }
    Some(join_signature(ctrl, alt, shift, key))
}

/// Keys the navigator or the table handle before custom options see them.
fn is_claimed(ctrl: bool, alt: bool, shift: bool, key: &str) -> bool {
    match key {
        "/" => !ctrl,
        "q" => !ctrl && !alt && !shift,
        "c" => ctrl,
        _ => false,
    }
}

fn normalize_hotkey_key_token(token: &str) -> Option<String> {
    match token {
        "return" | "enter" | "esc" | "escape" | "up" | "down" => None,
        "pgup" => Some("pageup".to_string()),
        "pgdn" => Some("pagedown".to_string()),
        "del" => Some("delete".to_string()),
        "ins" => Some("insert".to_string()),
        "space" | "plus" | "tab" | "backtab" | "backspace" | "delete" | "insert" | "left"
        | "right" | "home" | "end" | "pageup" | "pagedown" => Some(token.to_string()),
        _ if token.chars().count() == 1 => Some(token.to_string()),
        _ if token.starts_with('f') => {
            let number = token.trim_start_matches('f').parse::<u8>().ok()?;
            if (1..=24).contains(&number) {
                Some(format!("f{number}"))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn join_signature(ctrl: bool, alt: bool, shift: bool, key: String) -> String {
    let mut parts = Vec::new();
    if ctrl {
        parts.push("ctrl".to_string());
    }
    if alt {
        parts.push("alt".to_string());
    }
    if shift {
        parts.push("shift".to_string());
    }
    parts.push(key);
    parts.join("+")
}
