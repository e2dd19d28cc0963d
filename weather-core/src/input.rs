//! Input bar: maps key presses on the location field to panel actions.

use crate::action::Action;

pub const PLACEHOLDER: &str = "Enter location...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Char(char),
    Backspace,
    Enter,
    Other,
}

/// Action for one key press on a field currently holding `text`.
///
/// Edits report the whole new text; only Enter triggers a lookup.
pub fn handle_key(text: &str, key: InputKey) -> Option<Action> {
    match key {
        InputKey::Char(c) => {
            let mut next = text.to_string();
            next.push(c);
            Some(Action::QueryChange(next))
        }
        InputKey::Backspace => {
            let mut next = text.to_string();
            next.pop()?;
            Some(Action::QueryChange(next))
        }
        InputKey::Enter => Some(Action::Submit),
        InputKey::Other => None,
    }
}

/// Actions for a whole line confirmed in a line editor.
pub fn submit_line(line: &str) -> Vec<Action> {
    let mut actions = vec![Action::QueryChange(line.to_string())];
    actions.extend(handle_key(line, InputKey::Enter));
    actions
}

pub fn render(text: &str) -> String {
    if text.is_empty() {
        format!("> {PLACEHOLDER}")
    } else {
        format!("> {text}")
    }
}
