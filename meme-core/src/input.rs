//! Keyboard routing for the composition surface.
//!
//! Deleting the selected overlay is bound to Delete/Backspace, but only when
//! the keystroke did not originate in a text-entry field (the prompt box or
//! an inline caption edit). Otherwise the key belongs to the text field.

use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Keys the surface reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    /// Forward delete.
    Delete,
    /// Backspace.
    Backspace,
    /// Enter / Return.
    Enter,
    /// Escape.
    Escape,
    /// Any other key, by name.
    Other(String),
}

/// Where keyboard focus currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    /// The composition surface itself.
    #[default]
    Surface,
    /// A text input such as the prompt box.
    TextInput,
    /// A multi-line text area.
    TextArea,
    /// Inline editing of an overlay's caption.
    InlineEdit,
}

impl FocusTarget {
    /// Whether keystrokes here are text entry.
    #[must_use]
    pub fn is_text_entry(self) -> bool {
        !matches!(self, Self::Surface)
    }
}

/// Map a key press to a surface command.
///
/// `current_text` is the inline editor's content, used when Enter commits
/// an edit. Returns `None` when the key should be left to the focused field.
#[must_use]
pub fn route_key(key: &Key, focus: FocusTarget, current_text: Option<&str>) -> Option<Command> {
    match (focus, key) {
        (FocusTarget::Surface, Key::Delete | Key::Backspace) => Some(Command::DeleteSelected),
        (FocusTarget::Surface, Key::Escape) => Some(Command::ClearSelection),
        (FocusTarget::InlineEdit, Key::Enter) => current_text.map(|text| Command::CommitTextEdit {
            text: text.to_string(),
        }),
        (FocusTarget::InlineEdit, Key::Escape) => Some(Command::CancelTextEdit),
        _ => None,
    }
}
