//! Editor actions and key input types.
//!
//! `EditorAction` is the set of semantic operations on a tag document,
//! decoupled from how they are triggered (host events, programmatic calls,
//! replay scripts). `Key`/`Modifiers` describe keyboard input in a
//! platform-agnostic way; hosts convert native key events into them.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::TagId;

/// Which side of the caret a deletion consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteDirection {
    /// Backspace.
    Backward,
    /// Delete.
    Forward,
}

/// All possible editor actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    /// Insert a tag token followed by a separator space.
    InsertTag { label: SmolStr },

    /// Insert a plain text run followed by a separator space.
    InsertText { text: String },

    /// Insert clipboard text, replacing the selection.
    Paste { text: String },

    /// Enter: insert a line break plus a fresh caret anchor.
    SplitLine,

    /// Backspace/Delete with tag awareness.
    Delete { direction: DeleteDirection },

    /// Select the whole document.
    SelectAll,

    /// Reset to the empty document.
    Clear,

    /// Remove one tag token (click-to-remove).
    RemoveTag { tag: TagId },

    /// Mirror text the host typed natively.
    TypeText { text: String },

    /// Re-project without changing anything (host input with no data).
    Refresh,
}

/// Key values for keyboard input.
///
/// Only the keys the editor reacts to get their own variant. Everything else
/// is a `Character` (printable) or `Unidentified`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SmolStr", into = "SmolStr")]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn parse(s: &str) -> Self {
        match s {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "" | "Unidentified" => Self::Unidentified,
            s if s.chars().count() == 1 => Self::Character(s.into()),
            _ => Self::Unidentified,
        }
    }

    /// DOM name of the key.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Character(s) => s,
            Self::Unidentified => "Unidentified",
            Self::Backspace => "Backspace",
            Self::Delete => "Delete",
            Self::Enter => "Enter",
            Self::Tab => "Tab",
            Self::Escape => "Escape",
            Self::ArrowLeft => "ArrowLeft",
            Self::ArrowRight => "ArrowRight",
            Self::ArrowUp => "ArrowUp",
            Self::ArrowDown => "ArrowDown",
            Self::Home => "Home",
            Self::End => "End",
            Self::Alt => "Alt",
            Self::Control => "Control",
            Self::Meta => "Meta",
            Self::Shift => "Shift",
        }
    }

    /// Case-insensitive match against a character key.
    pub fn is_char(&self, c: char) -> bool {
        match self {
            Self::Character(s) => {
                let mut chars = s.chars();
                chars.next().is_some_and(|k| k.eq_ignore_ascii_case(&c)) && chars.next().is_none()
            }
            _ => false,
        }
    }
}

impl From<SmolStr> for Key {
    fn from(s: SmolStr) -> Self {
        Key::parse(&s)
    }
}

impl From<Key> for SmolStr {
    fn from(key: Key) -> Self {
        match key {
            Key::Character(s) => s,
            other => SmolStr::new(other.as_str()),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Ctrl or Cmd held, whichever the platform uses for shortcuts.
    pub fn has_primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::CTRL,
        }
    }

    pub fn meta(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::META,
        }
    }

    /// Map the combo to the editor action it triggers, if any.
    ///
    /// Shift does not change Enter/Backspace/Delete: there is only one kind
    /// of line break.
    pub fn action(&self) -> Option<EditorAction> {
        match &self.key {
            Key::Enter => Some(EditorAction::SplitLine),
            Key::Backspace => Some(EditorAction::Delete {
                direction: DeleteDirection::Backward,
            }),
            Key::Delete => Some(EditorAction::Delete {
                direction: DeleteDirection::Forward,
            }),
            key if key.is_char('a') && self.modifiers.has_primary() => {
                Some(EditorAction::SelectAll)
            }
            _ => None,
        }
    }
}
