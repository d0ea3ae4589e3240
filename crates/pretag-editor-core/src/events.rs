//! Input dispatch: host events to editor actions.
//!
//! Classification is pure. It looks at the event and, for clicks, at which
//! node was hit; it never touches the selection or mutates anything.

use serde::{Deserialize, Serialize};

use crate::actions::{EditorAction, Key, KeyCombo, Modifiers};
use crate::cursor::clicked_tag;
use crate::document::Document;
use crate::platform::ClickTarget;

/// A raw input event from the host surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Clipboard paste with its plain-text payload.
    Paste { text: String },
    /// Key press.
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Click on some rendered element.
    Click { target: ClickTarget },
    /// The host edited content natively; `data` is what was inserted, if known.
    Input {
        #[serde(default)]
        data: Option<String>,
    },
}

/// What to do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub action: Option<EditorAction>,
    /// The host must suppress its native handling of the event.
    pub prevent_default: bool,
}

impl Dispatch {
    fn handled(action: EditorAction) -> Self {
        Self {
            action: Some(action),
            prevent_default: true,
        }
    }

    fn passthrough(action: Option<EditorAction>) -> Self {
        Self {
            action,
            prevent_default: false,
        }
    }
}

pub fn classify(doc: &Document, event: &InputEvent) -> Dispatch {
    let dispatch = match event {
        InputEvent::Paste { text } => Dispatch::handled(EditorAction::Paste { text: text.clone() }),
        InputEvent::KeyDown { key, modifiers } => {
            match KeyCombo::with_modifiers(key.clone(), *modifiers).action() {
                Some(action) => Dispatch::handled(action),
                None => Dispatch::passthrough(None),
            }
        }
        InputEvent::Click { target } => Dispatch::passthrough(
            clicked_tag(doc, target).map(|(_, tag)| EditorAction::RemoveTag { tag }),
        ),
        InputEvent::Input { data } => Dispatch::passthrough(Some(match data.as_deref() {
            Some(text) if !text.is_empty() => EditorAction::TypeText {
                text: text.to_string(),
            },
            _ => EditorAction::Refresh,
        })),
    };

    tracing::trace!(
        target: "pretag::events",
        ?event,
        action = ?dispatch.action,
        prevent_default = dispatch.prevent_default,
        "classified"
    );
    dispatch
}
