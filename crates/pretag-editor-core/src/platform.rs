//! Platform abstraction for the host editing surface.
//!
//! The editor never caches a cursor. It pulls the host's live selection on
//! every event through `SelectionBridge` and pushes caret placements back
//! through the same trait. The browser implementation maps DOM ranges onto
//! `data-node-id` attributes; `HeadlessBridge` keeps the selection in memory
//! for tests, tooling and non-DOM hosts.

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, Position};

/// Error type for platform operations.
#[derive(Debug, Clone)]
pub struct PlatformError(pub String);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PlatformError {}

impl From<&str> for PlatformError {
    fn from(s: &str) -> Self {
        PlatformError(s.to_string())
    }
}

impl From<String> for PlatformError {
    fn from(s: String) -> Self {
        PlatformError(s)
    }
}

/// Selection as reported by the host, in terms of (possibly stale) node ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSelection {
    pub anchor: Position,
    pub focus: Position,
}

impl HostSelection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn caret(pos: Position) -> Self {
        Self {
            anchor: pos,
            focus: pos,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// What the host says was clicked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickTarget {
    /// A rendered node carrying `data-node-id`.
    Node(NodeId),
    /// An element known only by its DOM id (e.g. `tag-3`).
    Element(String),
}

/// Host-side selection access.
///
/// Implementations handle the actual UI interaction. Reads must reflect the
/// host's live state at call time; writes only move host focus and never
/// touch the document.
pub trait SelectionBridge {
    /// The host's current selection, or None when it has no active one
    /// (e.g. focus is elsewhere).
    fn read_selection(&self) -> Option<HostSelection>;

    /// Move the host's selection.
    fn apply_selection(&mut self, selection: HostSelection) -> Result<(), PlatformError>;
}

impl<T: SelectionBridge + ?Sized> SelectionBridge for &mut T {
    fn read_selection(&self) -> Option<HostSelection> {
        (**self).read_selection()
    }

    fn apply_selection(&mut self, selection: HostSelection) -> Result<(), PlatformError> {
        (**self).apply_selection(selection)
    }
}

/// In-memory selection bridge.
///
/// Simulates host selection deterministically: tests and tools set the
/// selection directly (as a user would by clicking or dragging), and the
/// editor's caret placements land here.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBridge {
    selection: Option<HostSelection>,
    applied: usize,
}

impl HeadlessBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given selection active.
    pub fn with_selection(selection: HostSelection) -> Self {
        Self {
            selection: Some(selection),
            applied: 0,
        }
    }

    /// Host-side selection change (user click, drag, arrow keys).
    pub fn set_selection(&mut self, selection: Option<HostSelection>) {
        self.selection = selection;
    }

    /// Host-side caret placement.
    pub fn set_caret(&mut self, pos: Position) {
        self.selection = Some(HostSelection::caret(pos));
    }

    /// Focus left the surface.
    pub fn blur(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<HostSelection> {
        self.selection
    }

    /// How many selections the editor has pushed.
    pub fn applied_count(&self) -> usize {
        self.applied
    }
}

impl SelectionBridge for HeadlessBridge {
    fn read_selection(&self) -> Option<HostSelection> {
        self.selection
    }

    fn apply_selection(&mut self, selection: HostSelection) -> Result<(), PlatformError> {
        tracing::trace!(
            target: "pretag::platform",
            anchor = ?selection.anchor,
            focus = ?selection.focus,
            "headless selection applied"
        );
        self.selection = Some(selection);
        self.applied += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_bridge_round_trip() {
        let mut bridge = HeadlessBridge::new();
        assert!(bridge.read_selection().is_none());

        let sel = HostSelection::caret(Position::after(NodeId(3)));
        bridge.apply_selection(sel).unwrap();
        assert_eq!(bridge.read_selection(), Some(sel));
        assert!(sel.is_collapsed());
        assert_eq!(bridge.applied_count(), 1);

        bridge.blur();
        assert!(bridge.read_selection().is_none());
    }

    #[test]
    fn test_bridge_through_mut_ref() {
        let mut bridge = HeadlessBridge::new();
        {
            let mut by_ref = &mut bridge;
            by_ref
                .apply_selection(HostSelection::caret(Position::before(NodeId(0))))
                .unwrap();
        }
        assert_eq!(bridge.applied_count(), 1);
    }

    #[test]
    fn test_platform_error_display() {
        let err: PlatformError = "no selection object".into();
        assert_eq!(err.to_string(), "no selection object");
    }
}
