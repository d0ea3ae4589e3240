//! The editor: one document, one host bridge, one listener.
//!
//! Every step runs in two phases. First the action mutates the document;
//! then the host caret is synced, the document is projected, and the
//! listener is told. The listener never observes a half-applied edit.

use smol_str::SmolStr;

use crate::actions::EditorAction;
use crate::config::EditorConfig;
use crate::cursor::{current_selection, place_caret, select_document};
use crate::document::Document;
use crate::events::{InputEvent, classify};
use crate::execute::{CaretUpdate, Edit, execute_action};
use crate::markup::{MarkupMode, render_markup};
use crate::platform::{HostSelection, PlatformError, SelectionBridge};
use crate::projection::{Projection, project};
use crate::types::{Position, Selection};

/// Receives state pushes from the editor.
pub trait EditorListener {
    /// Called after every content change with the fresh projections.
    fn on_change(&mut self, projection: &Projection);

    /// Called once per tag removed by click, with its label.
    fn on_remove_tag(&mut self, label: &str);
}

impl EditorListener for () {
    fn on_change(&mut self, _projection: &Projection) {}

    fn on_remove_tag(&mut self, _label: &str) {}
}

impl<T: EditorListener + ?Sized> EditorListener for &mut T {
    fn on_change(&mut self, projection: &Projection) {
        (**self).on_change(projection)
    }

    fn on_remove_tag(&mut self, label: &str) {
        (**self).on_remove_tag(label)
    }
}

/// What the host should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResult {
    /// Suppress the host's native handling.
    pub prevent_default: bool,
    /// An action ran (false when nothing matched or it was skipped).
    pub applied: bool,
}

/// Build the initial document for a config.
pub fn hydrate_document(config: &EditorConfig) -> Document {
    Document::hydrate(&config.markup, &config.default_value, &config.fixed_text)
}

/// Tag-aware editor over a host surface.
pub struct TagEditor<B: SelectionBridge, L: EditorListener = ()> {
    doc: Document,
    bridge: B,
    listener: L,
    config: EditorConfig,
    projection: Projection,
}

impl<B: SelectionBridge, L: EditorListener> TagEditor<B, L> {
    /// Mount: hydrate from config and project. The listener is not called.
    pub fn new(bridge: B, listener: L, config: EditorConfig) -> Self {
        let mut doc = hydrate_document(&config);
        doc.strip_trailing_breaks();
        let projection = project(&doc);
        tracing::debug!(
            target: "pretag::editor",
            editor = %config.id,
            nodes = doc.len(),
            "mounted"
        );
        Self {
            doc,
            bridge,
            listener,
            config,
            projection,
        }
    }

    /// Run one host event to completion.
    pub fn handle_event(&mut self, event: &InputEvent) -> EventResult {
        let span =
            tracing::debug_span!(target: "pretag::editor", "handle_event", editor = %self.config.id);
        let _enter = span.enter();

        let dispatch = classify(&self.doc, event);
        let applied = match &dispatch.action {
            Some(action) => self.apply(action),
            None => false,
        };
        EventResult {
            prevent_default: dispatch.prevent_default,
            applied,
        }
    }

    /// Insert a tag token at the caret, or at the end when the host has no
    /// selection.
    pub fn insert_tag(&mut self, label: impl Into<SmolStr>) {
        self.apply(&EditorAction::InsertTag {
            label: label.into(),
        });
    }

    /// Insert a text run at the caret, or at the end when the host has no
    /// selection.
    pub fn insert_text(&mut self, text: impl Into<String>) {
        self.apply(&EditorAction::InsertText { text: text.into() });
    }

    /// Select the whole document. Returns false when the host has no
    /// selection to replace.
    pub fn select_all(&mut self) -> bool {
        self.apply(&EditorAction::SelectAll)
    }

    pub fn clear(&mut self) {
        self.apply(&EditorAction::Clear);
    }

    /// Execute an action against the live host selection.
    ///
    /// Returns false when the action was skipped for lack of a selection.
    pub fn apply(&mut self, action: &EditorAction) -> bool {
        let selection = current_selection(&self.doc, &self.bridge);
        let Some(edit) = execute_action(&mut self.doc, action, selection.as_ref()) else {
            return false;
        };
        let notify = edit.modified || *action == EditorAction::Refresh;
        self.commit(edit, notify);
        true
    }

    fn commit(&mut self, edit: Edit, notify: bool) {
        if edit.modified {
            let stripped = self.doc.strip_trailing_breaks();
            if stripped > 0 {
                tracing::trace!(target: "pretag::editor", stripped, "dropped trailing breaks");
            }
        }

        if let Err(err) = self.sync_caret(&edit) {
            tracing::warn!(target: "pretag::editor", error = %err, "could not move host caret");
        }

        self.projection = project(&self.doc);

        for tag in &edit.removed {
            tracing::debug!(
                target: "pretag::editor",
                tag = %tag.id,
                label = %tag.label,
                "tag removed by click"
            );
            self.listener.on_remove_tag(&tag.label);
        }
        if notify {
            self.listener.on_change(&self.projection);
        }
    }

    fn sync_caret(&mut self, edit: &Edit) -> Result<(), PlatformError> {
        match edit.caret {
            // The host may still point at a node the edit removed.
            CaretUpdate::Keep => match self.bridge.read_selection() {
                Some(host) if !self.host_is_live(&host) => {
                    let pos = self.doc.position_at(edit.at);
                    place_caret(&self.doc, &mut self.bridge, pos)
                }
                _ => Ok(()),
            },
            CaretUpdate::Caret(pos) => {
                let pos = if self.doc.contains(pos.node) {
                    pos
                } else {
                    self.doc.position_at(edit.at)
                };
                place_caret(&self.doc, &mut self.bridge, pos)
            }
            CaretUpdate::Select(Selection::Document) => {
                select_document(&self.doc, &mut self.bridge)
            }
            CaretUpdate::Select(Selection::Caret(pos)) => {
                place_caret(&self.doc, &mut self.bridge, pos)
            }
            CaretUpdate::Select(Selection::Range { anchor, focus }) => {
                self.bridge.apply_selection(HostSelection::new(anchor, focus))
            }
        }
    }

    fn host_is_live(&self, host: &HostSelection) -> bool {
        self.doc.contains(host.anchor.node) && self.doc.contains(host.focus.node)
    }

    // === Accessors ===

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Cleaned plain-text projection.
    pub fn text(&self) -> &str {
        &self.projection.text
    }

    /// Persisted markup projection.
    pub fn markup(&self) -> &str {
        &self.projection.markup
    }

    /// Markup for the host to render, with node ids and caret helpers.
    pub fn host_markup(&self) -> String {
        render_markup(&self.doc, MarkupMode::Host)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Host-side access, e.g. to move the selection as a user would.
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Caret position for a document offset, for hosts that track offsets.
    pub fn position_at(&self, offset: usize) -> Position {
        self.doc.position_at(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessBridge;
    use crate::types::Node;

    #[derive(Default)]
    struct Recorder {
        changes: Vec<Projection>,
        removed: Vec<String>,
    }

    impl EditorListener for Recorder {
        fn on_change(&mut self, projection: &Projection) {
            self.changes.push(projection.clone());
        }

        fn on_remove_tag(&mut self, label: &str) {
            self.removed.push(label.to_string());
        }
    }

    #[test]
    fn test_mount_hydrates_without_notifying() {
        let editor = TagEditor::new(
            HeadlessBridge::new(),
            Recorder::default(),
            EditorConfig::with_default_value("hello\n"),
        );
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.document().to_nodes(), vec![Node::text("hello")]);
        assert!(editor.listener().changes.is_empty());
    }

    #[test]
    fn test_insert_tag_notifies_and_moves_caret() {
        let mut editor = TagEditor::new(
            HeadlessBridge::new(),
            Recorder::default(),
            EditorConfig::default(),
        );
        let start = editor.document().start_position();
        editor.bridge_mut().set_caret(start);

        editor.insert_tag("Alice");

        assert_eq!(editor.text(), "Alice");
        assert_eq!(editor.listener().changes.len(), 1);
        assert_eq!(editor.listener().changes[0].text, "Alice");
        let host = editor.bridge().selection().unwrap();
        assert_eq!(editor.document().offset_of(&host.focus), Some(2));
    }

    #[test]
    fn test_skipped_action_changes_nothing() {
        let mut editor = TagEditor::new(
            HeadlessBridge::new(),
            Recorder::default(),
            EditorConfig::with_default_value("x"),
        );
        let result = editor.handle_event(&InputEvent::Paste { text: "y".into() });
        assert!(result.prevent_default);
        assert!(!result.applied);
        assert_eq!(editor.text(), "x");
        assert!(editor.listener().changes.is_empty());
    }

    #[test]
    fn test_stale_host_selection_is_reanchored() {
        let mut editor = TagEditor::new(
            HeadlessBridge::new(),
            Recorder::default(),
            EditorConfig::default(),
        );
        editor.insert_tag("Alice");
        let tag = editor.document().tags().next().map(|(id, _)| id).unwrap();
        editor.bridge_mut().set_caret(Position::after(tag));

        let tag_id = editor.document().node(tag).and_then(Node::as_tag).unwrap().id;
        editor.apply(&EditorAction::RemoveTag { tag: tag_id });

        assert_eq!(editor.listener().removed, vec!["Alice".to_string()]);
        let host = editor.bridge().selection().unwrap();
        assert!(editor.document().contains(host.anchor.node));
    }
}
