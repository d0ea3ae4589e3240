//! Action execution for tag documents.
//!
//! `execute_action` applies an `EditorAction` to a `Document` given the
//! selection the host reported for this event. It only mutates the document
//! and describes where the caret should go; syncing the host and projecting
//! happen afterwards, in the editor.

use crate::actions::{DeleteDirection, EditorAction};
use crate::cursor::{caret_after, insertion_point, is_full_selection, selection_range};
use crate::document::Document;
use crate::types::{Boundary, Node, NodeId, Position, Range, Selection, TagId, TagToken};

/// Where the host caret should go after an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretUpdate {
    /// Leave the host selection alone (re-anchored only if it went stale).
    Keep,
    /// Collapse the host selection here.
    Caret(Position),
    /// Put this selection on the host.
    Select(Selection),
}

/// Outcome of one executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Whether document content changed.
    pub modified: bool,
    pub caret: CaretUpdate,
    /// Tags removed by click; each one is reported to the listener.
    pub removed: Vec<TagToken>,
    /// Offset to re-anchor the caret at if its target node disappears.
    pub at: usize,
}

impl Edit {
    fn unchanged(at: usize) -> Self {
        Self {
            modified: false,
            caret: CaretUpdate::Keep,
            removed: Vec::new(),
            at,
        }
    }

    fn caret(doc: &Document, pos: Position) -> Self {
        Self {
            modified: true,
            caret: CaretUpdate::Caret(pos),
            removed: Vec::new(),
            at: doc.offset_of(&pos).unwrap_or(0),
        }
    }
}

/// Which branch a Backspace/Delete press takes. Evaluated fresh per press,
/// in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    /// The selection spans the whole document: reset it.
    FullSelection,
    /// A range selection overlaps tag tokens: remove just those tags.
    RangeIntersectsTags,
    /// Ordinary character/range deletion.
    PlainDeletion,
}

pub fn classify_delete(doc: &Document, sel: &Selection) -> DeleteState {
    if is_full_selection(doc, sel) {
        return DeleteState::FullSelection;
    }
    match selection_range(doc, sel) {
        Some(range) if !range.is_caret() && !tags_in(doc, range).is_empty() => {
            DeleteState::RangeIntersectsTags
        }
        _ => DeleteState::PlainDeletion,
    }
}

/// Tag nodes whose unit overlaps an offset range.
fn tags_in(doc: &Document, range: Range) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut start = 0;
    for (id, node) in doc.nodes() {
        if node.as_tag().is_some() && range.overlaps_unit(start) {
            found.push(id);
        }
        start += node.width();
    }
    found
}

/// Execute an editor action on a document.
///
/// This is the central dispatch point for all editor operations. Returns
/// None when the action was skipped because it needs a selection and the
/// host had none (or only a stale one).
pub fn execute_action(
    doc: &mut Document,
    action: &EditorAction,
    selection: Option<&Selection>,
) -> Option<Edit> {
    let selection = selection.filter(|sel| selection_range(doc, sel).is_some());

    let edit = match (action, selection) {
        (EditorAction::InsertTag { label }, sel) => {
            let id = doc.alloc_tag_id();
            execute_insert(doc, vec![Node::tag(id, label.clone())], sel)
        }
        (EditorAction::InsertText { text }, sel) => execute_insert(doc, Node::lines(text), sel),
        (EditorAction::Clear, _) => execute_clear(doc),
        (EditorAction::RemoveTag { tag }, _) => execute_remove_tag(doc, *tag),
        (EditorAction::Refresh, _) => Edit::unchanged(0),
        (EditorAction::SelectAll, Some(_)) => execute_select_all(doc),
        (EditorAction::Paste { text }, Some(sel)) => execute_paste(doc, text, sel),
        (EditorAction::SplitLine, Some(sel)) => execute_split_line(doc, sel),
        (EditorAction::Delete { direction }, Some(sel)) => execute_delete(doc, *direction, sel),
        (EditorAction::TypeText { text }, Some(sel)) => execute_type_text(doc, text, sel),
        (_, None) => {
            tracing::debug!(target: "pretag::execute", ?action, "no selection, skipped");
            return None;
        }
    };

    tracing::debug!(
        target: "pretag::execute",
        ?action,
        modified = edit.modified,
        removed = edit.removed.len(),
        nodes = doc.len(),
        "executed"
    );
    Some(edit)
}

/// Insert nodes plus a separator space at the selection start, or append
/// them when there is no selection. The caret follows only in the first case.
fn execute_insert(doc: &mut Document, mut nodes: Vec<Node>, sel: Option<&Selection>) -> Edit {
    nodes.push(Node::text(" "));

    let (pos, at_caret) = match sel.and_then(|sel| insertion_point(doc, sel)) {
        Some(pos) => (pos, true),
        None => (doc.end_position(), false),
    };

    let Some(ids) = doc.insert_at(&pos, nodes) else {
        return Edit::unchanged(0);
    };
    let Some(caret) = ids.last().map(|&space| Position::at_char(space, 1)) else {
        return Edit::unchanged(0);
    };

    let mut edit = Edit::caret(doc, caret);
    if !at_caret {
        edit.caret = CaretUpdate::Keep;
    }
    edit
}

fn execute_paste(doc: &mut Document, text: &str, sel: &Selection) -> Edit {
    let Some(pos) = clear_selection(doc, sel) else {
        return Edit::unchanged(0);
    };
    let Some(ids) = doc.insert_at(&pos, Node::lines(text)) else {
        return Edit::unchanged(0);
    };
    match ids.last().and_then(|&last| caret_after(doc, last)) {
        Some(caret) => Edit::caret(doc, caret),
        None => Edit::unchanged(0),
    }
}

/// Delete a range selection and return the collapsed insertion point.
fn clear_selection(doc: &mut Document, sel: &Selection) -> Option<Position> {
    let range = selection_range(doc, sel)?;
    if range.is_caret() {
        return insertion_point(doc, sel);
    }
    let dropped = doc.delete_range(range);
    doc.normalize();
    tracing::trace!(
        target: "pretag::execute",
        start = range.start,
        end = range.end,
        tags = dropped.len(),
        "cleared selection"
    );
    Some(doc.position_at(range.start))
}

fn execute_split_line(doc: &mut Document, sel: &Selection) -> Edit {
    let Some(pos) = insertion_point(doc, sel) else {
        return Edit::unchanged(0);
    };
    let keep = matches!(doc.node(pos.node), Some(Node::Placeholder)).then_some(pos.node);
    doc.drop_placeholders(keep);

    // The caret may have been on a placeholder that was just dropped.
    let pos = if doc.contains(pos.node) {
        pos
    } else {
        doc.end_position()
    };

    match doc.insert_at(&pos, vec![Node::LineBreak, Node::Placeholder]) {
        Some(ids) => match ids.last() {
            Some(&anchor) => Edit::caret(doc, Position::before(anchor)),
            None => Edit::unchanged(0),
        },
        None => Edit::unchanged(0),
    }
}

fn execute_delete(doc: &mut Document, direction: DeleteDirection, sel: &Selection) -> Edit {
    let state = classify_delete(doc, sel);
    tracing::trace!(target: "pretag::execute", ?state, ?direction, "delete");
    match state {
        DeleteState::FullSelection => execute_clear(doc),
        DeleteState::RangeIntersectsTags => {
            let Some(range) = selection_range(doc, sel) else {
                return Edit::unchanged(0);
            };
            for id in tags_in(doc, range) {
                doc.remove(id);
            }
            let caret = doc.position_at(range.start);
            Edit::caret(doc, caret)
        }
        DeleteState::PlainDeletion => execute_plain_delete(doc, direction, sel),
    }
}

/// Remove the selected range, or one unit beside a caret.
fn execute_plain_delete(doc: &mut Document, direction: DeleteDirection, sel: &Selection) -> Edit {
    let Some(range) = selection_range(doc, sel) else {
        return Edit::unchanged(0);
    };

    let target = if !range.is_caret() {
        range
    } else {
        match direction {
            DeleteDirection::Backward if range.start > 0 => {
                Range::new(range.start - 1, range.start)
            }
            DeleteDirection::Forward if range.end < doc.width() => {
                Range::new(range.end, range.end + 1)
            }
            _ => return Edit::unchanged(range.start),
        }
    };

    let dropped = doc.delete_range(target);
    doc.normalize();
    tracing::trace!(
        target: "pretag::execute",
        start = target.start,
        end = target.end,
        tags = dropped.len(),
        "plain deletion"
    );
    let caret = doc.position_at(target.start);
    Edit::caret(doc, caret)
}

fn execute_select_all(doc: &Document) -> Edit {
    Edit {
        modified: false,
        caret: CaretUpdate::Select(Selection::Document),
        removed: Vec::new(),
        at: doc.width(),
    }
}

fn execute_clear(doc: &mut Document) -> Edit {
    let anchor = doc.clear();
    Edit::caret(doc, Position::before(anchor))
}

fn execute_remove_tag(doc: &mut Document, tag: TagId) -> Edit {
    let Some(node) = doc.find_tag(tag) else {
        tracing::debug!(target: "pretag::execute", %tag, "clicked tag is gone");
        return Edit::unchanged(0);
    };
    let at = doc.node_offset(node).unwrap_or(0);
    match doc.remove(node) {
        Some(Node::Tag(token)) => Edit {
            modified: true,
            caret: CaretUpdate::Keep,
            removed: vec![token],
            at,
        },
        _ => Edit::unchanged(at),
    }
}

/// Mirror natively typed characters into the document at the caret.
fn execute_type_text(doc: &mut Document, text: &str, sel: &Selection) -> Edit {
    if text.contains('\n') {
        return execute_paste(doc, text, sel);
    }
    let Some(pos) = clear_selection(doc, sel) else {
        return Edit::unchanged(0);
    };
    let offset = doc.offset_of(&pos).unwrap_or(0);
    // Canonical position prefers a placeholder, then the text run to the left.
    let pos = doc.position_at(offset);

    if doc.node(pos.node).is_some_and(Node::is_text) {
        let local = match pos.at {
            Boundary::Char(k) => k,
            Boundary::Before => 0,
            Boundary::After => usize::MAX,
        };
        return match doc.insert_chars(pos.node, local, text) {
            Some(end) => Edit::caret(doc, Position::at_char(pos.node, end)),
            None => Edit::unchanged(offset),
        };
    }

    match doc.insert_at(&pos, vec![Node::text(text)]) {
        Some(ids) => match ids.first() {
            Some(&id) => Edit::caret(doc, Position::at_char(id, text.chars().count())),
            None => Edit::unchanged(offset),
        },
        None => Edit::unchanged(offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::plain_text;

    fn ids(doc: &Document) -> Vec<NodeId> {
        doc.nodes().map(|(id, _)| id).collect()
    }

    fn caret_at(doc: &Document, offset: usize) -> Selection {
        Selection::Caret(doc.position_at(offset))
    }

    fn range(doc: &Document, start: usize, end: usize) -> Selection {
        Selection::new(doc.position_at(start), doc.position_at(end))
    }

    #[test]
    fn test_insert_tag_at_caret() {
        let mut doc = Document::from_nodes([Node::text("hi ")]);
        let sel = caret_at(&doc, 3);
        let edit = execute_action(
            &mut doc,
            &EditorAction::InsertTag {
                label: "Alice".into(),
            },
            Some(&sel),
        )
        .unwrap();

        assert_eq!(
            doc.to_nodes(),
            vec![
                Node::text("hi "),
                Node::tag(TagId(0), "Alice"),
                Node::text(" "),
            ]
        );
        let space = ids(&doc)[2];
        assert_eq!(edit.caret, CaretUpdate::Caret(Position::at_char(space, 1)));
        assert_eq!(edit.at, 5);
        assert!(edit.modified);
    }

    #[test]
    fn test_insert_without_selection_appends() {
        let mut doc = Document::from_nodes([Node::text("a")]);
        let edit = execute_action(
            &mut doc,
            &EditorAction::InsertText { text: "b".into() },
            None,
        )
        .unwrap();
        assert_eq!(
            doc.to_nodes(),
            vec![Node::text("a"), Node::text("b"), Node::text(" ")]
        );
        assert_eq!(edit.caret, CaretUpdate::Keep);
    }

    #[test]
    fn test_insert_with_range_does_not_delete() {
        let mut doc = Document::from_nodes([Node::text("hello")]);
        let sel = range(&doc, 4, 1);
        execute_action(
            &mut doc,
            &EditorAction::InsertTag { label: "T".into() },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(
            doc.to_nodes(),
            vec![
                Node::text("h"),
                Node::tag(TagId(0), "T"),
                Node::text(" "),
                Node::text("ello"),
            ]
        );
    }

    #[test]
    fn test_tag_ids_are_distinct() {
        let mut doc = Document::new();
        for label in ["Alice", "Alice"] {
            execute_action(
                &mut doc,
                &EditorAction::InsertTag {
                    label: label.into(),
                },
                None,
            );
        }
        let tags: Vec<_> = doc.tags().map(|(_, t)| t.id).collect();
        assert_eq!(tags, vec![TagId(0), TagId(1)]);
    }

    #[test]
    fn test_paste_multiline_into_empty() {
        let mut doc = Document::new();
        let sel = Selection::Caret(doc.start_position());
        let edit = execute_action(
            &mut doc,
            &EditorAction::Paste {
                text: "a\nb\nc".into(),
            },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(doc.to_nodes(), Node::lines("a\nb\nc"));
        assert_eq!(plain_text(&doc), "a\nb\nc");
        let last = doc.last();
        assert_eq!(edit.caret, CaretUpdate::Caret(Position::at_char(last, 1)));
    }

    #[test]
    fn test_paste_replaces_range() {
        let mut doc = Document::from_nodes([Node::text("hello world")]);
        let sel = range(&doc, 6, 11);
        execute_action(
            &mut doc,
            &EditorAction::Paste {
                text: "there".into(),
            },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(plain_text(&doc), "hello there");
    }

    #[test]
    fn test_paste_skipped_without_selection() {
        let mut doc = Document::from_nodes([Node::text("x")]);
        let edit = execute_action(&mut doc, &EditorAction::Paste { text: "y".into() }, None);
        assert!(edit.is_none());
        assert_eq!(doc.to_nodes(), vec![Node::text("x")]);
    }

    #[test]
    fn test_stale_selection_is_no_selection() {
        let mut doc = Document::from_nodes([Node::text("x")]);
        let stale = Selection::Caret(Position::before(NodeId(42)));
        assert!(execute_action(&mut doc, &EditorAction::SplitLine, Some(&stale)).is_none());
    }

    #[test]
    fn test_split_line_adds_break_and_anchor() {
        let mut doc = Document::from_nodes([Node::text("ab")]);
        let sel = caret_at(&doc, 1);
        let edit = execute_action(&mut doc, &EditorAction::SplitLine, Some(&sel)).unwrap();
        assert_eq!(
            doc.to_nodes(),
            vec![
                Node::text("a"),
                Node::LineBreak,
                Node::Placeholder,
                Node::text("b"),
            ]
        );
        let anchor = ids(&doc)[2];
        assert_eq!(edit.caret, CaretUpdate::Caret(Position::before(anchor)));
    }

    #[test]
    fn test_split_line_twice_keeps_lines() {
        let mut doc = Document::from_nodes([Node::text("a")]);
        for _ in 0..2 {
            let sel = Selection::Caret(doc.position_at(doc.width()));
            execute_action(&mut doc, &EditorAction::SplitLine, Some(&sel)).unwrap();
        }
        assert_eq!(
            doc.to_nodes(),
            vec![
                Node::text("a"),
                Node::LineBreak,
                Node::LineBreak,
                Node::Placeholder,
            ]
        );
    }

    #[test]
    fn test_classify_delete() {
        let doc = Document::from_nodes([
            Node::text("ab"),
            Node::tag(TagId(0), "T"),
            Node::text("cd"),
        ]);
        assert_eq!(
            classify_delete(&doc, &Selection::Document),
            DeleteState::FullSelection
        );
        assert_eq!(
            classify_delete(&doc, &range(&doc, 0, 5)),
            DeleteState::FullSelection
        );
        assert_eq!(
            classify_delete(&doc, &range(&doc, 1, 3)),
            DeleteState::RangeIntersectsTags
        );
        assert_eq!(
            classify_delete(&doc, &range(&doc, 3, 5)),
            DeleteState::PlainDeletion
        );
        assert_eq!(
            classify_delete(&doc, &caret_at(&doc, 3)),
            DeleteState::PlainDeletion
        );
    }

    #[test]
    fn test_full_selection_delete_clears() {
        let mut doc = Document::from_nodes([Node::text("ab"), Node::tag(TagId(0), "T")]);
        let edit = execute_action(
            &mut doc,
            &EditorAction::Delete {
                direction: DeleteDirection::Backward,
            },
            Some(&Selection::Document),
        )
        .unwrap();
        assert_eq!(doc.to_nodes(), vec![Node::Placeholder]);
        assert_eq!(plain_text(&doc), "");
        assert!(edit.removed.is_empty());
    }

    #[test]
    fn test_range_over_tag_removes_only_tags() {
        let mut doc = Document::from_nodes([
            Node::text("ab"),
            Node::tag(TagId(0), "T"),
            Node::text("cd"),
        ]);
        let sel = range(&doc, 1, 4);
        let edit = execute_action(
            &mut doc,
            &EditorAction::Delete {
                direction: DeleteDirection::Forward,
            },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(doc.to_nodes(), vec![Node::text("ab"), Node::text("cd")]);
        assert!(edit.removed.is_empty());
        assert_eq!(edit.at, 1);
    }

    #[test]
    fn test_backspace_units() {
        let mut doc = Document::from_nodes([
            Node::text("a"),
            Node::tag(TagId(0), "T"),
            Node::LineBreak,
            Node::text("bc"),
        ]);
        let backspace = EditorAction::Delete {
            direction: DeleteDirection::Backward,
        };

        // Char, then break, then the whole tag.
        let sel = caret_at(&doc, 4);
        execute_action(&mut doc, &backspace, Some(&sel)).unwrap();
        assert_eq!(plain_text(&doc), "aT\nc");

        let sel = caret_at(&doc, 3);
        execute_action(&mut doc, &backspace, Some(&sel)).unwrap();
        assert_eq!(plain_text(&doc), "aTc");

        let sel = caret_at(&doc, 2);
        let edit = execute_action(&mut doc, &backspace, Some(&sel)).unwrap();
        assert_eq!(doc.to_nodes(), vec![Node::text("ac")]);
        assert!(edit.removed.is_empty());
        assert_eq!(edit.caret, CaretUpdate::Caret(Position::at_char(doc.first(), 1)));
    }

    #[test]
    fn test_delete_at_edges_is_noop() {
        let mut doc = Document::from_nodes([Node::text("ab")]);
        let sel = caret_at(&doc, 0);
        let edit = execute_action(
            &mut doc,
            &EditorAction::Delete {
                direction: DeleteDirection::Backward,
            },
            Some(&sel),
        )
        .unwrap();
        assert!(!edit.modified);

        let sel = caret_at(&doc, 2);
        let edit = execute_action(
            &mut doc,
            &EditorAction::Delete {
                direction: DeleteDirection::Forward,
            },
            Some(&sel),
        )
        .unwrap();
        assert!(!edit.modified);
        assert_eq!(doc.to_nodes(), vec![Node::text("ab")]);
    }

    #[test]
    fn test_forward_delete_merges_runs() {
        let mut doc = Document::from_nodes([Node::text("a"), Node::LineBreak, Node::text("b")]);
        let sel = caret_at(&doc, 1);
        execute_action(
            &mut doc,
            &EditorAction::Delete {
                direction: DeleteDirection::Forward,
            },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(doc.to_nodes(), vec![Node::text("ab")]);
    }

    #[test]
    fn test_remove_tag_reports_label() {
        let mut doc = Document::from_nodes([
            Node::tag(TagId(0), "Alice"),
            Node::text(" "),
            Node::tag(TagId(1), "Bob"),
        ]);
        let edit = execute_action(
            &mut doc,
            &EditorAction::RemoveTag { tag: TagId(0) },
            None,
        )
        .unwrap();
        assert_eq!(edit.removed.len(), 1);
        assert_eq!(edit.removed[0].label, "Alice");
        assert!(doc.find_tag(TagId(1)).is_some());

        let again = execute_action(
            &mut doc,
            &EditorAction::RemoveTag { tag: TagId(0) },
            None,
        )
        .unwrap();
        assert!(!again.modified);
        assert!(again.removed.is_empty());
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut doc = Document::from_nodes([Node::text("abc")]);
        assert!(execute_action(&mut doc, &EditorAction::SelectAll, None).is_none());

        let caret = Selection::Caret(Position::at_char(doc.first(), 1));
        let edit = execute_action(&mut doc, &EditorAction::SelectAll, Some(&caret)).unwrap();
        assert_eq!(edit.caret, CaretUpdate::Select(Selection::Document));
        assert!(!edit.modified);

        let edit = execute_action(&mut doc, &EditorAction::Clear, None).unwrap();
        assert_eq!(doc.to_nodes(), vec![Node::Placeholder]);
        assert_eq!(
            edit.caret,
            CaretUpdate::Caret(Position::before(doc.first()))
        );
    }

    #[test]
    fn test_type_text_extends_run_and_fills_anchor() {
        let mut doc = Document::from_nodes([Node::text("ab"), Node::tag(TagId(0), "T")]);
        // Before the tag: the run on the left is extended.
        let sel = Selection::Caret(Position::before(ids(&doc)[1]));
        execute_action(
            &mut doc,
            &EditorAction::TypeText { text: "c".into() },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(
            doc.to_nodes(),
            vec![Node::text("abc"), Node::tag(TagId(0), "T")]
        );

        // After the tag with nothing beside it: a new run.
        let sel = Selection::Caret(Position::after(ids(&doc)[1]));
        let edit = execute_action(
            &mut doc,
            &EditorAction::TypeText { text: "d".into() },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(plain_text(&doc), "abcTd");
        let run = ids(&doc)[2];
        assert_eq!(edit.caret, CaretUpdate::Caret(Position::at_char(run, 1)));

        let mut doc = Document::new();
        let sel = Selection::Caret(doc.start_position());
        execute_action(
            &mut doc,
            &EditorAction::TypeText { text: "x".into() },
            Some(&sel),
        )
        .unwrap();
        assert_eq!(doc.to_nodes(), vec![Node::text("x")]);
    }

    #[test]
    fn test_refresh_changes_nothing() {
        let mut doc = Document::from_nodes([Node::text("x")]);
        let edit = execute_action(&mut doc, &EditorAction::Refresh, None).unwrap();
        assert!(!edit.modified);
        assert_eq!(doc.to_nodes(), vec![Node::text("x")]);
    }
}
