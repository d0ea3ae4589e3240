//! Cursor/selection bridge operations.
//!
//! Converts host-reported selections into `Selection`s anchored to live
//! document nodes, and document positions back into host caret placements.
//! A host point naming a node that is not in the document is treated as no
//! selection at all; there is no fallback guess.

use crate::document::Document;
use crate::platform::{ClickTarget, HostSelection, PlatformError, SelectionBridge};
use crate::types::{Node, NodeId, Position, Range, Selection, TagId};

/// Read the host selection and anchor it to the document.
pub fn current_selection<B: SelectionBridge + ?Sized>(
    doc: &Document,
    bridge: &B,
) -> Option<Selection> {
    let host = bridge.read_selection()?;
    resolve_selection(doc, &host)
}

/// Anchor a host selection to the document.
///
/// Returns the whole-document sentinel when the host selection spans exactly
/// from before the first node to after the last one.
pub fn resolve_selection(doc: &Document, host: &HostSelection) -> Option<Selection> {
    if !doc.contains(host.anchor.node) || !doc.contains(host.focus.node) {
        tracing::warn!(
            target: "pretag::cursor",
            anchor = %host.anchor.node,
            focus = %host.focus.node,
            "host selection references a node outside the document"
        );
        return None;
    }

    let (start, end) = ordered(doc, host.anchor, host.focus);
    if start == doc.start_position() && end == doc.end_position() && !host.is_collapsed() {
        return Some(Selection::Document);
    }

    Some(Selection::new(host.anchor, host.focus))
}

/// Order two positions by document offset (ties keep argument order).
fn ordered(doc: &Document, a: Position, b: Position) -> (Position, Position) {
    match (doc.offset_of(&a), doc.offset_of(&b)) {
        (Some(x), Some(y)) if y < x => (b, a),
        _ => (a, b),
    }
}

/// Offset range covered by a selection, or None if it went stale.
pub fn selection_range(doc: &Document, sel: &Selection) -> Option<Range> {
    match sel {
        Selection::Caret(pos) => doc.offset_of(pos).map(Range::caret),
        Selection::Range { anchor, focus } => {
            let a = doc.offset_of(anchor)?;
            let f = doc.offset_of(focus)?;
            Some(Range::new(a, f).normalize())
        }
        Selection::Document => Some(Range::new(0, doc.width())),
    }
}

/// Where an insertion goes for a selection: its start.
pub fn insertion_point(doc: &Document, sel: &Selection) -> Option<Position> {
    match sel {
        Selection::Caret(pos) => doc.contains(pos.node).then_some(*pos),
        Selection::Range { anchor, focus } => {
            if !doc.contains(anchor.node) || !doc.contains(focus.node) {
                return None;
            }
            Some(ordered(doc, *anchor, *focus).0)
        }
        Selection::Document => Some(doc.start_position()),
    }
}

/// Whether a selection covers the entire document boundary-to-boundary.
pub fn is_full_selection(doc: &Document, sel: &Selection) -> bool {
    match sel {
        Selection::Document => true,
        Selection::Caret(_) => false,
        Selection::Range { .. } => {
            let width = doc.width();
            width > 0 && selection_range(doc, sel) == Some(Range::new(0, width))
        }
    }
}

/// Caret position immediately after a node.
pub fn caret_after(doc: &Document, node: NodeId) -> Option<Position> {
    match doc.node(node)? {
        Node::Text { content } => Some(Position::at_char(node, content.chars().count())),
        _ => Some(Position::after(node)),
    }
}

/// Put the host caret immediately after a node.
pub fn place_caret_after<B: SelectionBridge + ?Sized>(
    doc: &Document,
    bridge: &mut B,
    node: NodeId,
) -> Result<(), PlatformError> {
    let pos = caret_after(doc, node)
        .ok_or_else(|| PlatformError(format!("node {node} is not in the document")))?;
    place_caret(doc, bridge, pos)
}

/// Put the host caret at a position.
pub fn place_caret<B: SelectionBridge + ?Sized>(
    doc: &Document,
    bridge: &mut B,
    pos: Position,
) -> Result<(), PlatformError> {
    if !doc.contains(pos.node) {
        return Err(PlatformError(format!(
            "caret target {} is not in the document",
            pos.node
        )));
    }
    tracing::trace!(target: "pretag::cursor", node = %pos.node, at = ?pos.at, "placing caret");
    bridge.apply_selection(HostSelection::caret(pos))
}

/// Stretch the host selection across the whole document.
pub fn select_document<B: SelectionBridge + ?Sized>(
    doc: &Document,
    bridge: &mut B,
) -> Result<(), PlatformError> {
    bridge.apply_selection(HostSelection::new(
        doc.start_position(),
        doc.end_position(),
    ))
}

/// Resolve a click target to the tag token it hit.
pub fn clicked_tag(doc: &Document, target: &ClickTarget) -> Option<(NodeId, TagId)> {
    match target {
        ClickTarget::Node(id) => doc.node(*id)?.as_tag().map(|tag| (*id, tag.id)),
        ClickTarget::Element(dom_id) => {
            let tag = TagId::parse(dom_id)?;
            doc.find_tag(tag).map(|node| (node, tag))
        }
    }
}

/// Selection spanning the clicked tag token, if the click hit one.
pub fn range_for_click(doc: &Document, target: &ClickTarget) -> Option<Selection> {
    let (node, _) = clicked_tag(doc, target)?;
    Some(Selection::Range {
        anchor: Position::before(node),
        focus: Position::after(node),
    })
}
