//! Core editor types: node identity, document nodes, positions and selections.
//!
//! These types are framework-agnostic. Host surfaces refer to live nodes by
//! `NodeId`, never by index, so a position survives edits elsewhere in the
//! document and goes stale (rather than silently moving) when its node is removed.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Stable identity of a node in a `Document` arena.
///
/// Allocated from a per-document counter and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Parse the host-facing form (`n12`).
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix('n')?.parse().ok().map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identity of a tag token, rendered as `tag-{n}` in markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u64);

impl TagId {
    /// Parse the markup form (`tag-3`).
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix("tag-")?.parse().ok().map(TagId)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag-{}", self.0)
    }
}

/// An atomic, clickable, removable token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagToken {
    pub id: TagId,
    pub label: SmolStr,
}

/// A unit of document content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Literal, directly editable text. May be empty.
    Text { content: String },
    /// Atomic token. The caret sits before or after it, never inside.
    Tag(TagToken),
    /// Hard line separator.
    LineBreak,
    /// Empty caret anchor, absorbed by the next insertion into it.
    Placeholder,
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
        }
    }

    pub fn tag(id: TagId, label: impl Into<SmolStr>) -> Self {
        Node::Tag(TagToken {
            id,
            label: label.into(),
        })
    }

    /// Split text on line boundaries into text runs separated by line breaks.
    ///
    /// `\r\n` counts as one boundary. Always yields at least one text run, and
    /// exactly one break fewer than runs.
    pub fn lines(text: &str) -> Vec<Node> {
        let mut nodes = Vec::new();
        for (i, fragment) in text.split('\n').enumerate() {
            if i > 0 {
                nodes.push(Node::LineBreak);
            }
            nodes.push(Node::text(fragment.strip_suffix('\r').unwrap_or(fragment)));
        }
        nodes
    }

    /// Number of document offsets this node spans.
    ///
    /// Text spans its char count, tags and breaks span one, placeholders none.
    pub fn width(&self) -> usize {
        match self {
            Node::Text { content } => content.chars().count(),
            Node::Tag(_) | Node::LineBreak => 1,
            Node::Placeholder => 0,
        }
    }

    /// Whether this node carries user-visible content.
    pub fn is_content(&self) -> bool {
        match self {
            Node::Text { content } => !content.is_empty(),
            Node::Tag(_) | Node::LineBreak => true,
            Node::Placeholder => false,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text { .. })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text { content } => Some(content),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&TagToken> {
        match self {
            Node::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Where inside (or beside) a node a position sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Char offset inside a text run (0..=len). Only meaningful on text.
    Char(usize),
    /// Immediately before the node.
    Before,
    /// Immediately after the node.
    After,
}

/// A logical caret location anchored to a live node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub node: NodeId,
    pub at: Boundary,
}

impl Position {
    pub fn new(node: NodeId, at: Boundary) -> Self {
        Self { node, at }
    }

    pub fn before(node: NodeId) -> Self {
        Self::new(node, Boundary::Before)
    }

    pub fn after(node: NodeId) -> Self {
        Self::new(node, Boundary::After)
    }

    pub fn at_char(node: NodeId, offset: usize) -> Self {
        Self::new(node, Boundary::Char(offset))
    }
}

/// A range in the document, measured in document offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    /// Whether the one-offset unit starting at `offset` overlaps this range.
    pub fn overlaps_unit(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

/// The active editing focus.
///
/// Transient: recomputed from the host on every event, never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Collapsed selection.
    Caret(Position),
    /// Anchor is where the selection started, focus is where it ends now.
    Range { anchor: Position, focus: Position },
    /// Whole-document sentinel produced by select-all.
    Document,
}

impl Selection {
    /// Build a selection, collapsing to a caret when both ends match.
    pub fn new(anchor: Position, focus: Position) -> Self {
        if anchor == focus {
            Selection::Caret(anchor)
        } else {
            Selection::Range { anchor, focus }
        }
    }

    pub fn is_caret(&self) -> bool {
        matches!(self, Selection::Caret(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_round_trip() {
        assert_eq!(NodeId(12).to_string(), "n12");
        assert_eq!(NodeId::parse("n12"), Some(NodeId(12)));
        assert_eq!(NodeId::parse("12"), None);
        assert_eq!(NodeId::parse("nx"), None);
    }

    #[test]
    fn test_tag_id_parse() {
        assert_eq!(TagId(3).to_string(), "tag-3");
        assert_eq!(TagId::parse("tag-3"), Some(TagId(3)));
        assert_eq!(TagId::parse("tag-"), None);
        assert_eq!(TagId::parse("preTagBox"), None);
    }

    #[test]
    fn test_node_width() {
        assert_eq!(Node::text("héllo").width(), 5);
        assert_eq!(Node::text("").width(), 0);
        assert_eq!(Node::tag(TagId(0), "Alice").width(), 1);
        assert_eq!(Node::LineBreak.width(), 1);
        assert_eq!(Node::Placeholder.width(), 0);
    }

    #[test]
    fn test_node_lines() {
        assert_eq!(
            Node::lines("a\r\nb\nc"),
            vec![
                Node::text("a"),
                Node::LineBreak,
                Node::text("b"),
                Node::LineBreak,
                Node::text("c"),
            ]
        );
        assert_eq!(Node::lines(""), vec![Node::text("")]);
        assert_eq!(
            Node::lines("x\n"),
            vec![Node::text("x"), Node::LineBreak, Node::text("")]
        );
    }

    #[test]
    fn test_node_is_content() {
        assert!(Node::text("a").is_content());
        assert!(!Node::text("").is_content());
        assert!(Node::tag(TagId(0), "").is_content());
        assert!(Node::LineBreak.is_content());
        assert!(!Node::Placeholder.is_content());
    }

    #[test]
    fn test_range_bounds() {
        let r = Range::new(10, 5).normalize();
        assert_eq!(r, Range::new(5, 10));
        assert_eq!(r.len(), 5);
        assert!(Range::caret(3).is_caret());

        assert!(!r.overlaps_unit(4));
        assert!(r.overlaps_unit(5));
        assert!(r.overlaps_unit(9));
        assert!(!r.overlaps_unit(10)); // end is exclusive
    }

    #[test]
    fn test_selection_collapses() {
        let p = Position::at_char(NodeId(1), 2);
        assert_eq!(Selection::new(p, p), Selection::Caret(p));
        let q = Position::after(NodeId(1));
        assert!(!Selection::new(p, q).is_caret());
    }
}
