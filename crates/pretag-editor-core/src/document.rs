//! Document model: an arena of nodes with stable identity.
//!
//! The document is the source of truth for one editing region. Host surfaces
//! are derived views of it. Every node carries a `NodeId` that is never reused,
//! and the document owns the monotonic tag-id counter so that several editors
//! on one page never hand out colliding tag ids.
//!
//! Invariant: the node sequence is never empty. Any operation that would leave
//! it empty installs a `Placeholder` so a caret position always exists.

use crate::types::{Boundary, Node, NodeId, Position, Range, TagId, TagToken};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    id: NodeId,
    node: Node,
}

/// Ordered node sequence for one editable region.
#[derive(Clone, Debug)]
pub struct Document {
    entries: Vec<Entry>,
    next_node: u64,
    next_tag: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Where an insertion lands after resolving a position.
enum Split {
    At(usize),
    Absorb,
    Tail(String),
}

impl Document {
    /// Create the minimal empty document: a single placeholder.
    pub fn new() -> Self {
        let mut doc = Self {
            entries: Vec::new(),
            next_node: 0,
            next_tag: 0,
        };
        doc.ensure_anchor();
        doc
    }

    /// Build a document from nodes, advancing the tag counter past every tag id seen.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut doc = Self {
            entries: Vec::new(),
            next_node: 0,
            next_tag: 0,
        };
        for node in nodes {
            if let Node::Tag(tag) = &node {
                doc.next_tag = doc.next_tag.max(tag.id.0.saturating_add(1));
            }
            let entry = doc.new_entry(node);
            doc.entries.push(entry);
        }
        doc.ensure_anchor();
        doc
    }

    fn new_entry(&mut self, node: Node) -> Entry {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        Entry { id, node }
    }

    fn ensure_anchor(&mut self) {
        if self.entries.is_empty() {
            let entry = self.new_entry(Node::Placeholder);
            self.entries.push(entry);
        }
    }

    // === Tag ids ===

    /// Hand out a fresh tag id. Never reset, never reused.
    pub fn alloc_tag_id(&mut self) -> TagId {
        let id = TagId(self.next_tag);
        self.next_tag = self.next_tag.saturating_add(1);
        tracing::trace!(target: "pretag::document", tag = %id, "allocated tag id");
        id
    }

    /// The id the next `alloc_tag_id` call will return.
    pub fn next_tag_id(&self) -> TagId {
        TagId(self.next_tag)
    }

    // === Traversal ===

    /// Number of nodes (including placeholders and empty runs).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True iff no node carries content.
    pub fn is_empty(&self) -> bool {
        !self.entries.iter().any(|e| e.node.is_content())
    }

    /// Total width in document offsets.
    pub fn width(&self) -> usize {
        self.entries.iter().map(|e| e.node.width()).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.entries.iter().map(|e| (e.id, &e.node))
    }

    /// Clone the node sequence without identities.
    pub fn to_nodes(&self) -> Vec<Node> {
        self.entries.iter().map(|e| e.node.clone()).collect()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// First node. The sequence is never empty.
    pub fn first(&self) -> NodeId {
        self.entries[0].id
    }

    /// Last node. The sequence is never empty.
    pub fn last(&self) -> NodeId {
        self.entries[self.entries.len() - 1].id
    }

    pub fn start_position(&self) -> Position {
        Position::before(self.first())
    }

    pub fn end_position(&self) -> Position {
        Position::after(self.last())
    }

    pub fn tags(&self) -> impl Iterator<Item = (NodeId, &TagToken)> + '_ {
        self.entries
            .iter()
            .filter_map(|e| e.node.as_tag().map(|tag| (e.id, tag)))
    }

    pub fn find_tag(&self, tag: TagId) -> Option<NodeId> {
        self.tags().find(|(_, t)| t.id == tag).map(|(id, _)| id)
    }

    // === Offsets ===

    /// Document offset of a position, or None if its node is not in the document.
    pub fn offset_of(&self, pos: &Position) -> Option<usize> {
        let mut start = 0;
        for entry in &self.entries {
            let width = entry.node.width();
            if entry.id == pos.node {
                let local = match (pos.at, &entry.node) {
                    (Boundary::Before, _) => 0,
                    (Boundary::After, _) => width,
                    (Boundary::Char(k), Node::Text { .. }) => k.min(width),
                    (Boundary::Char(0), _) => 0,
                    (Boundary::Char(_), _) => width,
                };
                return Some(start + local);
            }
            start += width;
        }
        None
    }

    /// Offset where a node starts.
    pub fn node_offset(&self, id: NodeId) -> Option<usize> {
        self.offset_of(&Position::before(id))
    }

    /// Canonical position for a document offset.
    ///
    /// Preference when several nodes touch the offset: a placeholder sitting
    /// there, then a text run (earliest first, so typing extends the run on the
    /// left), then just after an atomic node, then just before one.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.width());
        let mut best: Option<(u8, Position)> = None;
        let mut start = 0;

        for entry in &self.entries {
            if start > offset {
                break;
            }
            let end = start + entry.node.width();
            let candidate = match &entry.node {
                Node::Placeholder if start == offset => Some((3, Position::before(entry.id))),
                Node::Text { .. } if offset <= end => {
                    Some((2, Position::at_char(entry.id, offset - start)))
                }
                Node::Tag(_) | Node::LineBreak if end == offset => {
                    Some((1, Position::after(entry.id)))
                }
                Node::Tag(_) | Node::LineBreak if start == offset => {
                    Some((0, Position::before(entry.id)))
                }
                _ => None,
            };
            if let Some((rank, pos)) = candidate {
                if best.is_none_or(|(r, _)| rank > r) {
                    best = Some((rank, pos));
                }
            }
            start = end;
        }

        best.map(|(_, pos)| pos)
            .unwrap_or_else(|| self.end_position())
    }

    // === Mutation ===

    /// Insert a node at an index (clamped to the sequence length).
    pub fn insert(&mut self, index: usize, node: Node) -> NodeId {
        let index = index.min(self.entries.len());
        let entry = self.new_entry(node);
        let id = entry.id;
        self.entries.insert(index, entry);
        id
    }

    /// Append a node.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.insert(self.entries.len(), node)
    }

    /// Remove a node by identity. Removing the last node installs a placeholder.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);
        self.ensure_anchor();
        Some(entry.node)
    }

    /// Insert nodes at a position, splitting a text run if the position is inside one.
    ///
    /// A placeholder at the position is absorbed: the new nodes take its place.
    /// Returns the new node ids in order, or None if the position is stale.
    pub fn insert_at(&mut self, pos: &Position, nodes: Vec<Node>) -> Option<Vec<NodeId>> {
        let index = self.index_of(pos.node)?;
        let mut at = self.split_for_insert(index, pos.at);

        let mut ids = Vec::with_capacity(nodes.len());
        for node in nodes {
            ids.push(self.insert(at, node));
            at += 1;
        }
        self.ensure_anchor();
        Some(ids)
    }

    fn split_for_insert(&mut self, index: usize, at: Boundary) -> usize {
        let split = match &mut self.entries[index].node {
            Node::Placeholder => Split::Absorb,
            Node::Text { content } => {
                let len = content.chars().count();
                let k = match at {
                    Boundary::Before => 0,
                    Boundary::After => len,
                    Boundary::Char(k) => k.min(len),
                };
                if k == 0 {
                    Split::At(index)
                } else if k == len {
                    Split::At(index + 1)
                } else {
                    let byte = char_to_byte(content, k);
                    Split::Tail(content.split_off(byte))
                }
            }
            _ => match at {
                Boundary::Before | Boundary::Char(0) => Split::At(index),
                Boundary::After | Boundary::Char(_) => Split::At(index + 1),
            },
        };

        match split {
            Split::At(i) => i,
            Split::Absorb => {
                self.entries.remove(index);
                index
            }
            Split::Tail(tail) => {
                let entry = self.new_entry(Node::text(tail));
                self.entries.insert(index + 1, entry);
                index + 1
            }
        }
    }

    /// Insert characters into a text run. Returns the char offset after them.
    pub fn insert_chars(&mut self, id: NodeId, char_offset: usize, text: &str) -> Option<usize> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        let Node::Text { content } = &mut entry.node else {
            return None;
        };
        let k = char_offset.min(content.chars().count());
        let byte = char_to_byte(content, k);
        content.insert_str(byte, text);
        Some(k + text.chars().count())
    }

    /// Replace everything with a single placeholder. Returns its id.
    pub fn clear(&mut self) -> NodeId {
        self.entries.clear();
        self.ensure_anchor();
        self.first()
    }

    /// Drop trailing line breaks. Returns how many were removed.
    pub fn strip_trailing_breaks(&mut self) -> usize {
        let mut stripped = 0;
        while matches!(
            self.entries.last(),
            Some(Entry {
                node: Node::LineBreak,
                ..
            })
        ) {
            self.entries.pop();
            stripped += 1;
        }
        self.ensure_anchor();
        stripped
    }

    /// Drop placeholders other than `keep`. Returns how many were removed.
    pub fn drop_placeholders(&mut self, keep: Option<NodeId>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !matches!(e.node, Node::Placeholder) || Some(e.id) == keep);
        let dropped = before - self.entries.len();
        self.ensure_anchor();
        dropped
    }

    /// Remove everything inside an offset range.
    ///
    /// Partially covered text runs are trimmed, atomic nodes fully inside the
    /// range are removed, and placeholders touching it go too. Returns the tag
    /// tokens that were removed.
    pub fn delete_range(&mut self, range: Range) -> Vec<TagToken> {
        let width = self.width();
        let range = range.normalize();
        let range = Range::new(range.start.min(width), range.end.min(width));
        if range.is_caret() {
            return Vec::new();
        }

        let mut removed = Vec::new();
        let mut start = 0;
        for mut entry in std::mem::take(&mut self.entries) {
            let end = start + entry.node.width();
            let keep = match &mut entry.node {
                Node::Text { content } => {
                    let from = range.start.max(start);
                    let to = range.end.min(end);
                    if from >= to {
                        true
                    } else if from == start && to == end {
                        false
                    } else {
                        let b0 = char_to_byte(content, from - start);
                        let b1 = char_to_byte(content, to - start);
                        content.replace_range(b0..b1, "");
                        true
                    }
                }
                Node::Tag(_) | Node::LineBreak => !(range.start <= start && end <= range.end),
                Node::Placeholder => !(range.start <= start && start <= range.end),
            };

            if keep {
                self.entries.push(entry);
            } else if let Node::Tag(tag) = entry.node {
                removed.push(tag);
            }
            start = end;
        }

        self.ensure_anchor();
        removed
    }

    /// Merge adjacent text runs and drop empty runs and placeholders.
    pub fn normalize(&mut self) {
        for entry in std::mem::take(&mut self.entries) {
            match entry.node {
                Node::Placeholder => {}
                Node::Text { ref content } if content.is_empty() => {}
                Node::Text { content } => {
                    if let Some(Entry {
                        node: Node::Text { content: prev },
                        ..
                    }) = self.entries.last_mut()
                    {
                        prev.push_str(&content);
                    } else {
                        self.entries.push(Entry {
                            id: entry.id,
                            node: Node::Text { content },
                        });
                    }
                }
                node => self.entries.push(Entry { id: entry.id, node }),
            }
        }
        self.ensure_anchor();
    }
}

/// Byte index of a char offset, clamped to the string length.
fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}
