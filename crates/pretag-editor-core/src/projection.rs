//! Derived views of a document.
//!
//! Both views are recomputed together from the document. Nothing here caches,
//! so projecting an unchanged document always gives identical output.

use serde::Serialize;

use crate::document::Document;
use crate::markup::{MarkupMode, render_markup};
use crate::types::Node;

/// Plain-text and persisted-markup views, computed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub text: String,
    pub markup: String,
}

pub fn project(doc: &Document) -> Projection {
    Projection {
        text: plain_text(doc),
        markup: render_markup(doc, MarkupMode::Persisted),
    }
}

enum Piece<'a> {
    Text(String),
    Label(&'a str),
}

/// Visible text of a document, cleaned of editing-surface artifacts.
///
/// Tag labels and line breaks pass through untouched; only text runs are
/// cleaned.
pub fn plain_text(doc: &Document) -> String {
    let mut out = String::new();
    let mut line: Vec<Piece<'_>> = Vec::new();
    for (_, node) in doc.nodes() {
        match node {
            Node::Text { content } => match line.last_mut() {
                Some(Piece::Text(prev)) => prev.push_str(content),
                _ => line.push(Piece::Text(content.clone())),
            },
            Node::Tag(tag) => line.push(Piece::Label(&tag.label)),
            Node::LineBreak => {
                flush_line(&mut out, &mut line);
                out.push('\n');
            }
            Node::Placeholder => {}
        }
    }
    flush_line(&mut out, &mut line);
    out
}

fn flush_line(out: &mut String, line: &mut Vec<Piece<'_>>) {
    let last = line.len().saturating_sub(1);
    for (i, piece) in line.drain(..).enumerate() {
        match piece {
            Piece::Text(text) => {
                let cleaned = clean_run(&text);
                if i == last {
                    out.push_str(cleaned.trim_end_matches(' '));
                } else {
                    out.push_str(&cleaned);
                }
            }
            Piece::Label(label) => out.push_str(label),
        }
    }
}

/// Clean one run: drop zero-width chars and `\r`, turn NBSP and tabs into
/// spaces, collapse space runs.
fn clean_run(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let c = match c {
            '\u{200B}' | '\u{200C}' | '\u{FEFF}' | '\r' => continue,
            '\u{a0}' | '\t' => ' ',
            c => c,
        };
        if c == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Apply the plain-text cleanup to an arbitrary string, line by line.
pub fn clean_text(text: &str) -> String {
    text.split('\n')
        .map(|line| clean_run(line).trim_end_matches(' ').to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagId;
    use insta::assert_snapshot;

    #[test]
    fn test_plain_text_of_mixed_document() {
        let doc = Document::from_nodes([
            Node::text("hi "),
            Node::tag(TagId(0), "Alice"),
            Node::text(" "),
            Node::LineBreak,
            Node::Placeholder,
            Node::text("bye"),
        ]);
        assert_eq!(plain_text(&doc), "hi Alice\nbye");
    }

    #[test]
    fn test_cleanup_leaves_labels_alone() {
        let doc = Document::from_nodes([
            Node::text("a\u{a0}\u{a0} \u{200B}b\t"),
            Node::tag(TagId(0), "  spaced  "),
            Node::text("c  "),
        ]);
        assert_eq!(plain_text(&doc), "a b   spaced  c");
    }

    #[test]
    fn test_cleanup_collapses_across_adjacent_runs() {
        let doc = Document::from_nodes([Node::text("a "), Node::text(" b")]);
        assert_eq!(plain_text(&doc), "a b");
    }

    #[test]
    fn test_breaks_survive_cleanup() {
        let doc = Document::from_nodes(Node::lines("a\nb\nc"));
        assert_eq!(plain_text(&doc), "a\nb\nc");
        let doc = Document::from_nodes(Node::lines("\n\n"));
        assert_eq!(plain_text(&doc), "\n\n");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("x  y \r\n\u{FEFF}z\t"), "x y\nz");
    }

    #[test]
    fn test_project_is_idempotent() {
        let doc = Document::from_nodes([
            Node::text("x "),
            Node::tag(TagId(3), "<T>"),
            Node::LineBreak,
            Node::text("y"),
        ]);
        let first = project(&doc);
        assert_eq!(first, project(&doc));
        assert_eq!(first.text, "x <T>\ny");
        assert_snapshot!(
            first.markup,
            @r#"x <span class="tag" id="tag-3" contenteditable="false">&lt;T&gt;</span><br>y"#
        );
    }
}
