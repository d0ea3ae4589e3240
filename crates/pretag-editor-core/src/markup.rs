//! Markup codec for tag documents.
//!
//! Serializes a `Document` to the HTML-like form hosts render and persist,
//! and parses that form back for hydration and cleanup. Only the subset the
//! editor itself produces (plus what contenteditable hosts commonly add:
//! wrapper spans, `<div>` lines, entities) is understood.
//!
//! Tags round-trip as
//! `<span class="tag" id="tag-N" contenteditable="false">label</span>`, line
//! breaks as `<br>`. Host markup also carries `data-node-id` on every element
//! and renders placeholders as `<span data-caret=""></span>`; persisted
//! markup has neither.

use std::collections::HashSet;

use logos::Logos;

use crate::document::Document;
use crate::error::MarkupError;
use crate::types::{Node, TagId};

/// Which flavor of markup to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupMode {
    /// Live host view: node ids and caret helpers included.
    Host,
    /// Persisted projection: transient attributes and helpers stripped.
    Persisted,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'src> {
    #[regex(r#"<[a-zA-Z]([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end()
    })]
    CloseTag(&'src str),

    #[regex(r"&[a-zA-Z]+;|&#[0-9]+;|&#[xX][0-9a-fA-F]+;", |lex| lex.slice())]
    Entity(&'src str),

    #[token("&")]
    Ampersand,

    #[regex(r"[^<&]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Escape text for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Decode a single `&...;` entity. Unknown entities yield None.
fn decode_entity(raw: &str) -> Option<char> {
    let name = raw.strip_prefix('&')?.strip_suffix(';')?;
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)?
        }
    };
    Some(c)
}

/// Decode every entity in an attribute value.
fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|semi| {
            decode_entity(&tail[..=semi]).map(|c| (c, semi))
        }) {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// An opening element with its attributes.
#[derive(Debug)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

impl Element {
    fn parse(raw: &str, offset: usize) -> Result<Self, MarkupError> {
        let malformed = || MarkupError::MalformedElement {
            source_text: raw.to_string(),
            offset,
        };

        let inner = &raw[1..raw.len() - 1];
        let (inner, self_closing) = match inner.strip_suffix('/') {
            Some(s) => (s, true),
            None => (inner, false),
        };
        let name_end = inner
            .find(|c: char| c.is_whitespace())
            .unwrap_or(inner.len());
        let name = inner[..name_end].to_ascii_lowercase();

        let mut attrs = Vec::new();
        let mut rest = inner[name_end..].trim_start();
        while !rest.is_empty() {
            let key_end = rest
                .find(|c: char| c == '=' || c.is_whitespace())
                .unwrap_or(rest.len());
            if key_end == 0 {
                return Err(malformed());
            }
            let key = rest[..key_end].to_ascii_lowercase();
            rest = rest[key_end..].trim_start();

            let value = match rest.strip_prefix('=') {
                Some(after_eq) => {
                    let after_eq = after_eq.trim_start();
                    let (value, remaining) = match after_eq.chars().next() {
                        Some(q @ ('"' | '\'')) => {
                            let body = &after_eq[1..];
                            let close = body.find(q).ok_or_else(malformed)?;
                            (&body[..close], &body[close + 1..])
                        }
                        _ => {
                            let end = after_eq
                                .find(char::is_whitespace)
                                .unwrap_or(after_eq.len());
                            (&after_eq[..end], &after_eq[end..])
                        }
                    };
                    rest = remaining.trim_start();
                    decode_entities(value)
                }
                None => String::new(),
            };
            attrs.push((key, value));
        }

        Ok(Self {
            name,
            attrs,
            self_closing,
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    fn is_void(&self) -> bool {
        self.self_closing
            || matches!(
                self.name.as_str(),
                "br" | "img" | "hr" | "input" | "meta" | "link" | "wbr" | "area" | "col"
            )
    }
}

/// Parsed content before tag ids are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MarkupNode {
    Text(String),
    Tag { id: Option<TagId>, label: String },
    LineBreak,
    Caret,
}

#[derive(Debug)]
enum FrameKind {
    Tag { id: Option<TagId>, label: String },
    Caret { mark: usize },
    Transparent,
}

#[derive(Debug)]
struct Frame {
    name: String,
    kind: FrameKind,
}

#[derive(Debug, Default)]
struct TreeBuilder {
    out: Vec<MarkupNode>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn label_mut(&mut self) -> Option<&mut String> {
        self.stack.iter_mut().rev().find_map(|frame| match &mut frame.kind {
            FrameKind::Tag { label, .. } => Some(label),
            _ => None,
        })
    }

    fn text(&mut self, s: &str) {
        if let Some(label) = self.label_mut() {
            label.push_str(s);
            return;
        }
        for (i, fragment) in s.split('\n').enumerate() {
            if i > 0 {
                self.out.push(MarkupNode::LineBreak);
            }
            let fragment = fragment.strip_suffix('\r').unwrap_or(fragment);
            if fragment.is_empty() {
                continue;
            }
            match self.out.last_mut() {
                Some(MarkupNode::Text(prev)) => prev.push_str(fragment),
                _ => self.out.push(MarkupNode::Text(fragment.to_string())),
            }
        }
    }

    fn line_break(&mut self) {
        if self.label_mut().is_none() {
            self.out.push(MarkupNode::LineBreak);
        }
    }

    fn open(&mut self, element: Element) {
        if element.name == "br" {
            self.line_break();
            return;
        }
        if element.is_void() {
            return;
        }

        let kind = match element.name.as_str() {
            "span" if element.has_class("tag") => FrameKind::Tag {
                id: element.attr("id").and_then(TagId::parse),
                label: String::new(),
            },
            "span" if element.attr("data-caret").is_some() => FrameKind::Caret {
                mark: self.out.len(),
            },
            "div" | "p" => {
                // Block children start a new line.
                if !matches!(self.out.last(), None | Some(MarkupNode::LineBreak)) {
                    self.line_break();
                }
                FrameKind::Transparent
            }
            _ => FrameKind::Transparent,
        };
        self.stack.push(Frame {
            name: element.name,
            kind,
        });
    }

    fn close(&mut self, name: &str, offset: usize) -> Result<(), MarkupError> {
        let name = name.to_ascii_lowercase();
        let frame = match self.stack.pop() {
            Some(frame) if frame.name == name => frame,
            _ => return Err(MarkupError::UnexpectedClose { name, offset }),
        };
        match frame.kind {
            FrameKind::Tag { id, label } => {
                // A tag nested in another tag's label flattens into it.
                if let Some(outer) = self.label_mut() {
                    outer.push_str(&label);
                } else {
                    self.out.push(MarkupNode::Tag { id, label });
                }
            }
            FrameKind::Caret { mark } if self.out.len() == mark => {
                if self.label_mut().is_none() {
                    self.out.push(MarkupNode::Caret);
                }
            }
            FrameKind::Caret { .. } | FrameKind::Transparent => {}
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<MarkupNode>, MarkupError> {
        match self.stack.pop() {
            Some(frame) => Err(MarkupError::Unclosed { name: frame.name }),
            None => Ok(self.out),
        }
    }
}

fn parse_tree(input: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut builder = TreeBuilder::default();
    for (token, span) in Token::lexer(input).spanned() {
        let token = token.map_err(|_| MarkupError::UnexpectedInput { offset: span.start })?;
        match token {
            Token::OpenTag(raw) => builder.open(Element::parse(raw, span.start)?),
            Token::CloseTag(name) => builder.close(name, span.start)?,
            Token::Entity(raw) => match decode_entity(raw) {
                Some(c) => builder.text(c.encode_utf8(&mut [0; 4])),
                None => builder.text(raw),
            },
            Token::Ampersand => builder.text("&"),
            Token::Text(text) => builder.text(text),
        }
    }
    builder.finish()
}

/// Parse markup into document nodes.
///
/// Tags keep the id from their `tag-N` element id. Tags with a missing or
/// duplicate id get fresh ids numbered past the highest one present. An id of
/// `u64::MAX` has no successor and counts as missing.
pub fn parse_markup(input: &str) -> Result<Vec<Node>, MarkupError> {
    let tree = parse_tree(input)?;

    let mut next = tree
        .iter()
        .filter_map(|node| match node {
            MarkupNode::Tag { id: Some(id), .. } => id.0.checked_add(1),
            _ => None,
        })
        .max()
        .unwrap_or(0);
    let mut seen = HashSet::new();

    let nodes = tree
        .into_iter()
        .map(|node| match node {
            MarkupNode::Text(content) => Node::Text { content },
            MarkupNode::LineBreak => Node::LineBreak,
            MarkupNode::Caret => Node::Placeholder,
            MarkupNode::Tag { id, label } => {
                let id = match id {
                    Some(id) if id.0 < u64::MAX && seen.insert(id) => id,
                    _ => {
                        let id = TagId(next);
                        next = next.saturating_add(1);
                        seen.insert(id);
                        id
                    }
                };
                Node::tag(id, label)
            }
        })
        .collect();

    tracing::trace!(target: "pretag::markup", len = input.len(), "parsed markup");
    Ok(nodes)
}

/// Serialize a document.
pub fn render_markup(doc: &Document, mode: MarkupMode) -> String {
    let mut out = String::new();
    for (id, node) in doc.nodes() {
        let node_attr = match mode {
            MarkupMode::Host => format!(r#" data-node-id="{id}""#),
            MarkupMode::Persisted => String::new(),
        };
        match node {
            Node::Text { content } => match mode {
                MarkupMode::Host => out.push_str(&format!(
                    "<span{node_attr}>{}</span>",
                    escape_html(content)
                )),
                MarkupMode::Persisted => out.push_str(&escape_html(content)),
            },
            Node::Tag(tag) => out.push_str(&format!(
                r#"<span class="tag" id="{}" contenteditable="false"{node_attr}>{}</span>"#,
                tag.id,
                escape_html(&tag.label)
            )),
            Node::LineBreak => out.push_str(&format!("<br{node_attr}>")),
            Node::Placeholder => {
                if mode == MarkupMode::Host {
                    out.push_str(&format!(r#"<span data-caret=""{node_attr}></span>"#));
                }
            }
        }
    }
    out
}

/// Strip transient host attributes and caret helpers from any host markup.
pub fn clean_markup(raw: &str) -> Result<String, MarkupError> {
    let nodes = parse_markup(raw)?;
    Ok(render_markup(
        &Document::from_nodes(nodes),
        MarkupMode::Persisted,
    ))
}

impl Document {
    /// Build a document from plain text, one line break per line boundary.
    pub fn from_plain(text: &str) -> Self {
        let lines = Node::lines(text)
            .into_iter()
            .filter(|node| node.as_text() != Some(""));
        let mut doc = Document::from_nodes(lines);
        doc.normalize();
        doc
    }

    /// Build the initial document for a surface.
    ///
    /// Non-empty `markup` wins over `default_value`. The first occurrence of
    /// `fixed_text` is removed from whichever source is used. Markup that
    /// fails to parse is hydrated as plain text instead.
    pub fn hydrate(markup: &str, default_value: &str, fixed_text: &str) -> Self {
        let strip = |s: &str| {
            if fixed_text.is_empty() {
                s.to_string()
            } else {
                s.replacen(fixed_text, "", 1)
            }
        };

        if markup.is_empty() {
            return Self::from_plain(&strip(default_value));
        }

        let source = strip(markup);
        match parse_markup(&source) {
            Ok(nodes) => Document::from_nodes(nodes),
            Err(err) => {
                tracing::warn!(
                    target: "pretag::markup",
                    error = %err,
                    "markup did not parse, hydrating as plain text"
                );
                Self::from_plain(&source)
            }
        }
    }
}
