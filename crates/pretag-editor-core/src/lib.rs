//! pretag-editor-core: editing engine for text mixed with atomic tag tokens.
//!
//! This crate provides:
//! - `Document` - arena of text runs, tag tokens, line breaks and caret anchors
//! - `SelectionBridge` trait for reading and writing the host surface's selection
//! - Mutation operations (insert tag/text, paste, enter, tag-aware delete, ...)
//! - Plain-text and markup projections, plus a markup codec for hydration
//! - `TagEditor<B, L>` - ties the pieces together, one input event at a time
//!
//! Nothing here depends on a UI framework. Hosts render the document from
//! `TagEditor::host_markup` and report selections in terms of `NodeId`s.

pub mod actions;
pub mod config;
pub mod cursor;
pub mod document;
pub mod editor;
pub mod error;
pub mod events;
pub mod execute;
pub mod markup;
pub mod platform;
pub mod projection;
pub mod types;

pub use actions::{DeleteDirection, EditorAction, Key, KeyCombo, Modifiers};
pub use config::EditorConfig;
pub use cursor::{
    current_selection, place_caret, place_caret_after, range_for_click, resolve_selection,
    select_document,
};
pub use document::Document;
pub use editor::{EditorListener, EventResult, TagEditor, hydrate_document};
pub use error::{ConfigError, MarkupError};
pub use events::{Dispatch, InputEvent, classify};
pub use execute::{CaretUpdate, DeleteState, Edit, classify_delete, execute_action};
pub use markup::{MarkupMode, clean_markup, escape_html, parse_markup, render_markup};
pub use platform::{ClickTarget, HeadlessBridge, HostSelection, PlatformError, SelectionBridge};
pub use projection::{Projection, clean_text, plain_text, project};
pub use smol_str::SmolStr;
pub use types::{Boundary, Node, NodeId, Position, Range, Selection, TagId, TagToken};
