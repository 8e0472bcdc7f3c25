//! Wikitext module root
//!
//! Declares and re-exports the submodules of the structural scanner and the
//! extractors built on top of it.
//!
//! Implementation details live in submodules; callers can `use wikitext::...`
//! for the commonly used items.

pub mod arguments;
pub mod enums;
pub mod errors;
pub mod scanner;
pub mod search;
pub mod types;
pub mod wiki_text;

// Re-export commonly used types for ergonomic access.
pub use arguments::TemplateArguments;
pub use enums::{Layout, SpanKind};
pub use errors::{Result, WtError};
pub use scanner::{Span, scan};
pub use search::find_next;
pub use types::links::{ExternalLink, WikiLink};
pub use types::table::{Row, Table, TableLayout, TableLayoutBuilder};

pub use wiki_text::WikiText;
