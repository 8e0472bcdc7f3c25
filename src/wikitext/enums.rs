//! Enums used by the wikitext module.
//!
//! This module defines the small enum types referenced by other submodules:
//! - `SpanKind`: which delimiter family a scanned span belongs to.
//! - `Layout`: how a template invocation is serialised.
//!
//! Each type implements `Debug`, `Clone`, `PartialEq`, `Eq` and `Display`. They
//! also implement `FromStr` to allow convenient parsing from textual form in
//! tests or on the command line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The delimiter family of a scanned span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanKind {
    /// `{{...}}`
    Template,
    /// `{{{...}}}`
    Parameter,
    /// `{...}`
    Brace,
    /// `[[...]]`
    WikiLink,
    /// `[...]`
    Link,
    /// `<nowiki>...</nowiki>`
    Escape,
    /// `<!--...-->`
    Comment,
}

impl SpanKind {
    /// Opaque spans are skipped atomically by the scanner; nothing inside them is tokenized.
    pub fn is_opaque(self) -> bool {
        matches!(self, SpanKind::Escape | SpanKind::Comment)
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanKind::Template => write!(f, "Template"),
            SpanKind::Parameter => write!(f, "Parameter"),
            SpanKind::Brace => write!(f, "Brace"),
            SpanKind::WikiLink => write!(f, "WikiLink"),
            SpanKind::Link => write!(f, "Link"),
            SpanKind::Escape => write!(f, "Escape"),
            SpanKind::Comment => write!(f, "Comment"),
        }
    }
}

impl FromStr for SpanKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "template" | "tpl" | "t" => Ok(SpanKind::Template),
            "parameter" | "param" | "p" => Ok(SpanKind::Parameter),
            "brace" | "b" => Ok(SpanKind::Brace),
            "wikilink" | "internal" | "w" => Ok(SpanKind::WikiLink),
            "link" | "external" | "l" => Ok(SpanKind::Link),
            "escape" | "nowiki" | "e" => Ok(SpanKind::Escape),
            "comment" | "c" => Ok(SpanKind::Comment),
            other => Err(format!("unknown SpanKind '{}'", other)),
        }
    }
}

/// Serialisation layout for a template invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// `{{Name|a|key=value}}`
    #[default]
    Compact,
    /// One argument per line, closing braces on their own line.
    Multiline,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Compact => write!(f, "Compact"),
            Layout::Multiline => write!(f, "Multiline"),
        }
    }
}

impl FromStr for Layout {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" | "inline" | "c" => Ok(Layout::Compact),
            "multiline" | "multi" | "lines" | "m" => Ok(Layout::Multiline),
            other => Err(format!("unknown Layout '{}'", other)),
        }
    }
}
