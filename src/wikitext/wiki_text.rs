//! `WikiText`: one owned text buffer plus a lazily computed span list.
//!
//! This module implements the small per-page API:
//! - `WikiText::new(input)` (no work done up front)
//! - `spans()` (scanned once, cached in a `OnceLock`)
//! - `templates(name)`, `template_arguments(name, ignore_named)`
//! - `tables()`, `inner_links()`, `external_links()`, `redirect()`
//! - `page_name` getter/setter and `text()` accessor
//!
//! The cache lives as long as the value; nothing is shared between buffers.

use std::sync::OnceLock;

use crate::wikitext::arguments::TemplateArguments;
use crate::wikitext::enums::SpanKind;
use crate::wikitext::errors::Result;
use crate::wikitext::scanner::{Span, scan};
use crate::wikitext::types::links::{self, ExternalLink, WikiLink};
use crate::wikitext::types::table::{self, Table};
use crate::wikitext::types::templates;

#[derive(Debug, Clone, Default)]
pub struct WikiText {
    text: String,
    page_name: Option<String>,
    spans: OnceLock<Vec<Span>>,
}

impl WikiText {
    pub fn new<S: Into<String>>(input: S) -> Self {
        Self {
            text: input.into(),
            page_name: None,
            spans: OnceLock::new(),
        }
    }

    /// Every span of the buffer, sorted by start. Scans on first access.
    pub fn spans(&self) -> &[Span] {
        self.spans.get_or_init(|| {
            let spans = scan(&self.text, 0);
            log::trace!(
                "scanned {} bytes of {:?} into {} spans",
                self.text.len(),
                self.page_name,
                spans.len()
            );
            spans
        })
    }

    pub fn spans_of_kind(&self, kind: SpanKind) -> impl Iterator<Item = &Span> {
        self.spans().iter().filter(move |s| s.kind == kind)
    }

    /// Raw text of every invocation of `name`.
    pub fn templates(&self, name: &str) -> Vec<String> {
        templates::find_all_in(&self.text, self.spans(), name)
    }

    /// First invocation of `name`, or why there is none.
    pub fn template(&self, name: &str) -> Result<String> {
        templates::find_first_in(&self.text, self.spans(), name)
    }

    /// Arguments of every invocation of `name`.
    pub fn template_arguments(&self, name: &str, ignore_named: bool) -> Vec<TemplateArguments> {
        self.templates(name)
            .iter()
            .map(|t| templates::parse_arguments(t, ignore_named))
            .collect()
    }

    pub fn tables(&self) -> Vec<Table> {
        table::parse_in(&self.text, self.spans())
    }

    pub fn inner_links(&self) -> Vec<WikiLink> {
        links::inner_links_in(&self.text, self.spans())
    }

    pub fn external_links(&self) -> Vec<ExternalLink> {
        links::external_links_in(&self.text, self.spans())
    }

    pub fn redirect(&self) -> Option<String> {
        links::redirect_target(&self.text)
    }

    pub fn page_name(&self) -> Option<&str> {
        self.page_name.as_deref()
    }

    /// Set the optional page name. Accepts `None` to clear it.
    pub fn set_page_name<S: Into<String>>(&mut self, page_name: Option<S>) {
        self.page_name = page_name.map(|s| s.into());
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Take the buffer back, dropping the cache.
    pub fn into_text(self) -> String {
        self.text
    }
}

impl From<String> for WikiText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for WikiText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
