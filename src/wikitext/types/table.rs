//! Table parsing and rendering.
//!
//! A table is the `{| ... |}` region. The first line after `{|` is the table
//! style (its attributes), an optional `|+` line is the caption, rows are
//! separated by `|-` lines, header rows start with `!` and split on `!!` or a
//! new `!` line, data rows start with `|` and split on `||` or a new `|` line.
//! All splitting is nesting-aware, so a `|` inside `[[A|B]]` or `{{x|y}}` stays
//! in its cell.

use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::wikitext::errors::{Result, WtError};
use crate::wikitext::scanner::{Span, scan};
use crate::wikitext::search::{SpanCursor, find_next};

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
    pub style: Option<String>,
    pub is_header: bool,
}

impl Row {
    pub fn data<S: Into<String>>(cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            style: None,
            is_header: false,
        }
    }

    pub fn header<S: Into<String>>(cells: impl IntoIterator<Item = S>) -> Self {
        Self {
            is_header: true,
            ..Self::data(cells)
        }
    }

    pub fn with_style<S: Into<String>>(mut self, style: S) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A parsed table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    /// The whole `{| ... |}` source.
    pub raw_text: String,
    /// Attributes on the `{|` line, trimmed.
    pub style: String,
    pub caption: Option<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Cells of the first header row, empty when the table has none.
    pub fn headers(&self) -> Vec<&str> {
        self.rows
            .iter()
            .find(|r| r.is_header)
            .map(|r| r.cells.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| !r.is_header)
    }

    /// Cells of one column across all data rows. `column` is a header name
    /// (case-insensitive) or a 0-based index. Rows too short for the column
    /// give `""`.
    pub fn column(&self, column: &str) -> Result<Vec<&str>> {
        let headers = self.headers();
        let idx = match headers.iter().position(|h| h.eq_ignore_ascii_case(column)) {
            Some(i) => i,
            None => column
                .parse::<usize>()
                .map_err(|_| WtError::not_found(format!("column '{}'", column)))?,
        };
        let width = self
            .rows
            .iter()
            .map(|r| r.cells.len())
            .max()
            .unwrap_or(0);
        if idx >= width {
            return Err(WtError::index_oob(idx, width));
        }
        Ok(self
            .data_rows()
            .map(|r| r.cells.get(idx).map(String::as_str).unwrap_or(""))
            .collect())
    }

    /// Render this table again from its parsed parts.
    pub fn to_wikitext(&self) -> String {
        let layout = TableLayout {
            class: None,
            sortable: false,
            attributes: (!self.style.is_empty()).then(|| self.style.clone()),
            caption: self.caption.clone(),
        };
        build_styled(&layout, &self.rows)
    }
}

/// Rendering options for [`build_styled`].
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct TableLayout {
    /// CSS class; `wikitable` unless changed.
    #[builder(setter(into, strip_option))]
    pub class: Option<String>,
    pub sortable: bool,
    /// Extra raw attributes written after the class.
    #[builder(setter(into, strip_option))]
    pub attributes: Option<String>,
    #[builder(setter(into, strip_option))]
    pub caption: Option<String>,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            class: Some("wikitable".to_string()),
            sortable: false,
            attributes: None,
            caption: None,
        }
    }
}

impl TableLayout {
    /// The attribute text that follows `{|`.
    fn opening_attributes(&self) -> String {
        let class = match (&self.class, self.sortable) {
            (Some(c), true) => Some(format!("class=\"{} sortable\"", c)),
            (Some(c), false) => Some(format!("class=\"{}\"", c)),
            (None, true) => Some("class=\"sortable\"".to_string()),
            (None, false) => None,
        };
        class
            .into_iter()
            .chain(self.attributes.iter().cloned())
            .join(" ")
    }
}

/// Every top-level table in `text`, in document order.
///
/// Tables inside templates are skipped, tables inside a table stay in the
/// outer table's cells. An unclosed table ends the search.
pub fn parse(text: &str) -> Vec<Table> {
    parse_in(text, &scan(text, 0))
}

/// [`parse`] over spans the caller already has for `text`.
pub fn parse_in(text: &str, spans: &[Span]) -> Vec<Table> {
    let mut openers = SpanCursor::new(text, spans, 0, false);
    let mut tables = Vec::new();
    let mut from = 0usize;
    while let Some(open) = openers.next_match(from, "{|") {
        match find_next(text, open + 2, "|}", false) {
            Some(close) => {
                let end = close + 2;
                tables.push(parse_region(&text[open..end]));
                from = end;
            }
            None => {
                log::warn!("{}", WtError::parse_at("unclosed table", open));
                break;
            }
        }
    }
    tables
}

/// Parse one `{| ... |}` region.
fn parse_region(raw: &str) -> Table {
    let inner = &raw[2..raw.len() - 2];
    let (style_line, rest) = match inner.find('\n') {
        Some(nl) => (&inner[..nl], &inner[nl..]),
        None => (inner, ""),
    };

    let mut chunks = split_on_any(rest, &["\n|-"]).into_iter();
    let mut caption = None;
    let mut rows = Vec::new();

    if let Some(prelude) = chunks.next() {
        let mut prelude = prelude.trim_start();
        if let Some(after) = prelude.strip_prefix("|+") {
            let end = after.find('\n').unwrap_or(after.len());
            caption = Some(after[..end].trim().to_string());
            prelude = &after[end..];
        }
        rows.extend(parse_row(prelude, None));
    }

    for chunk in chunks {
        let (attr_line, content) = match chunk.find('\n') {
            Some(nl) => (&chunk[..nl], &chunk[nl..]),
            None => (chunk, ""),
        };
        let attrs = attr_line.trim();
        let style = (!attrs.is_empty()).then(|| attrs.to_string());
        rows.extend(parse_row(content, style));
    }

    Table {
        raw_text: raw.to_string(),
        style: style_line.trim().to_string(),
        caption,
        rows,
    }
}

/// Parse the cell lines of one row. `None` when there are no cells.
fn parse_row(content: &str, style: Option<String>) -> Option<Row> {
    let body = content.trim();
    if body.is_empty() {
        return None;
    }
    let is_header = body.starts_with('!');
    let (marker, seps): (char, &[&str]) = if is_header {
        ('!', &["!!", "\n!"])
    } else {
        ('|', &["||", "\n|"])
    };
    let body = body.strip_prefix(marker).unwrap_or(body);

    let (style, body) = match leading_attribute(body, seps[0]) {
        Some((attr, rest)) => {
            let merged = match style {
                Some(s) => format!("{} {}", s, attr),
                None => attr.to_string(),
            };
            (Some(merged), rest)
        }
        None => (style, body),
    };

    let cells = split_on_any(body, seps)
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    Some(Row {
        cells,
        style,
        is_header,
    })
}

/// Detect `style="x"|cell` at the start of a row: the text before the first
/// top-level `|` is on one line, holds no cell separator, and that `|` is a
/// single one rather than the start of `||`.
fn leading_attribute<'a>(body: &'a str, cell_sep: &str) -> Option<(&'a str, &'a str)> {
    let bar = find_next(body, 0, "|", false)?;
    let head = &body[..bar];
    let rest = &body[bar + 1..];
    if head.contains('\n') || head.contains(cell_sep) || rest.starts_with('|') {
        return None;
    }
    let head = head.trim();
    (!head.is_empty()).then_some((head, rest))
}

/// Split on whichever separator comes first, repeatedly, skipping separators
/// inside nested constructs.
fn split_on_any<'a>(text: &'a str, seps: &[&str]) -> Vec<&'a str> {
    let spans: Vec<Span> = scan(text, 0);
    // one cursor per separator; each only moves forward
    let mut cursors: Vec<SpanCursor> = seps
        .iter()
        .map(|_| SpanCursor::new(text, &spans, 0, false))
        .collect();
    let mut parts = Vec::new();
    let mut last = 0usize;
    let mut pos = 0usize;
    loop {
        let next = cursors
            .iter_mut()
            .zip(seps)
            .filter_map(|(cursor, sep)| cursor.next_match(pos, sep).map(|at| (at, sep.len())))
            .min_by_key(|(at, _)| *at);
        match next {
            Some((at, len)) => {
                parts.push(&text[last..at]);
                last = at + len;
                pos = last;
            }
            None => break,
        }
    }
    parts.push(&text[last..]);
    parts
}

/// Render a plain table: `wikitable` class, one header row, then data rows.
pub fn build<S: AsRef<str>>(headers: &[S], rows: &[Vec<S>], sortable: bool) -> String {
    let layout = TableLayout {
        sortable,
        ..TableLayout::default()
    };
    let mut all = Vec::with_capacity(rows.len() + 1);
    if !headers.is_empty() {
        all.push(Row::header(headers.iter().map(|h| h.as_ref())));
    }
    all.extend(rows.iter().map(|r| Row::data(r.iter().map(|c| c.as_ref()))));
    build_styled(&layout, &all)
}

/// Render rows with their styles and header flags under `layout`.
pub fn build_styled(layout: &TableLayout, rows: &[Row]) -> String {
    let mut out = String::from("{|");
    let attrs = layout.opening_attributes();
    if !attrs.is_empty() {
        out.push(' ');
        out.push_str(&attrs);
    }
    if let Some(caption) = &layout.caption {
        out.push_str("\n|+ ");
        out.push_str(caption);
    }
    for (i, row) in rows.iter().enumerate() {
        // a leading unstyled header row needs no separator
        if i > 0 || !row.is_header || row.style.is_some() {
            out.push_str("\n|-");
            if let Some(style) = &row.style {
                out.push(' ');
                out.push_str(style);
            }
        }
        if row.is_header {
            out.push_str("\n! ");
            out.push_str(&row.cells.join(" !! "));
        } else {
            out.push_str("\n| ");
            out.push_str(&row.cells.join(" || "));
        }
    }
    out.push_str("\n|}");
    out
}
