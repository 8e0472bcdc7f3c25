//! Structural scanner for wikitext.
//!
//! One left-to-right pass over the text producing a flat list of matched
//! [`Span`]s for every template, parameter, brace, link, wiki-link, escape
//! region and comment. Nothing is built into a tree: consumers work from the
//! spans and the original text.
//!
//! Open delimiters of every family share one work stack. A closing token
//! removes the *nearest* open entry of its own family, leaving any entries
//! above it in place. This lets a stray `[` inside a template not block the
//! template from closing, at the cost that spans may overlap instead of
//! nesting when closers arrive out of order (`{{a[b}}]` yields a template
//! `0..7` and a link `3..8`). Consumers rely on this, so keep it.

use lazy_regex::regex;
use serde::{Deserialize, Serialize};

use crate::wikitext::enums::SpanKind;

const ESCAPE_OPEN: &[u8] = b"<nowiki>";
const COMMENT_OPEN: &[u8] = b"<!--";
const COMMENT_CLOSE: &str = "-->";

/// Open tokens, longest first within each family.
const OPENERS: [(&[u8], SpanKind); 5] = [
    (b"{{{", SpanKind::Parameter),
    (b"{{", SpanKind::Template),
    (b"{", SpanKind::Brace),
    (b"[[", SpanKind::WikiLink),
    (b"[", SpanKind::Link),
];

/// Close tokens, longest first. A token that finds no open entry of its
/// family falls through to the next shorter one.
const CLOSERS: [(&[u8], SpanKind); 5] = [
    (b"}}}", SpanKind::Parameter),
    (b"}}", SpanKind::Template),
    (b"}", SpanKind::Brace),
    (b"]]", SpanKind::WikiLink),
    (b"]", SpanKind::Link),
];

/// A matched region of one delimiter family. `end` is exclusive and points
/// just past the closing delimiter. Offsets are byte offsets into the text
/// that was scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        debug_assert!(start < end, "Span start must be < end");
        Self { kind, start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// `start <= pos < end`
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }

    /// `start < pos < end`: the position is past the opening delimiter's
    /// first byte.
    #[inline]
    pub fn strictly_contains(&self, pos: usize) -> bool {
        self.start < pos && pos < self.end
    }

    /// The full source text of the span, delimiters included.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }

    /// The text between the delimiters.
    pub fn inner<'a>(&self, text: &'a str) -> &'a str {
        let (open, close) = delimiter_lens(self.kind);
        let from = self.start + open;
        let to = self.end.saturating_sub(close).max(from);
        &text[from..to]
    }
}

/// Byte lengths of the (open, close) delimiters of each family.
fn delimiter_lens(kind: SpanKind) -> (usize, usize) {
    match kind {
        SpanKind::Parameter => (3, 3),
        SpanKind::Template | SpanKind::WikiLink => (2, 2),
        SpanKind::Brace | SpanKind::Link => (1, 1),
        SpanKind::Escape => (ESCAPE_OPEN.len(), ESCAPE_OPEN.len() + 1),
        SpanKind::Comment => (COMMENT_OPEN.len(), COMMENT_CLOSE.len()),
    }
}

/// An open, not yet closed construct on the work stack.
///
/// Opaque kinds never appear here: escape regions and comments are resolved
/// on the spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEntry {
    Template(usize),
    Parameter(usize),
    Brace(usize),
    WikiLink(usize),
    Link(usize),
}

impl StackEntry {
    /// Build the entry for `kind` opened at `start`; `None` for opaque kinds.
    pub fn open(kind: SpanKind, start: usize) -> Option<Self> {
        match kind {
            SpanKind::Template => Some(StackEntry::Template(start)),
            SpanKind::Parameter => Some(StackEntry::Parameter(start)),
            SpanKind::Brace => Some(StackEntry::Brace(start)),
            SpanKind::WikiLink => Some(StackEntry::WikiLink(start)),
            SpanKind::Link => Some(StackEntry::Link(start)),
            SpanKind::Escape | SpanKind::Comment => None,
        }
    }

    pub fn kind(&self) -> SpanKind {
        match self {
            StackEntry::Template(_) => SpanKind::Template,
            StackEntry::Parameter(_) => SpanKind::Parameter,
            StackEntry::Brace(_) => SpanKind::Brace,
            StackEntry::WikiLink(_) => SpanKind::WikiLink,
            StackEntry::Link(_) => SpanKind::Link,
        }
    }

    pub fn start(&self) -> usize {
        match *self {
            StackEntry::Template(s)
            | StackEntry::Parameter(s)
            | StackEntry::Brace(s)
            | StackEntry::WikiLink(s)
            | StackEntry::Link(s) => s,
        }
    }
}

/// Mixed-kind LIFO stack with "find and remove nearest of kind".
#[derive(Debug, Default)]
pub struct OpenStack {
    entries: Vec<StackEntry>,
}

impl OpenStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    /// Remove the most recently opened entry of `kind` and return its start.
    /// Entries opened after it stay where they are.
    pub fn take_nearest(&mut self, kind: SpanKind) -> Option<usize> {
        let idx = self.entries.iter().rposition(|e| e.kind() == kind)?;
        Some(self.entries.remove(idx).start())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still open, bottom of the stack first.
    pub fn remaining(&self) -> &[StackEntry] {
        &self.entries
    }
}

/// Case-insensitive ASCII prefix test at `pos`.
fn starts_with_at(bytes: &[u8], pos: usize, token: &[u8]) -> bool {
    bytes
        .get(pos..pos + token.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(token))
}

/// Find the end (exclusive) of the opaque region opened at `pos`.
fn opaque_end(text: &str, kind: SpanKind, pos: usize) -> Option<usize> {
    let (open, _) = delimiter_lens(kind);
    let from = pos + open;
    match kind {
        SpanKind::Escape => regex!(r"(?i)</nowiki>")
            .find_at(text, from)
            .map(|m| m.end()),
        SpanKind::Comment => text[from..]
            .find(COMMENT_CLOSE)
            .map(|rel| from + rel + COMMENT_CLOSE.len()),
        _ => None,
    }
}

/// What one [`Scanner::step`] consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A complete escape region or comment.
    Opaque,
    /// An escape or comment open tag that never closes; only the tag is consumed.
    UnclosedOpaque,
    Open,
    /// A closer that matched an open entry.
    Close,
    /// One byte that opens or closes nothing.
    Plain,
}

/// Incremental form of [`scan`]: one token per [`step`](Scanner::step), so a
/// caller can stop as soon as it has seen enough of the text.
#[derive(Debug)]
pub struct Scanner<'t> {
    text: &'t str,
    pos: usize,
    stack: OpenStack,
    spans: Vec<Span>,
}

impl<'t> Scanner<'t> {
    pub fn new(text: &'t str, start_offset: usize) -> Self {
        Self {
            text,
            pos: start_offset,
            stack: OpenStack::new(),
            spans: Vec::new(),
        }
    }

    /// Offset of the next token, `None` once the text is exhausted.
    pub fn position(&self) -> Option<usize> {
        (self.pos < self.text.len()).then_some(self.pos)
    }

    /// Constructs opened and not yet closed.
    pub fn open_count(&self) -> usize {
        self.stack.len()
    }

    /// Consume the token at the current position.
    pub fn step(&mut self) -> Token {
        let bytes = self.text.as_bytes();
        let i = self.pos;
        if i >= bytes.len() {
            return Token::Plain;
        }

        // opaque regions first: their interior is never tokenized
        for (token, kind) in [
            (ESCAPE_OPEN, SpanKind::Escape),
            (COMMENT_OPEN, SpanKind::Comment),
        ] {
            if starts_with_at(bytes, i, token) {
                return match opaque_end(self.text, kind, i) {
                    Some(end) => {
                        self.spans.push(Span::new(kind, i, end));
                        self.pos = end;
                        Token::Opaque
                    }
                    None => {
                        log::debug!("unclosed {} region at {}", kind, i);
                        self.pos = i + token.len();
                        Token::UnclosedOpaque
                    }
                };
            }
        }

        match bytes[i] {
            b'{' | b'[' => {
                for (token, kind) in OPENERS {
                    if bytes[i..].starts_with(token) {
                        if let Some(entry) = StackEntry::open(kind, i) {
                            self.stack.push(entry);
                        }
                        self.pos = i + token.len();
                        return Token::Open;
                    }
                }
            }
            b'}' | b']' => {
                for (token, kind) in CLOSERS {
                    if bytes[i..].starts_with(token)
                        && let Some(start) = self.stack.take_nearest(kind)
                    {
                        let end = i + token.len();
                        log::trace!("closed {} {}..{}", kind, start, end);
                        self.spans.push(Span::new(kind, start, end));
                        self.pos = end;
                        return Token::Close;
                    }
                }
            }
            _ => {}
        }
        self.pos = i + 1;
        Token::Plain
    }

    /// Spans matched so far, sorted by start. Entries still open are dropped.
    pub fn finish(self) -> Vec<Span> {
        for entry in self.stack.remaining() {
            log::debug!("discarding unclosed {} at {}", entry.kind(), entry.start());
        }
        let mut spans = self.spans;
        spans.sort_by_key(|s| s.start);
        spans
    }
}

/// Scan `text` from `start_offset` and return every matched span, sorted by
/// start. Constructs opened before `start_offset` are invisible to the scan,
/// so their closers match nothing. Constructs still open at the end of the
/// text produce no span.
pub fn scan(text: &str, start_offset: usize) -> Vec<Span> {
    let mut scanner = Scanner::new(text, start_offset);
    while scanner.position().is_some() {
        scanner.step();
    }
    scanner.finish()
}

/// All spans of `kind` in `text`, in start order.
pub fn spans_of_kind(text: &str, kind: SpanKind) -> Vec<Span> {
    scan(text, 0).into_iter().filter(|s| s.kind == kind).collect()
}

/// Remove every `<!-- ... -->` region from `text`.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    for span in spans_of_kind(text, SpanKind::Comment) {
        out.push_str(&text[last..span.start]);
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(spans: &[Span]) -> Vec<SpanKind> {
        spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn single_template() {
        let s = "hello {{t|x}}";
        let spans = scan(s, 0);
        assert_eq!(spans, vec![Span::new(SpanKind::Template, 6, 13)]);
        assert_eq!(spans[0].slice(s), "{{t|x}}");
        assert_eq!(spans[0].inner(s), "t|x");
    }

    #[test]
    fn nested_templates_sorted_by_start() {
        let s = "{{a|{{b}}|{{c|{{d}}}}}}";
        let spans = scan(s, 0);
        let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 4, 10, 14]);
        assert_eq!(spans[0].slice(s), s);
        assert_eq!(spans[2].slice(s), "{{c|{{d}}}}");
        assert_eq!(spans[3].slice(s), "{{d}}");
    }

    #[test]
    fn every_family_is_recognised() {
        let s = "{{{p}}} {b} [[w]] [http://x y] <!--c--> <nowiki>n</nowiki> {{t}}";
        let spans = scan(s, 0);
        assert_eq!(
            kinds(&spans),
            vec![
                SpanKind::Parameter,
                SpanKind::Brace,
                SpanKind::WikiLink,
                SpanKind::Link,
                SpanKind::Comment,
                SpanKind::Escape,
                SpanKind::Template,
            ]
        );
        assert_eq!(spans[4].slice(s), "<!--c-->");
        assert_eq!(spans[5].slice(s), "<nowiki>n</nowiki>");
        assert_eq!(spans[5].inner(s), "n");
        assert_eq!(spans[4].inner(s), "c");
    }

    #[test]
    fn opaque_regions_hide_their_content() {
        let s = "<nowiki>{{not a template}}</nowiki> <!-- [[nor a link]] -->";
        let spans = scan(s, 0);
        assert_eq!(kinds(&spans), vec![SpanKind::Escape, SpanKind::Comment]);
    }

    #[test]
    fn escape_tag_is_case_insensitive() {
        let s = "<NoWiki>{{x}}</NOWIKI>";
        let spans = scan(s, 0);
        assert_eq!(spans, vec![Span::new(SpanKind::Escape, 0, s.len())]);
    }

    #[test]
    fn unclosed_opaque_region_is_skipped_over() {
        let s = "<!-- {{t}}";
        let spans = scan(s, 0);
        assert_eq!(spans, vec![Span::new(SpanKind::Template, 5, 10)]);
    }

    #[test]
    fn close_skips_unrelated_open_entries() {
        // the stray `[` never closes but the template still does
        let s = "{{t|[x}}";
        let spans = scan(s, 0);
        assert_eq!(spans, vec![Span::new(SpanKind::Template, 0, 8)]);
    }

    #[test]
    fn out_of_order_closers_overlap() {
        let s = "{{a[b}}]";
        let spans = scan(s, 0);
        assert_eq!(
            spans,
            vec![
                Span::new(SpanKind::Template, 0, 7),
                Span::new(SpanKind::Link, 3, 8),
            ]
        );
    }

    #[test]
    fn triple_close_falls_back_to_template() {
        let s = "{{t|{{x}}}}";
        let spans = scan(s, 0);
        assert_eq!(
            spans,
            vec![
                Span::new(SpanKind::Template, 0, 11),
                Span::new(SpanKind::Template, 4, 9),
            ]
        );
    }

    #[test]
    fn longest_closer_wins_over_inner_brace() {
        // `}}` is tried before `}`, so the template closes first
        let s = "{{t|a{b}}}";
        let spans = scan(s, 0);
        assert_eq!(
            spans,
            vec![
                Span::new(SpanKind::Template, 0, 9),
                Span::new(SpanKind::Brace, 5, 10),
            ]
        );
    }

    #[test]
    fn unclosed_constructs_produce_nothing() {
        assert!(scan("{{t|unterminated", 0).is_empty());
        assert!(scan("[[a [b {c", 0).is_empty());
        assert!(scan("}} ]] }", 0).is_empty());
        assert!(scan("", 0).is_empty());
    }

    #[test]
    fn start_offset_hides_earlier_openers() {
        let s = "{{t|{{x}}|y}}";
        let spans = scan(s, 3);
        assert_eq!(spans, vec![Span::new(SpanKind::Template, 4, 9)]);
        assert!(scan(s, 100).is_empty());
    }

    #[test]
    fn offsets_are_bytes_with_multibyte_text() {
        let s = "é{{ü}}";
        let spans = scan(s, 0);
        assert_eq!(spans, vec![Span::new(SpanKind::Template, 2, 8)]);
        assert_eq!(spans[0].inner(s), "ü");
    }

    #[test]
    fn take_nearest_leaves_entries_above() {
        let mut stack = OpenStack::new();
        stack.push(StackEntry::Template(0));
        stack.push(StackEntry::Link(3));
        stack.push(StackEntry::Brace(5));
        assert_eq!(stack.take_nearest(SpanKind::Template), Some(0));
        assert_eq!(
            stack.remaining(),
            &[StackEntry::Link(3), StackEntry::Brace(5)]
        );
        assert_eq!(stack.take_nearest(SpanKind::WikiLink), None);
        assert_eq!(stack.len(), 2);
        assert!(StackEntry::open(SpanKind::Comment, 1).is_none());
    }

    #[test]
    fn stepper_reports_tokens() {
        let s = "{{a}}<!--c-->x]<!--";
        let mut scanner = Scanner::new(s, 0);
        let mut tokens = Vec::new();
        while let Some(pos) = scanner.position() {
            let open = scanner.open_count();
            tokens.push((pos, open, scanner.step()));
        }
        assert_eq!(
            tokens,
            vec![
                (0, 0, Token::Open),
                (2, 1, Token::Plain),
                (3, 1, Token::Close),
                (5, 0, Token::Opaque),
                (13, 0, Token::Plain),
                (14, 0, Token::Plain),
                (15, 0, Token::UnclosedOpaque),
            ]
        );
        assert_eq!(
            scanner.finish(),
            vec![
                Span::new(SpanKind::Template, 0, 5),
                Span::new(SpanKind::Comment, 5, 13),
            ]
        );
    }

    #[test]
    fn strip_comments_removes_only_comments() {
        let s = "a<!-- x -->b<nowiki><!--</nowiki>c";
        assert_eq!(strip_comments(s), "ab<nowiki><!--</nowiki>c");
        assert_eq!(strip_comments("plain"), "plain");
    }

    #[test]
    fn spans_of_kind_filters() {
        let s = "[[a]] [b] [[c]]";
        let links = spans_of_kind(s, SpanKind::WikiLink);
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].inner(s), "c");
    }
}
