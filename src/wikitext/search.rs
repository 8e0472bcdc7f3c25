//! Delimiter search on top of the scanner.
//!
//! `find_next` looks for the next occurrence of a target string that is not
//! hidden inside an opaque region (escape/comment) and, unless told to ignore
//! nesting, not inside any other construct either. This is what lets the
//! template and table code split on `|`, `=`, `}}` or `||` without being fooled
//! by the same characters inside a nested template or link.

use crate::wikitext::scanner::{Scanner, Span, Token, scan};

/// Find the next offset `>= start_offset` where `target` occurs outside
/// protected regions.
///
/// Escape and comment spans are always protected. When `ignore_nesting` is
/// false every other span is protected too. A position is protected when it
/// lies strictly inside a span, so a target that begins exactly at a span's
/// opening delimiter still matches.
///
/// The scan stops at the first occurrence that is already known to be
/// unprotected: any occurrence with ignored nesting, or one at top level
/// (nothing open). Only when an earlier occurrence sits under a construct
/// that never closes is the rest of the text scanned.
pub fn find_next(
    text: &str,
    start_offset: usize,
    target: &str,
    ignore_nesting: bool,
) -> Option<usize> {
    if target.is_empty() {
        return (start_offset <= text.len()).then_some(start_offset);
    }
    let bytes = text.as_bytes();
    let needle = target.as_bytes();
    let hit = |p: usize| bytes[p..].starts_with(needle);

    let mut scanner = Scanner::new(text, start_offset);
    // an occurrence under an open construct: protected unless it never closes
    let mut deferred = false;

    while let Some(pos) = scanner.position() {
        let top_level = ignore_nesting || scanner.open_count() == 0;
        let token = scanner.step();
        let end = scanner.position().unwrap_or(bytes.len());

        if hit(pos) {
            if top_level {
                return Some(pos);
            }
            deferred = true;
        }
        // Some(true): interior decided unprotected; Some(false): undecided
        let interior = match token {
            Token::Opaque | Token::Plain => None,
            Token::UnclosedOpaque => Some(top_level),
            Token::Open => Some(ignore_nesting),
            Token::Close => ignore_nesting.then_some(true),
        };
        if let Some(decided) = interior
            && let Some(p) = (pos + 1..end).find(|&p| hit(p))
        {
            if decided {
                return Some(p);
            }
            deferred = true;
        }
    }

    if !deferred {
        return None;
    }
    let spans = scanner.finish();
    find_next_in(text, &spans, start_offset, target, ignore_nesting)
}

/// As [`find_next`], reusing spans already produced by a scan starting at or
/// before `start_offset`.
pub fn find_next_in(
    text: &str,
    spans: &[Span],
    start_offset: usize,
    target: &str,
    ignore_nesting: bool,
) -> Option<usize> {
    SpanCursor::new(text, spans, start_offset, ignore_nesting).next_match(start_offset, target)
}

fn is_protected(span: &Span, ignore_nesting: bool) -> bool {
    span.kind.is_opaque() || !ignore_nesting
}

/// Forward-only search over a fixed span list.
///
/// Successive [`next_match`](SpanCursor::next_match) calls must not move
/// backwards; each one resumes where the previous one stopped, so a whole
/// document is walked once however many matches are asked for.
#[derive(Debug)]
pub struct SpanCursor<'t> {
    bytes: &'t [u8],
    spans: &'t [Span],
    ignore_nesting: bool,
    pos: usize,
    /// first span not yet examined; spans are sorted by start
    next: usize,
    /// furthest end of the protected spans covering `pos`
    covering: Option<usize>,
}

impl<'t> SpanCursor<'t> {
    pub fn new(text: &'t str, spans: &'t [Span], start_offset: usize, ignore_nesting: bool) -> Self {
        let next = spans.partition_point(|s| s.start < start_offset);
        let covering = spans[..next]
            .iter()
            .filter(|s| is_protected(s, ignore_nesting) && s.strictly_contains(start_offset))
            .map(|s| s.end)
            .max();
        Self {
            bytes: text.as_bytes(),
            spans,
            ignore_nesting,
            pos: start_offset,
            next,
            covering,
        }
    }

    /// Next unprotected offset `>= from` where `target` occurs.
    pub fn next_match(&mut self, from: usize, target: &str) -> Option<usize> {
        let needle = target.as_bytes();
        let len = self.bytes.len();
        self.pos = self.pos.max(from);

        while self.pos < len {
            if let Some(end) = self.covering.take() {
                self.pos = self.pos.max(end);
            }
            while self.next < self.spans.len() && self.spans[self.next].start < self.pos {
                let s = &self.spans[self.next];
                self.next += 1;
                if is_protected(s, self.ignore_nesting) && s.end > self.pos {
                    self.covering = Some(self.covering.map_or(s.end, |c| c.max(s.end)));
                }
            }
            if self.covering.is_some() {
                continue;
            }
            if self.pos >= len {
                break;
            }
            if self.bytes[self.pos..].starts_with(needle) {
                return Some(self.pos);
            }
            self.pos += 1;
        }
        None
    }
}

/// Every offset where `target` occurs outside protected regions, scanning
/// once. Matches do not overlap.
pub fn find_all_top_level(text: &str, target: &str, ignore_nesting: bool) -> Vec<usize> {
    let mut out = Vec::new();
    if target.is_empty() {
        return out;
    }
    let spans = scan(text, 0);
    let mut cursor = SpanCursor::new(text, &spans, 0, ignore_nesting);
    let mut pos = 0usize;
    while let Some(found) = cursor.next_match(pos, target) {
        out.push(found);
        pos = found + target.len();
    }
    out
}

/// Split `text` on every unprotected occurrence of `sep`.
pub fn split_top_level<'a>(text: &'a str, sep: &str, ignore_nesting: bool) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut last = 0usize;
    for at in find_all_top_level(text, sep, ignore_nesting) {
        parts.push(&text[last..at]);
        last = at + sep.len();
    }
    parts.push(&text[last..]);
    parts
}
