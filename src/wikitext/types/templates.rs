//! Template invocation extraction and argument handling.
//!
//! Invocations are returned as the exact source substring, `{{Name` through
//! the matching `}}`. Callers decompose one with [`parse_arguments`] when they
//! need its values and write it back with [`build`].
//!
//! Name matching is literal: `{{Name}}` and `{{name}}` are different templates
//! and no whitespace normalisation is applied.

use std::ops::Range;

use lazy_regex::regex_is_match;

use crate::wikitext::arguments::{MAX_POSITIONAL_INDEX, TemplateArguments};
use crate::wikitext::enums::Layout;
use crate::wikitext::errors::{Result, WtError};
use crate::wikitext::scanner::{Span, scan};
use crate::wikitext::search::{SpanCursor, find_next, split_top_level};

/// Byte ranges of every invocation of `name`, plus the offset of the first
/// candidate that never closes (scanning stops there). `spans` must come from
/// a scan of the whole of `text`.
fn locate(text: &str, spans: &[Span], template_name: &str) -> (Vec<Range<usize>>, Option<usize>) {
    let opener = format!("{{{{{}", template_name);
    // candidates inside comments / nowiki are not invocations
    let mut openers = SpanCursor::new(text, spans, 0, true);
    let mut out = Vec::new();
    let mut from = 0usize;

    while let Some(start) = openers.next_match(from, &opener) {
        let after_name = start + opener.len();
        let boundary = text[after_name..]
            .chars()
            .next()
            .is_some_and(|c| c == '|' || c == '}' || c.is_whitespace());
        if !boundary {
            from = start + 1;
            continue;
        }
        match find_next(text, after_name, "}}", false) {
            Some(close) => {
                let end = close + 2;
                out.push(start..end);
                from = end;
            }
            None => {
                log::warn!(
                    "{}",
                    WtError::parse_at(format!("unclosed template '{}'", template_name), start)
                );
                return (out, Some(start));
            }
        }
    }
    (out, None)
}

/// Every invocation of `template_name` in `text`, in document order.
///
/// An invocation of the same name nested inside a found one is part of the
/// outer text and is not reported on its own. An unclosed invocation ends the
/// search; everything found before it is still returned.
pub fn find_all(text: &str, template_name: &str) -> Vec<String> {
    find_all_in(text, &scan(text, 0), template_name)
}

/// As [`find_all`], reusing the spans of a full scan of `text`.
pub fn find_all_in(text: &str, spans: &[Span], template_name: &str) -> Vec<String> {
    let (ranges, _) = locate(text, spans, template_name);
    ranges.into_iter().map(|r| text[r].to_string()).collect()
}

/// The first invocation of `template_name`.
pub fn find_first(text: &str, template_name: &str) -> Result<String> {
    find_first_in(text, &scan(text, 0), template_name)
}

pub fn find_first_in(text: &str, spans: &[Span], template_name: &str) -> Result<String> {
    match locate(text, spans, template_name) {
        (ranges, _) if !ranges.is_empty() => Ok(text[ranges[0].clone()].to_string()),
        (_, Some(offset)) => Err(WtError::parse_at(
            format!("unclosed template '{}'", template_name),
            offset,
        )),
        _ => Err(WtError::not_found(format!(
            "Template '{}' not found",
            template_name
        ))),
    }
}

/// Rewrite every invocation of `template_name`. `f` receives the invocation
/// text and returns its replacement, or `None` to keep it unchanged.
pub fn replace_all<F>(text: &str, template_name: &str, mut f: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let (ranges, _) = locate(text, &scan(text, 0), template_name);
    let mut out = String::with_capacity(text.len());
    let mut last = 0usize;
    for r in ranges {
        out.push_str(&text[last..r.start]);
        let original = &text[r.clone()];
        match f(original) {
            Some(new) => out.push_str(&new),
            None => out.push_str(original),
        }
        last = r.end;
    }
    out.push_str(&text[last..]);
    out
}

/// The text between `{{` and `}}` of an invocation.
fn body(invocation: &str) -> &str {
    let s = invocation.strip_prefix("{{").unwrap_or(invocation);
    s.strip_suffix("}}").unwrap_or(s)
}

/// The template name of an invocation, trimmed.
pub fn template_name(invocation: &str) -> String {
    let body = body(invocation);
    let end = find_next(body, 0, "|", false).unwrap_or(body.len());
    body[..end].trim().to_string()
}

/// Split one argument into `(key, value)` on its first top-level `=`.
/// Keys that are empty or span lines are not keys; the argument is then
/// positional text.
fn split_key_value(arg: &str) -> Option<(&str, &str)> {
    let eq = find_next(arg, 0, "=", false)?;
    let key = arg[..eq].trim();
    if key.is_empty() || key.contains('\n') {
        log::debug!("malformed argument key in '{}', keeping it positional", arg);
        return None;
    }
    Some((key, arg[eq + 1..].trim()))
}

/// Decompose an invocation into positional and named arguments.
///
/// Arguments are split on top-level `|` and trimmed. `key=value` pairs with a
/// numeric key set that positional slot (`|3=x` fills index 3); unnamed
/// arguments are numbered in order of appearance, independent of explicit
/// ones. With `ignore_named` set, non-numeric `key=value` pairs are dropped
/// and `named` stays empty.
///
/// Numeric keys above [`MAX_POSITIONAL_INDEX`] are kept as named arguments.
/// Unnamed arguments past that index are dropped with a warning.
pub fn parse_arguments(invocation: &str, ignore_named: bool) -> TemplateArguments {
    let mut args = TemplateArguments::new();
    let mut implicit = 1usize;

    for raw in split_top_level(body(invocation), "|", false)
        .into_iter()
        .skip(1)
    {
        let arg = raw.trim();
        match split_key_value(arg) {
            Some((key, value)) => {
                if TemplateArguments::positional_index(key).is_some() {
                    args.set_named(key, value);
                } else if ignore_named {
                    log::trace!("dropping named argument '{}'", key);
                } else {
                    if regex_is_match!(r"^[0-9]+$", key) {
                        log::debug!("index {} out of range, keeping it as a named argument", key);
                    }
                    args.set_named(key, value);
                }
            }
            None => {
                if let Err(e) = args.set_positional(implicit, arg) {
                    log::warn!("{}; dropping argument '{}'", e, arg);
                }
                implicit += 1;
            }
        }
    }
    if !args.named().is_empty() {
        log::trace!("named arguments: {}", args.named_keys());
    }
    args
}

/// Serialise arguments back into an invocation of `template_name`.
///
/// Positional values go first in index order. A value is written bare only
/// when the parser would give it the same index back; gaps and values with a
/// top-level `=` are written as `|N=value`. Named entries follow as
/// `|key=value`. Empty arguments give `{{Name}}`.
pub fn build(arguments: &TemplateArguments, template_name: &str, layout: Layout) -> String {
    let mut parts: Vec<(Option<String>, &str)> = Vec::new();
    let mut implicit = 1usize;
    for (idx, value) in arguments.positional_entries() {
        if idx == implicit && split_key_value(value).is_none() {
            parts.push((None, value));
            implicit += 1;
        } else {
            parts.push((Some(idx.to_string()), value));
        }
    }
    for (key, value) in arguments.named() {
        parts.push((Some(key.clone()), value));
    }

    let mut s = String::new();
    s.push_str("{{");
    s.push_str(template_name);
    if parts.is_empty() {
        s.push_str("}}");
        return s;
    }
    for (key, value) in parts {
        match layout {
            Layout::Compact => {
                s.push('|');
                if let Some(k) = key {
                    s.push_str(&k);
                    s.push('=');
                }
                s.push_str(value);
            }
            Layout::Multiline => {
                s.push_str("\n| ");
                if let Some(k) = key {
                    s.push_str(&k);
                    s.push_str(" = ");
                }
                s.push_str(value);
            }
        }
    }
    if layout == Layout::Multiline {
        s.push('\n');
    }
    s.push_str("}}");
    s
}
