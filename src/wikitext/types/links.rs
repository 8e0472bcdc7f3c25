/*!
Link extraction for wikitext.

This module implements:
- `WikiLink` for internal `[[target|text|extra...]]` links.
- `ExternalLink` for `[url text]` links.
- `inner_links(text)` / `external_links(text)` built on the scanner's spans.
- `redirect_target(text)` for `#REDIRECT [[Target]]` pages.

Both link kinds are read straight from the span list, so links inside
comments or `<nowiki>` never show up, and links inside templates do.
*/

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::wikitext::enums::SpanKind;
use crate::wikitext::scanner::{Span, scan};

/// Internal link `[[target|text|extra...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiLink {
    pub target: String,
    pub text: String,
    /// Segments after the display text (image sizing, alignment, captions).
    pub extra_params: Option<Vec<String>>,
}

impl WikiLink {
    pub fn new<S: Into<String>>(target: S, text: S) -> Self {
        Self {
            target: target.into(),
            text: text.into(),
            extra_params: None,
        }
    }

    /// Reconstruct the link as wikitext.
    pub fn to_wikitext(&self) -> String {
        let mut s = format!("[[{}", self.target);
        if self.text != self.target || self.extra_params.is_some() {
            s.push('|');
            s.push_str(&self.text);
        }
        for p in self.extra_params.iter().flatten() {
            s.push('|');
            s.push_str(p);
        }
        s.push_str("]]");
        s
    }
}

/// External link `[url text]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub url: String,
    /// Empty when the link has no label.
    pub text: String,
}

impl ExternalLink {
    pub fn new<S: Into<String>>(url: S, text: S) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    /// The url as a parsed `Url`, `None` when the bracket holds something
    /// that is not an absolute URL.
    pub fn parsed_url(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }

    /// Reconstruct the link as wikitext.
    pub fn to_wikitext(&self) -> String {
        if self.text.is_empty() {
            format!("[{}]", self.url)
        } else {
            // MediaWiki external link uses a space between target and label
            format!("[{} {}]", self.url, self.text)
        }
    }
}

fn wiki_link_from(inner: &str) -> WikiLink {
    let mut segments = inner.split('|');
    let raw_target = segments.next().unwrap_or("").trim();
    let target = raw_target
        .strip_prefix(':')
        .unwrap_or(raw_target)
        .trim()
        .to_string();
    let text = segments
        .next()
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| target.clone());
    let extra: Vec<String> = segments.map(|s| s.trim().to_string()).collect();
    WikiLink {
        target,
        text,
        extra_params: (!extra.is_empty()).then_some(extra),
    }
}

fn external_link_from(inner: &str) -> ExternalLink {
    let inner = inner.trim_start();
    match inner.find(char::is_whitespace) {
        Some(ws) => ExternalLink::new(inner[..ws].to_string(), inner[ws..].trim().to_string()),
        None => ExternalLink::new(inner.to_string(), String::new()),
    }
}

fn links_of<'a>(
    text: &'a str,
    spans: &'a [Span],
    kind: SpanKind,
) -> impl Iterator<Item = &'a str> {
    spans
        .iter()
        .filter(move |s| s.kind == kind)
        .map(move |s| s.inner(text))
}

/// Every internal link in `text`, in document order.
///
/// The interior is split on plain `|`; a leading `:` on the target (used to
/// link to a category or file instead of applying it) is dropped.
pub fn inner_links(text: &str) -> Vec<WikiLink> {
    inner_links_in(text, &scan(text, 0))
}

/// As [`inner_links`], reusing spans of a full scan of `text`.
pub fn inner_links_in(text: &str, spans: &[Span]) -> Vec<WikiLink> {
    links_of(text, spans, SpanKind::WikiLink)
        .map(wiki_link_from)
        .collect()
}

/// Every external (single bracket) link in `text`, in document order.
pub fn external_links(text: &str) -> Vec<ExternalLink> {
    external_links_in(text, &scan(text, 0))
}

pub fn external_links_in(text: &str, spans: &[Span]) -> Vec<ExternalLink> {
    links_of(text, spans, SpanKind::Link)
        .map(external_link_from)
        .collect()
}

/// Target page of a redirect: the first non-empty line must start with
/// `#REDIRECT` (any case) and contain a wiki-link.
pub fn redirect_target(text: &str) -> Option<String> {
    let line = text.lines().find(|l| !l.trim().is_empty())?;
    if !regex_is_match!(r"(?i)^\s*#redirect", line) {
        return None;
    }
    inner_links(line)
        .into_iter()
        .next()
        .map(|l| l.target)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_simple() {
        let links = inner_links("[[A|B]] [[C]]");
        assert_eq!(links, vec![WikiLink::new("A", "B"), WikiLink::new("C", "C")]);
    }

    #[test]
    fn internal_colon_and_extras() {
        let links = inner_links("[[:Category:Towers]] [[File:x.png|thumb|200px|A caption]]");
        assert_eq!(links[0].target, "Category:Towers");
        assert_eq!(links[0].text, "Category:Towers");
        assert_eq!(links[1].target, "File:x.png");
        assert_eq!(links[1].text, "thumb");
        assert_eq!(
            links[1].extra_params,
            Some(vec!["200px".to_string(), "A caption".to_string()])
        );
    }

    #[test]
    fn internal_inside_templates_but_not_comments() {
        let s = "{{T|[[In]]}} <!-- [[Hidden]] --> <nowiki>[[Nope]]</nowiki>";
        let links = inner_links(s);
        assert_eq!(links, vec![WikiLink::new("In", "In")]);
    }

    #[test]
    fn external_simple() {
        let links = external_links("[http://x.com label]");
        assert_eq!(links, vec![ExternalLink::new("http://x.com", "label")]);
        assert_eq!(
            links[0].parsed_url().map(|u| u.host_str().map(str::to_string)),
            Some(Some("x.com".to_string()))
        );
    }

    #[test]
    fn external_whitespace_run_and_no_label() {
        let links = external_links("[https://a.org/p  two words ] [https://b.org]");
        assert_eq!(links[0], ExternalLink::new("https://a.org/p", "two words"));
        assert_eq!(links[1], ExternalLink::new("https://b.org", ""));
    }

    #[test]
    fn wiki_links_are_not_external() {
        assert!(external_links("[[A]]").is_empty());
        assert!(inner_links("[http://x y]").is_empty());
    }

    #[test]
    fn non_url_brackets_have_no_parsed_url() {
        let links = external_links("[not a url]");
        assert_eq!(links[0].url, "not");
        assert!(links[0].parsed_url().is_none());
    }

    #[test]
    fn to_wikitext_roundtrip() {
        assert_eq!(WikiLink::new("Page", "Label").to_wikitext(), "[[Page|Label]]");
        assert_eq!(WikiLink::new("Page", "Page").to_wikitext(), "[[Page]]");
        let img = &inner_links("[[File:x.png|thumb|left]]")[0];
        assert_eq!(img.to_wikitext(), "[[File:x.png|thumb|left]]");
        assert_eq!(ExternalLink::new("http://x", "X").to_wikitext(), "[http://x X]");
        assert_eq!(ExternalLink::new("http://x", "").to_wikitext(), "[http://x]");
    }

    #[test]
    fn redirects() {
        assert_eq!(
            redirect_target("\n#REDIRECT [[Tower of Annoyingly Simple Trials]]").as_deref(),
            Some("Tower of Annoyingly Simple Trials")
        );
        assert_eq!(redirect_target("#redirect [[A|b]]").as_deref(), Some("A"));
        assert_eq!(redirect_target("Text\n#REDIRECT [[A]]"), None);
        assert_eq!(redirect_target("#REDIRECT nowhere"), None);
        assert_eq!(redirect_target(""), None);
    }
}
