//! Structural scanning and extraction for MediaWiki wikitext.
//!
//! The crate finds templates, tables and links in raw page text without
//! rendering it. See [`wikitext`] for the entry points.

pub mod wikitext;
