//! Structures extracted from wikitext: templates, tables and links.

pub mod links;
pub mod table;
pub mod templates;
