//! `TemplateArguments`: the positional/named split of one template invocation.
//!
//! Positional values are kept in a sparse index -> value map so that a
//! numbered named parameter (`|3=value`) can land ahead of what has been
//! filled in order. The dense `Vec<Option<String>>` view is produced on demand.
//! Indices are capped at [`MAX_POSITIONAL_INDEX`], so the dense view stays
//! small whatever numbers a page author writes.

use std::collections::BTreeMap;

use itertools::Itertools;
use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};

use crate::wikitext::errors::{Result, WtError};

/// Highest positional index accepted. Larger numeric keys are kept as named
/// arguments.
pub const MAX_POSITIONAL_INDEX: usize = 1 << 16;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateArguments {
    /// 1-based index -> value.
    positional: BTreeMap<usize, String>,
    named: BTreeMap<String, String>,
}

impl TemplateArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from dense positional values (index 1 first) and named pairs.
    /// Named pairs with a numeric key go to that position, as
    /// [`set_named`](Self::set_named) does.
    pub fn from_parts<P, N, K, V>(positional: P, named: N) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        N: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut args = Self::new();
        for value in positional {
            if let Err(e) = args.push_positional(value) {
                log::warn!("{}; dropping the remaining positional values", e);
                break;
            }
        }
        for (key, value) in named {
            args.set_named(key, value);
        }
        args
    }

    /// 1-based index named by a purely numeric key, `None` for anything else
    /// (including `0` and numbers above [`MAX_POSITIONAL_INDEX`]).
    pub fn positional_index(key: &str) -> Option<usize> {
        if !regex_is_match!(r"^[0-9]+$", key) {
            return None;
        }
        key.parse::<usize>()
            .ok()
            .filter(|i| (1..=MAX_POSITIONAL_INDEX).contains(i))
    }

    /// Dense positional view: slot `i` holds index `i + 1`, gaps are `None`.
    pub fn positional(&self) -> Vec<Option<String>> {
        let Some(&last) = self.positional.keys().next_back() else {
            return Vec::new();
        };
        (1..=last)
            .map(|i| self.positional.get(&i).cloned())
            .collect()
    }

    /// Sparse positional entries in index order.
    pub fn positional_entries(&self) -> impl Iterator<Item = (usize, &str)> {
        self.positional.iter().map(|(i, v)| (*i, v.as_str()))
    }

    pub fn named(&self) -> &BTreeMap<String, String> {
        &self.named
    }

    /// Positional value at 1-based `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.positional.get(&index).map(String::as_str)
    }

    /// Positional value at 1-based `index`, or an error naming the gap.
    pub fn positional_arg(&self, index: usize) -> Result<&str> {
        if index == 0 {
            return Err(WtError::invalid_arg("positional indices start at 1"));
        }
        self.get(index)
            .ok_or_else(|| WtError::index_oob(index, self.positional_len()))
    }

    /// Named value for `key` (exact match).
    pub fn named_arg(&self, key: &str) -> Result<&str> {
        self.named
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| {
                WtError::not_found(format!(
                    "named argument '{}' (have: {})",
                    key,
                    self.named_keys()
                ))
            })
    }

    /// Highest filled positional index (0 when none).
    pub fn positional_len(&self) -> usize {
        self.positional.keys().next_back().copied().unwrap_or(0)
    }

    /// Append after the highest filled index; returns the index used.
    pub fn push_positional<S: Into<String>>(&mut self, value: S) -> Result<usize> {
        let idx = self.positional_len() + 1;
        self.set_positional(idx, value)?;
        Ok(idx)
    }

    /// Set the value at 1-based `index`, replacing any previous one.
    pub fn set_positional<S: Into<String>>(&mut self, index: usize, value: S) -> Result<()> {
        if index == 0 {
            return Err(WtError::invalid_arg("positional indices start at 1"));
        }
        if index > MAX_POSITIONAL_INDEX {
            return Err(WtError::index_oob(index, MAX_POSITIONAL_INDEX));
        }
        self.positional.insert(index, value.into());
        Ok(())
    }

    /// Set a named value. A purely numeric key within range addresses a
    /// position instead, the way the parser reads `|2=value`.
    pub fn set_named<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        match Self::positional_index(&key) {
            Some(idx) => {
                self.positional.insert(idx, value.into());
            }
            None => {
                self.named.insert(key, value.into());
            }
        }
    }

    pub fn remove_named(&mut self, key: &str) -> Option<String> {
        self.named.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Named keys joined, for error messages and logs.
    pub fn named_keys(&self) -> String {
        self.named.keys().join(", ")
    }
}
