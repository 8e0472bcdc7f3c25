//! Rich error types for the wikitext module.
//!
//! Scanning and extraction never fail on malformed markup: unclosed constructs
//! simply produce nothing. `WtError` is used by the lookup helpers layered on
//! top (asking for an argument, column or template that is not there) and by
//! the command line front-end.
//!
//! Exported items:
//! - `WtError` - main error enum with variants for parse failures, missing
//!    items, index issues and invalid arguments.
//! - `Result<T>` - convenient alias `std::result::Result<T, WtError>`.

use std::error::Error;
use std::fmt;

/// The canonical result type used across the wikitext module.
pub type Result<T> = std::result::Result<T, WtError>;

/// Wikitext error with rich variants.
///
/// - `ParseError` - a construct could not be resolved (e.g. never closed).
///    Includes the byte offset where the problem starts when known.
/// - `NotFound` - requested item was not present (templates/arguments/columns).
/// - `IndexOutOfBounds` - asked for the Nth element but the collection was
///    smaller; contains both the requested index and the available length.
/// - `InvalidArgument` - caller supplied a value the helper cannot use.
/// - `Io` - wrapper for I/O errors raised by the command line front-end.
/// - `Other` - catch-all carrying a message and optional boxed cause.
#[derive(Debug)]
pub enum WtError {
    ParseError {
        msg: String,
        offset: Option<usize>,
    },
    NotFound {
        msg: String,
    },
    IndexOutOfBounds {
        idx: usize,
        len: usize,
    },
    InvalidArgument {
        msg: String,
    },
    Io {
        msg: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
    Other {
        msg: String,
        source: Option<Box<dyn Error + Send + Sync + 'static>>,
    },
}

impl WtError {
    /// Construct a parse error with a message and offset.
    pub fn parse_at<S: Into<String>>(msg: S, offset: usize) -> Self {
        WtError::ParseError {
            msg: msg.into(),
            offset: Some(offset),
        }
    }

    /// Construct a not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        WtError::NotFound { msg: msg.into() }
    }

    /// Construct an index-out-of-bounds error.
    pub fn index_oob(idx: usize, len: usize) -> Self {
        WtError::IndexOutOfBounds { idx, len }
    }

    /// Construct an invalid argument error.
    pub fn invalid_arg<S: Into<String>>(msg: S) -> Self {
        WtError::InvalidArgument { msg: msg.into() }
    }

    /// Wrap a std::io::Error or other error as an Io variant.
    pub fn io_err<E: Error + Send + Sync + 'static>(msg: impl Into<String>, e: E) -> Self {
        WtError::Io {
            msg: msg.into(),
            source: Some(Box::new(e)),
        }
    }

    /// Generic helper to produce Other(...) with an optional source.
    pub fn other_with_source<E: Error + Send + Sync + 'static>(
        msg: impl Into<String>,
        source: Option<E>,
    ) -> Self {
        WtError::Other {
            msg: msg.into(),
            source: source.map(|e| Box::new(e) as Box<dyn Error + Send + Sync>),
        }
    }

    /// Returns a short description of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WtError::ParseError { .. } => "ParseError",
            WtError::NotFound { .. } => "NotFound",
            WtError::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            WtError::InvalidArgument { .. } => "InvalidArgument",
            WtError::Io { .. } => "Io",
            WtError::Other { .. } => "Other",
        }
    }

    /// Byte offset attached to a parse error, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            WtError::ParseError { offset, .. } => *offset,
            _ => None,
        }
    }
}

impl fmt::Display for WtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WtError::ParseError { msg, offset } => {
                if let Some(off) = offset {
                    write!(f, "Parse error at {}: {}", off, msg)
                } else {
                    write!(f, "Parse error: {}", msg)
                }
            }
            WtError::NotFound { msg } => write!(f, "Not found: {}", msg),
            WtError::IndexOutOfBounds { idx, len } => {
                write!(f, "Index out of bounds: requested {}, length {}", idx, len)
            }
            WtError::InvalidArgument { msg } => write!(f, "Invalid argument: {}", msg),
            WtError::Io { msg, source } => {
                if let Some(s) = source {
                    write!(f, "IO error: {} (cause: {})", msg, s)
                } else {
                    write!(f, "IO error: {}", msg)
                }
            }
            WtError::Other { msg, source } => {
                if let Some(s) = source {
                    write!(f, "{} (cause: {})", msg, s)
                } else {
                    write!(f, "{}", msg)
                }
            }
        }
    }
}

impl Error for WtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WtError::Io { source, .. } | WtError::Other { source, .. } => {
                source.as_ref().map(|b| b.as_ref() as &dyn Error)
            }
            _ => None,
        }
    }
}

impl From<std::io::Error> for WtError {
    fn from(e: std::io::Error) -> Self {
        WtError::io_err("I/O error", e)
    }
}

impl From<serde_json::Error> for WtError {
    fn from(e: serde_json::Error) -> Self {
        WtError::other_with_source("json error", Some(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error_with_offset() {
        let e = WtError::parse_at("unclosed template 'T'", 123);
        let s = format!("{}", e);
        assert!(s.contains("123"));
        assert!(s.contains("unclosed template"));
        assert_eq!(e.offset(), Some(123));
        assert_eq!(e.kind(), "ParseError");
    }

    #[test]
    fn display_index_oob() {
        let e = WtError::index_oob(4, 2);
        assert_eq!(
            format!("{}", e),
            "Index out of bounds: requested 4, length 2"
        );
        assert_eq!(e.offset(), None);
    }

    #[test]
    fn io_conversion_has_source() {
        let io_err = std::io::Error::other("oh no");
        let e: WtError = io_err.into();
        let s = format!("{}", e);
        assert!(s.contains("I/O error"));
        assert!(s.contains("oh no"));
        assert!(e.source().is_some());
    }
}
