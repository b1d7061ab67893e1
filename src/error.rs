//! Error taxonomy.
//!
//! Each error is scoped to an item or a file; none of them aborts the run.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Scope name used for parse errors outside any documentable item.
pub const MODULE_SCOPE: &str = "<module>";

/// A syntax error found while locating items.
///
/// Attached to the innermost enclosing item (which is then skipped) or to
/// [`MODULE_SCOPE`].
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{scope} (line {line}): {message}")]
pub struct ParseError {
    pub scope: String,
    pub line: usize,
    pub message: String,
}

/// Errors that can occur while obtaining documentation text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited by provider")]
    RateLimited,
    #[error("provider returned HTTP {status}")]
    Server { status: u16 },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("backend misconfigured: {0}")]
    Config(String),
}

impl BackendError {
    /// Transient failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Network(_)
                | BackendError::Timeout
                | BackendError::RateLimited
                | BackendError::Server { .. }
        )
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_decode() {
            BackendError::MalformedResponse(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

/// Errors raised while applying edits to a text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("edit for `{item}` at {start}..{end} is outside the file ({len} bytes)")]
    OutOfBounds {
        item: String,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("edit for `{item}` at {start}..{end} does not fall on a character boundary")]
    NotCharBoundary { item: String, start: usize, end: usize },
    #[error("edits for `{first}` and `{second}` overlap")]
    Overlap { first: String, second: String },
    #[error("`{item}` has no place to insert documentation: {reason}")]
    NoInsertionPoint { item: String, reason: String },
}

/// Failure to persist a rewritten file.
#[derive(Error, Debug)]
#[error("failed to write {}: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(BackendError::Timeout.is_transient());
        assert!(BackendError::RateLimited.is_transient());
        assert!(BackendError::Server { status: 503 }.is_transient());
        assert!(!BackendError::Auth("bad key".into()).is_transient());
        assert!(!BackendError::MalformedResponse("empty".into()).is_transient());
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            scope: MODULE_SCOPE.to_string(),
            line: 3,
            message: "unexpected `}`".to_string(),
        };
        assert_eq!(err.to_string(), "<module> (line 3): unexpected `}`");
    }
}
