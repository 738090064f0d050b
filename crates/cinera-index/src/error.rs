//! Index error and warning types.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that make a whole index document unusable.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The document had content but no record survived parsing
    #[error("Unparsable index: {lines} non-blank lines produced no episodes ({warnings} warnings)")]
    Unparsable { lines: usize, warnings: usize },
}

/// Kind of recoverable problem found while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Line in markers mode that is not `"<digits>": "<text>"`
    MalformedMarker,
    /// Marker timestamp not greater than the previous one in the episode
    NonMonotonicTimestamp,
    /// Timestamp digits do not fit in a u64
    TimestampOverflow,
    /// Record reached `---` without both a name and a title
    IncompleteRecord,
    /// Record still open at end of document
    UnterminatedRecord,
}

/// A skipped or suspicious line. Never aborts the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 1-indexed line number
    pub line: usize,
    /// What went wrong
    pub kind: WarningKind,
    /// The offending line, as read
    pub text: String,
}

impl ParseWarning {
    pub(crate) fn new(line: usize, kind: WarningKind, text: &str) -> Self {
        Self {
            line,
            kind,
            text: text.to_string(),
        }
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            WarningKind::MalformedMarker => "malformed marker",
            WarningKind::NonMonotonicTimestamp => "timestamp not increasing",
            WarningKind::TimestampOverflow => "timestamp out of range",
            WarningKind::IncompleteRecord => "record without name or title",
            WarningKind::UnterminatedRecord => "unterminated record",
        };
        write!(f, "line {}: {}: {}", self.line, what, self.text)
    }
}
