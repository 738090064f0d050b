//! Line-oriented index document parser.
//!
//! An index document is a sequence of records separated by `---` lines:
//!
//! ```text
//! name: day1
//! title: "Intro"
//! markers:
//! "10": "hello world"
//! "70": "goodbye \"world\""
//! ---
//! ```
//!
//! Records commit only when they reach `---` with both a name and a title.
//! Anything malformed is skipped with a [`ParseWarning`].

use crate::episode::{Episode, Marker};
use crate::error::{IndexError, ParseWarning, WarningKind};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Record separator line.
const SEPARATOR: &str = "---";

/// Episodes parsed from one document, plus everything that was skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedIndex {
    /// Episodes in document order, which is chronological order
    pub episodes: Vec<Episode>,
    /// Recoverable problems, in line order
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    None,
    Markers,
}

/// A record being assembled between separators.
#[derive(Debug, Default)]
struct Record {
    name: Option<String>,
    title: Option<String>,
    markers: Vec<Marker>,
    /// Set once any line lands in this record
    touched: bool,
}

impl Record {
    fn into_episode(self) -> Option<Episode> {
        match (self.name, self.title) {
            (Some(name), Some(title)) => Some(Episode::new(name, title, self.markers)),
            _ => None,
        }
    }
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""(\d+)": "(.+)""#).expect("marker pattern is valid"))
}

/// Index document parser.
pub struct IndexParser {
    // Stateless; per-document state lives in `parse`
}

impl IndexParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {}
    }

    /// Parse a whole document.
    ///
    /// Fails only when the document has content and yields no episode at all.
    pub fn parse(&self, document: &str) -> Result<ParsedIndex, IndexError> {
        let mut parsed = ParsedIndex::default();
        let mut record = Record::default();
        let mut mode = Mode::None;
        let mut non_blank = 0usize;
        let mut last_line = 0usize;

        for (i, raw) in document.split('\n').enumerate() {
            let line_no = i + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            if line.trim().is_empty() {
                continue;
            }
            non_blank += 1;
            last_line = line_no;

            if line == SEPARATOR {
                let finished = std::mem::take(&mut record);
                let touched = finished.touched;
                match finished.into_episode() {
                    Some(episode) => parsed.episodes.push(episode),
                    None if touched => parsed.warnings.push(ParseWarning::new(
                        line_no,
                        WarningKind::IncompleteRecord,
                        line,
                    )),
                    None => {}
                }
                mode = Mode::None;
                continue;
            }

            record.touched = true;

            if let Some(value) = line.strip_prefix("name:") {
                record.name = Some(value.strip_prefix(' ').unwrap_or(value).to_string());
            } else if let Some(value) = line.strip_prefix("title:") {
                record.title = Some(strip_quotes(value.trim()).to_string());
            } else if line.starts_with("markers") {
                mode = Mode::Markers;
                record.markers.clear();
            } else if mode == Mode::Markers {
                if let Some(warning) = parse_marker_line(line, line_no, &mut record.markers) {
                    parsed.warnings.push(warning);
                }
            }
        }

        if record.touched {
            parsed.warnings.push(ParseWarning::new(
                last_line,
                WarningKind::UnterminatedRecord,
                record.name.as_deref().unwrap_or(""),
            ));
        }

        for warning in &parsed.warnings {
            debug!(line = warning.line, kind = ?warning.kind, "Index parse warning");
        }

        if parsed.episodes.is_empty() && non_blank > 0 {
            return Err(IndexError::Unparsable {
                lines: non_blank,
                warnings: parsed.warnings.len(),
            });
        }

        debug!(
            episodes = parsed.episodes.len(),
            warnings = parsed.warnings.len(),
            "Parsed index"
        );

        Ok(parsed)
    }
}

impl Default for IndexParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a whole document with a default parser.
pub fn parse_index(document: &str) -> Result<ParsedIndex, IndexError> {
    IndexParser::new().parse(document)
}

/// Remove one leading and one trailing `"`, when present.
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Parse one markers-mode line into `markers`, returning a warning if the
/// line was skipped or is suspicious.
fn parse_marker_line(
    line: &str,
    line_no: usize,
    markers: &mut Vec<Marker>,
) -> Option<ParseWarning> {
    let Some(caps) = marker_pattern().captures(line) else {
        return Some(ParseWarning::new(line_no, WarningKind::MalformedMarker, line));
    };

    let Ok(timestamp) = caps[1].parse::<u64>() else {
        return Some(ParseWarning::new(line_no, WarningKind::TimestampOverflow, line));
    };

    let out_of_order = markers
        .last()
        .is_some_and(|prev| prev.timestamp >= timestamp);

    markers.push(Marker::new(timestamp, caps[2].replace("\\\"", "\"")));

    out_of_order.then(|| ParseWarning::new(line_no, WarningKind::NonMonotonicTimestamp, line))
}
