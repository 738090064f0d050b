//! Query compilation.
//!
//! A raw query is rewritten with a handful of permissive fix-ups and then
//! compiled as a case-insensitive regular expression. The fix-ups only touch
//! the first occurrence of what they fix, so `(a)` matches literally while
//! `(a)(b)` still groups its second pair.

use regex::{Regex, RegexBuilder};
use std::ops::Range;
use tracing::debug;

/// A compiled, reusable matcher for one raw query string.
#[derive(Debug, Clone)]
pub struct Query {
    raw: String,
    regex: Regex,
    literal: bool,
}

impl Query {
    /// Compile a raw query. Empty input means "no active query".
    pub fn compile(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let pattern = rewrite(raw);
        match build(&pattern) {
            Ok(regex) => Some(Self {
                raw: raw.to_string(),
                regex,
                literal: false,
            }),
            Err(e) => {
                debug!(
                    query = %raw,
                    error = %e,
                    "Query is not a valid pattern, matching literally"
                );
                let regex = build(&regex::escape(raw)).ok()?;
                Some(Self {
                    raw: raw.to_string(),
                    regex,
                    literal: true,
                })
            }
        }
    }

    /// The string the user typed
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The pattern actually matched
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the query fell back to literal matching
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Byte ranges of every non-overlapping, non-empty match in `text`.
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect()
    }

    /// Whether `text` has at least one non-empty match.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.find_iter(text).any(|m| !m.is_empty())
    }
}

fn build(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Apply the permissive fix-ups, in order:
/// escape the first `(` and the first `)`, collapse the first run of `|`,
/// drop one trailing `|`, drop one trailing unescaped `\`.
fn rewrite(raw: &str) -> String {
    let mut pattern = raw.replacen('(', "\\(", 1).replacen(')', "\\)", 1);

    if let Some(start) = pattern.find('|') {
        let run = pattern[start..].bytes().take_while(|&b| b == b'|').count();
        pattern.replace_range(start..start + run, "|");
    }

    if pattern.ends_with('|') {
        pattern.pop();
    }

    if pattern.ends_with('\\') && !pattern.ends_with("\\\\") {
        pattern.pop();
    }

    pattern
}
