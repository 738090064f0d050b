//! Episode and marker records.

use crate::time::marker_time;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A timestamped annotation within an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Offset into the video, in seconds
    pub timestamp: u64,
    /// `(MM:SS)` or `(HH:MM:SS)`
    pub pretty_time: String,
    /// Annotation body, quotes unescaped
    pub text: String,
}

impl Marker {
    /// Create a marker, deriving its pretty time.
    pub fn new(timestamp: u64, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            pretty_time: marker_time(timestamp),
            text: text.into(),
        }
    }
}

/// One video's worth of markers. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Raw identifier from the `name:` line
    pub name: String,
    /// Display title
    pub title: String,
    /// Derived day label, e.g. `Day 12`
    pub day: String,
    /// Markers in chronological order
    pub markers: Vec<Marker>,
}

impl Episode {
    /// Create an episode, deriving its day label from the name.
    pub fn new(name: impl Into<String>, title: impl Into<String>, markers: Vec<Marker>) -> Self {
        let name = name.into();
        let day = day_name(&format!("{}.html.md", name));
        Self {
            name,
            title: title.into(),
            day,
            markers,
        }
    }

    /// Group header shown above this episode's matches.
    pub fn label(&self) -> String {
        format!("{}: {}", self.day, self.title)
    }

    /// Seconds covered by the marker at `index`: the gap to the next marker.
    /// The last marker covers nothing.
    pub fn marker_duration(&self, index: usize) -> u64 {
        match (self.markers.get(index), self.markers.get(index + 1)) {
            (Some(this), Some(next)) => next.timestamp.saturating_sub(this.timestamp),
            _ => 0,
        }
    }

    /// Player link for one of this episode's markers.
    pub fn player_href(&self, player_url_prefix: &str, marker: &Marker) -> String {
        format!(
            "{}{}/#{}",
            player_url_prefix,
            self.name.replace('"', ""),
            marker.timestamp
        )
    }
}

fn day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([a-zA-Z_-]+)([0-9]+)?([a-zA-Z]+)?").expect("day pattern is valid")
    })
}

/// Derive a human day label from an episode filename.
///
/// `day001.html.md` becomes `Day 001`, `day12b.html.md` becomes `Day 12 B`.
/// Filenames without any letters are returned unchanged.
pub fn day_name(filename: &str) -> String {
    let Some(caps) = day_pattern().captures(filename) else {
        return filename.to_string();
    };

    let word = &caps[1];
    let mut chars = word.chars();
    let mut day = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };

    if let Some(number) = caps.get(2) {
        day.push(' ');
        day.push_str(number.as_str());
    }
    if let Some(suffix) = caps.get(3) {
        day.push(' ');
        day.push_str(&suffix.as_str().to_uppercase());
    }

    day
}
