//! Serialises episodes back into the index grammar.

use crate::episode::Episode;
use std::fmt::Write;

/// Write episodes as an index document that [`crate::parse_index`] reads
/// back into the same names, titles, timestamps and bodies.
///
/// Newlines inside a marker body cannot be expressed in the grammar and are
/// written as spaces. Empty bodies do not survive a round trip.
pub fn write_index(episodes: &[Episode]) -> String {
    let mut out = String::new();

    for episode in episodes {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "name: {}", episode.name);
        let _ = writeln!(out, "title: \"{}\"", episode.title);
        out.push_str("markers:\n");
        for marker in &episode.markers {
            let body = marker.text.replace('\n', " ").replace('"', "\\\"");
            let _ = writeln!(out, "\"{}\": \"{}\"", marker.timestamp, body);
        }
        out.push_str("---\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::Marker;
    use crate::parser::parse_index;

    #[test]
    fn test_write_format() {
        let ep = Episode::new("day1", "Intro", vec![Marker::new(10, "say \"hi\"")]);
        assert_eq!(
            write_index(&[ep]),
            "name: day1\ntitle: \"Intro\"\nmarkers:\n\"10\": \"say \\\"hi\\\"\"\n---\n"
        );
    }

    #[test]
    fn test_round_trip_preserves_markers() {
        let episodes = vec![
            Episode::new(
                "day1",
                "Intro",
                vec![
                    Marker::new(10, "hello \"world\""),
                    Marker::new(70, "trailing backslash \\"),
                    Marker::new(3700, "a \\\" b"),
                ],
            ),
            Episode::new("day2b", "Quoted \"title\"", vec![Marker::new(1, ":")]),
        ];

        let parsed = parse_index(&write_index(&episodes)).unwrap();
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.episodes, episodes);
    }

    #[test]
    fn test_newline_written_as_space() {
        let ep = Episode::new("day1", "T", vec![Marker::new(1, "two\nlines")]);
        let parsed = parse_index(&write_index(&[ep])).unwrap();
        assert_eq!(parsed.episodes[0].markers[0].text, "two lines");
    }
}
