//! Budgeted rendering of match groups.
//!
//! A [`RenderPass`] owns the groups of one search pass and drains them into a
//! [`RenderSink`] a turn at a time. Each turn emits at most `budget` render
//! units (one per group header, one per matched marker); the caller yields to
//! the host between turns. Dropping the pass abandons whatever was left.

use crate::aggregate::Summary;
use crate::executor::{MarkerMatch, MatchGroup};
use cinera_core::ProjectSpec;
use cinera_index::Marker;
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Render units per turn unless configured otherwise.
pub const DEFAULT_RENDER_BUDGET: usize = 42;

/// One run of marker body text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

/// A marker line ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarker<'a> {
    /// `(MM:SS)` or `(HH:MM:SS)`
    pub pretty_time: &'a str,
    /// Seconds into the episode
    pub timestamp: u64,
    /// Player link
    pub href: String,
    /// Body split into plain and highlighted runs
    pub segments: Vec<Segment<'a>>,
}

/// Which view the collaborator should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// No active query: show the full unfiltered index
    FullIndex,
    /// Active query: show results under this summary
    Results(Summary),
}

/// The rendering collaborator.
///
/// Calls arrive strictly in order: `reset`, `display`, then for each turn a
/// sequence of container, group and marker calls.
pub trait RenderSink {
    /// Discard everything rendered by earlier passes.
    fn reset(&mut self);

    /// Switch between the index view and the results view.
    fn display(&mut self, state: &DisplayState);

    /// Start a container for a project's groups.
    fn begin_project_container(&mut self, project: &ProjectSpec, hidden: bool);

    /// Start an episode group inside the current container.
    fn begin_episode_group(&mut self, label: &str);

    /// Append a marker line to the current group.
    fn emit_marker(&mut self, marker: &RenderedMarker<'_>);

    /// Number of projects still loading changed.
    fn loading(&mut self, _pending: usize) {}
}

/// Split `text` into plain and highlighted segments. `spans` must be sorted
/// and non-overlapping; concatenating the segments gives back `text`.
pub fn highlight<'a>(text: &'a str, spans: &[Range<usize>]) -> Vec<Segment<'a>> {
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;

    for span in spans {
        if span.start > cursor {
            segments.push(Segment {
                text: &text[cursor..span.start],
                highlighted: false,
            });
        }
        segments.push(Segment {
            text: &text[span.clone()],
            highlighted: true,
        });
        cursor = span.end;
    }

    if cursor < text.len() {
        segments.push(Segment {
            text: &text[cursor..],
            highlighted: false,
        });
    }

    segments
}

/// Result of one scheduling turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Budget hit with units left; schedule exactly one more turn
    Yield,
    /// Nothing left to render
    Finished,
}

/// One project's groups and the cursor into them.
#[derive(Debug)]
struct Lane {
    project_index: usize,
    spec: Arc<ProjectSpec>,
    player_url_prefix: String,
    filtered_out: bool,
    groups: Vec<MatchGroup>,
    cursor: usize,
}

/// Render state for a single search pass.
#[derive(Debug)]
pub struct RenderPass {
    lanes: Vec<Lane>,
    /// Lane being drained
    lane: usize,
    /// `None` until the current group's header is out
    marker_cursor: Option<usize>,
    /// Project of the most recently opened container
    last_project: Option<usize>,
    budget: usize,
    turns: usize,
    emitted: usize,
}

impl RenderPass {
    /// Create a pass over groups in render order. A zero budget is treated
    /// as one.
    pub fn new(groups: Vec<MatchGroup>, budget: usize) -> Self {
        let mut lanes: Vec<Lane> = Vec::new();

        for group in groups {
            match lanes.last_mut() {
                Some(lane) if lane.project_index == group.project_index => lane.groups.push(group),
                _ => lanes.push(Lane {
                    project_index: group.project_index,
                    spec: group.project.clone(),
                    player_url_prefix: group.project.player_url_prefix(),
                    filtered_out: group.filtered_out,
                    groups: vec![group],
                    cursor: 0,
                }),
            }
        }

        Self {
            lanes,
            lane: 0,
            marker_cursor: None,
            last_project: None,
            budget: budget.max(1),
            turns: 0,
            emitted: 0,
        }
    }

    /// Whether every unit has been emitted.
    pub fn is_finished(&self) -> bool {
        self.lanes[self.lane.min(self.lanes.len())..]
            .iter()
            .all(|lane| lane.cursor >= lane.groups.len())
    }

    /// Turns run so far
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Units emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Emit up to `budget` units into `sink`.
    pub fn turn(&mut self, sink: &mut dyn RenderSink) -> Turn {
        if self.is_finished() {
            return Turn::Finished;
        }

        let mut units = 0;

        while units < self.budget {
            let Some(lane) = self.lanes.get_mut(self.lane) else {
                break;
            };
            let Some(group) = lane.groups.get(lane.cursor) else {
                self.lane += 1;
                continue;
            };

            match self.marker_cursor {
                None => {
                    if self.last_project != Some(lane.project_index) {
                        sink.begin_project_container(&lane.spec, lane.filtered_out);
                        self.last_project = Some(lane.project_index);
                    }
                    sink.begin_episode_group(&group.episode().label());
                    self.marker_cursor = Some(0);
                    units += 1;
                }
                Some(index) => {
                    if let Some(m) = group.matches.get(index) {
                        let marker = group.marker(m);
                        sink.emit_marker(&rendered(group, marker, m, &lane.player_url_prefix));
                        units += 1;
                    }
                    self.marker_cursor = Some(index + 1);
                }
            }

            if self.marker_cursor.is_some_and(|i| i >= group.matches.len()) {
                self.marker_cursor = None;
                lane.cursor += 1;
            }
        }

        self.turns += 1;
        self.emitted += units;

        if self.is_finished() {
            debug!(turns = self.turns, units = self.emitted, "Render pass finished");
            Turn::Finished
        } else {
            Turn::Yield
        }
    }
}

fn rendered<'a>(
    group: &'a MatchGroup,
    marker: &'a Marker,
    m: &MarkerMatch,
    player_url_prefix: &str,
) -> RenderedMarker<'a> {
    RenderedMarker {
        pretty_time: &marker.pretty_time,
        timestamp: marker.timestamp,
        href: group.episode().player_href(player_url_prefix, marker),
        segments: highlight(&marker.text, &m.spans),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::execute;
    use crate::query::Query;
    use cinera_core::{Corpus, SortOrder};
    use cinera_index::parse_index;

    /// Records every call as one line.
    #[derive(Default)]
    struct Recorder {
        lines: Vec<String>,
    }

    impl RenderSink for Recorder {
        fn reset(&mut self) {
            self.lines.clear();
        }

        fn display(&mut self, state: &DisplayState) {
            self.lines.push(format!("display {:?}", state));
        }

        fn begin_project_container(&mut self, project: &ProjectSpec, hidden: bool) {
            self.lines.push(format!("container {} hidden={}", project.id, hidden));
        }

        fn begin_episode_group(&mut self, label: &str) {
            self.lines.push(format!("group {}", label));
        }

        fn emit_marker(&mut self, marker: &RenderedMarker<'_>) {
            let body: String = marker
                .segments
                .iter()
                .map(|s| {
                    if s.highlighted {
                        format!("[{}]", s.text)
                    } else {
                        s.text.to_string()
                    }
                })
                .collect();
            self.lines
                .push(format!("marker {} {} {}", marker.pretty_time, body, marker.href));
        }
    }

    fn episodes(count: usize, markers: usize) -> String {
        let mut doc = String::new();
        for e in 0..count {
            doc.push_str(&format!("name: day{}\ntitle: \"E{}\"\nmarkers:\n", e + 1, e + 1));
            for m in 0..markers {
                doc.push_str(&format!("\"{}\": \"hit {}\"\n", m * 10, m));
            }
            doc.push_str("---\n");
        }
        doc
    }

    fn groups(docs: &[(&str, String, bool)]) -> Vec<MatchGroup> {
        let corpus = Corpus::new(docs.iter().map(|(id, _, hidden)| {
            let mut spec = ProjectSpec::new(*id);
            spec.base_url = format!("https://{}.example", id);
            spec.player_location = "episode".into();
            spec.hidden = *hidden;
            spec
        }));
        for (i, (_, doc, _)) in docs.iter().enumerate() {
            corpus.install(i, parse_index(doc).unwrap()).unwrap();
        }
        let query = Query::compile("hit").unwrap();
        execute(&corpus.snapshot(), &query, SortOrder::Chronological).groups
    }

    fn drain(pass: &mut RenderPass, sink: &mut Recorder) -> usize {
        let mut turns = 0;
        loop {
            turns += 1;
            if pass.turn(sink) == Turn::Finished {
                return turns;
            }
        }
    }

    fn unit_lines(sink: &Recorder) -> Vec<&String> {
        sink.lines
            .iter()
            .filter(|l| l.starts_with("group") || l.starts_with("marker"))
            .collect()
    }

    #[test]
    fn test_highlight_segments() {
        let segments = highlight("hello world", &[6..11]);
        assert_eq!(
            segments,
            vec![
                Segment {
                    text: "hello ",
                    highlighted: false
                },
                Segment {
                    text: "world",
                    highlighted: true
                },
            ]
        );
    }

    #[test]
    fn test_highlight_reassembles() {
        let text = "aXbXXc";
        let segments = highlight(text, &[1..2, 3..5]);
        let joined: String = segments.iter().map(|s| s.text).collect();
        assert_eq!(joined, text);
        assert_eq!(segments.iter().filter(|s| s.highlighted).count(), 2);
    }

    #[test]
    fn test_highlight_no_spans() {
        assert_eq!(highlight("plain", &[]).len(), 1);
        assert!(highlight("", &[]).is_empty());
    }

    #[test]
    fn test_render_output_shape() {
        let mut pass = RenderPass::new(groups(&[("p", episodes(1, 2), false)]), 42);
        let mut sink = Recorder::default();
        assert_eq!(pass.turn(&mut sink), Turn::Finished);
        assert_eq!(
            sink.lines,
            vec![
                "container p hidden=false",
                "group Day 1: E1",
                "marker (00:00) [hit] 0 https://p.example/episode/day1/#0",
                "marker (00:10) [hit] 1 https://p.example/episode/day1/#10",
            ]
        );
    }

    #[test]
    fn test_turn_count_is_ceiling() {
        // 3 episodes x (1 header + 4 markers) = 15 units
        for budget in 1..=20 {
            let mut pass = RenderPass::new(groups(&[("p", episodes(3, 4), false)]), budget);
            let mut sink = Recorder::default();
            let turns = drain(&mut pass, &mut sink);
            assert_eq!(turns, (15 + budget - 1) / budget, "budget {}", budget);
            assert_eq!(pass.emitted(), 15);
            assert_eq!(pass.turns(), turns);
        }
    }

    #[test]
    fn test_batches_concatenate_to_full_sequence() {
        let docs = [("a", episodes(2, 3), false), ("b", episodes(3, 1), true)];

        let mut whole = RenderPass::new(groups(&docs), usize::MAX);
        let mut expected = Recorder::default();
        assert_eq!(whole.turn(&mut expected), Turn::Finished);

        let mut batched = RenderPass::new(groups(&docs), 4);
        let mut actual = Recorder::default();
        drain(&mut batched, &mut actual);

        assert_eq!(actual.lines, expected.lines);
    }

    #[test]
    fn test_budget_bounds_each_turn() {
        let mut pass = RenderPass::new(groups(&[("p", episodes(2, 5), false)]), 4);
        let mut sink = Recorder::default();

        assert_eq!(pass.turn(&mut sink), Turn::Yield);
        assert_eq!(unit_lines(&sink).len(), 4);
        assert_eq!(pass.turn(&mut sink), Turn::Yield);
        assert_eq!(unit_lines(&sink).len(), 8);
        assert_eq!(pass.turn(&mut sink), Turn::Finished);
        assert_eq!(unit_lines(&sink).len(), 12);
    }

    #[test]
    fn test_exact_budget_finishes() {
        // 1 header + 3 markers = 4 units
        let mut pass = RenderPass::new(groups(&[("p", episodes(1, 3), false)]), 4);
        let mut sink = Recorder::default();
        assert_eq!(pass.turn(&mut sink), Turn::Finished);
        assert_eq!(pass.turns(), 1);
    }

    #[test]
    fn test_one_container_per_project() {
        let docs = [("a", episodes(2, 1), false), ("b", episodes(2, 1), true)];
        let mut pass = RenderPass::new(groups(&docs), 1);
        let mut sink = Recorder::default();
        drain(&mut pass, &mut sink);

        let containers: Vec<_> = sink
            .lines
            .iter()
            .filter(|l| l.starts_with("container"))
            .collect();
        assert_eq!(containers, vec!["container a hidden=false", "container b hidden=true"]);
    }

    #[test]
    fn test_empty_pass() {
        let mut pass = RenderPass::new(Vec::new(), 42);
        assert!(pass.is_finished());
        let mut sink = Recorder::default();
        assert_eq!(pass.turn(&mut sink), Turn::Finished);
        assert_eq!(pass.turns(), 0);
        assert!(sink.lines.is_empty());
    }
}
