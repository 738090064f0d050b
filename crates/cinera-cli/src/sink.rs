//! Terminal render sinks.

use cinera_core::{Corpus, ProjectSpec};
use cinera_search::{DisplayState, RenderSink, RenderedMarker, Summary};
use serde::Serialize;
use std::sync::Arc;

/// Plain-text output, one line per render unit.
///
/// Lines are buffered; with `stream` set they are also written to stdout as
/// they are produced and a reset prints a separator.
pub struct TextSink {
    corpus: Arc<Corpus>,
    lines: Vec<String>,
    stream: bool,
    show_hidden: bool,
    in_hidden: bool,
    pending: usize,
}

impl TextSink {
    pub fn new(corpus: Arc<Corpus>, stream: bool, show_hidden: bool) -> Self {
        Self {
            corpus,
            lines: Vec::new(),
            stream,
            show_hidden,
            in_hidden: false,
            pending: 0,
        }
    }

    /// Output of the most recent pass
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn push(&mut self, line: String) {
        if self.stream {
            println!("{}", line);
        }
        self.lines.push(line);
    }

    fn full_index(&mut self) {
        for project in self.corpus.snapshot() {
            if project.filtered_out && !self.show_hidden {
                continue;
            }
            if !project.is_searchable() {
                continue;
            }
            self.push(format!("== {} ==", project.spec.id));
            for episode in project.episodes.iter() {
                self.push(format!("  {} ({} markers)", episode.label(), episode.markers.len()));
            }
        }
    }
}

impl RenderSink for TextSink {
    fn reset(&mut self) {
        self.lines.clear();
        self.in_hidden = false;
        if self.stream {
            println!();
        }
    }

    fn display(&mut self, state: &DisplayState) {
        match state {
            DisplayState::FullIndex => self.full_index(),
            DisplayState::Results(summary) => self.push(summary.to_string()),
        }
        if self.pending > 0 {
            self.push(format!("({} projects still loading)", self.pending));
        }
    }

    fn begin_project_container(&mut self, project: &ProjectSpec, hidden: bool) {
        self.in_hidden = hidden && !self.show_hidden;
        if self.in_hidden {
            return;
        }
        let suffix = if hidden { " (hidden)" } else { "" };
        self.push(format!("== {}{} ==", project.id, suffix));
    }

    fn begin_episode_group(&mut self, label: &str) {
        if !self.in_hidden {
            self.push(format!("  {}", label));
        }
    }

    fn emit_marker(&mut self, marker: &RenderedMarker<'_>) {
        if self.in_hidden {
            return;
        }
        let body: String = marker
            .segments
            .iter()
            .map(|s| {
                if s.highlighted {
                    format!("*{}*", s.text)
                } else {
                    s.text.to_string()
                }
            })
            .collect();
        self.push(format!("    {} {}  <{}>", marker.pretty_time, body, marker.href));
    }

    fn loading(&mut self, pending: usize) {
        self.pending = pending;
    }
}

#[derive(Debug, Serialize)]
struct JsonMarker {
    timestamp: u64,
    pretty_time: String,
    href: String,
    text: String,
    highlights: Vec<String>,
}

#[derive(Debug, Serialize)]
struct JsonEpisode {
    label: String,
    markers: Vec<JsonMarker>,
}

#[derive(Debug, Serialize)]
struct JsonProject {
    id: String,
    hidden: bool,
    episodes: Vec<JsonEpisode>,
}

/// Machine-readable result of the last pass.
#[derive(Debug, Default, Serialize)]
pub struct JsonReport {
    query_active: bool,
    summary: Option<Summary>,
    projects: Vec<JsonProject>,
}

/// Collects the last pass into a [`JsonReport`].
#[derive(Default)]
pub struct JsonSink {
    report: JsonReport,
}

impl JsonSink {
    pub fn into_report(self) -> JsonReport {
        self.report
    }
}

impl RenderSink for JsonSink {
    fn reset(&mut self) {
        self.report = JsonReport::default();
    }

    fn display(&mut self, state: &DisplayState) {
        if let DisplayState::Results(summary) = state {
            self.report.query_active = true;
            self.report.summary = Some(*summary);
        }
    }

    fn begin_project_container(&mut self, project: &ProjectSpec, hidden: bool) {
        self.report.projects.push(JsonProject {
            id: project.id.clone(),
            hidden,
            episodes: Vec::new(),
        });
    }

    fn begin_episode_group(&mut self, label: &str) {
        if let Some(project) = self.report.projects.last_mut() {
            project.episodes.push(JsonEpisode {
                label: label.to_string(),
                markers: Vec::new(),
            });
        }
    }

    fn emit_marker(&mut self, marker: &RenderedMarker<'_>) {
        let Some(episode) = self
            .report
            .projects
            .last_mut()
            .and_then(|p| p.episodes.last_mut())
        else {
            return;
        };
        episode.markers.push(JsonMarker {
            timestamp: marker.timestamp,
            pretty_time: marker.pretty_time.to_string(),
            href: marker.href.clone(),
            text: marker.segments.iter().map(|s| s.text).collect(),
            highlights: marker
                .segments
                .iter()
                .filter(|s| s.highlighted)
                .map(|s| s.text.to_string())
                .collect(),
        });
    }
}
