//! Search execution over a corpus snapshot.
//!
//! Visible projects are scanned before hidden ones so the renderer, which
//! drains in order, fills the visible part of the display first. Both are
//! scanned in the same pass; hidden results are still rendered, just hidden.

use crate::aggregate::Totals;
use crate::query::Query;
use cinera_core::{ProjectSnapshot, ProjectSpec, SortOrder};
use cinera_index::{Episode, Marker};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// One matching marker and where the query hit in its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    /// Position of the marker within its episode
    pub marker_index: usize,
    /// Byte ranges of each match in the marker body
    pub spans: Vec<Range<usize>>,
}

/// The matched markers of one episode for one pass.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    /// Declaration position of the project
    pub project_index: usize,
    /// Project identity
    pub project: Arc<ProjectSpec>,
    /// Project visibility when the pass started
    pub filtered_out: bool,
    /// Matches in marker order
    pub matches: Vec<MarkerMatch>,
    episodes: Arc<[Episode]>,
    episode_index: usize,
}

impl MatchGroup {
    /// The episode these matches belong to.
    pub fn episode(&self) -> &Episode {
        &self.episodes[self.episode_index]
    }

    /// The marker a match refers to.
    pub fn marker(&self, m: &MarkerMatch) -> &Marker {
        &self.episode().markers[m.marker_index]
    }

    /// Group header plus one unit per matched marker.
    pub fn render_units(&self) -> usize {
        1 + self.matches.len()
    }
}

/// Everything one pass produced.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Groups in render order
    pub groups: Vec<MatchGroup>,
    /// Totals over `groups`
    pub totals: Totals,
}

impl SearchOutcome {
    /// Total render units across all groups.
    pub fn render_units(&self) -> usize {
        self.groups.iter().map(MatchGroup::render_units).sum()
    }
}

/// Scan every loaded project for `query`.
///
/// Output order: visible projects in declaration order, then hidden ones;
/// within a project, episodes per `order`. Projects that are not loaded are
/// skipped.
pub fn execute(projects: &[ProjectSnapshot], query: &Query, order: SortOrder) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();

    let visible = projects.iter().filter(|p| !p.filtered_out);
    let hidden = projects.iter().filter(|p| p.filtered_out);

    for project in visible.chain(hidden) {
        if !project.is_searchable() {
            continue;
        }
        scan_project(project, query, order, &mut outcome);
    }

    debug!(
        query = %query.raw(),
        groups = outcome.groups.len(),
        markers = outcome.totals.markers,
        "Search executed"
    );

    outcome
}

fn scan_project(
    project: &ProjectSnapshot,
    query: &Query,
    order: SortOrder,
    outcome: &mut SearchOutcome,
) {
    let count = project.episodes.len();
    let indices: Box<dyn Iterator<Item = usize>> = match order {
        SortOrder::Chronological => Box::new(0..count),
        SortOrder::Reverse => Box::new((0..count).rev()),
    };

    for episode_index in indices {
        let episode = &project.episodes[episode_index];
        let mut matches = Vec::new();

        for (marker_index, marker) in episode.markers.iter().enumerate() {
            let spans = query.find_spans(&marker.text);
            if spans.is_empty() {
                continue;
            }
            outcome
                .totals
                .add_marker(episode.marker_duration(marker_index));
            matches.push(MarkerMatch {
                marker_index,
                spans,
            });
        }

        if matches.is_empty() {
            continue;
        }

        outcome.totals.add_episode();
        outcome.groups.push(MatchGroup {
            project_index: project.index,
            project: project.spec.clone(),
            filtered_out: project.filtered_out,
            matches,
            episodes: project.episodes.clone(),
            episode_index,
        });
    }
}
