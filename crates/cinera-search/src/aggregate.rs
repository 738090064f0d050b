//! Result-set statistics.

use crate::executor::MatchGroup;
use cinera_index::summary_time;
use serde::Serialize;
use std::fmt;

/// Running totals over one search pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Episodes with at least one matching marker
    pub episodes: usize,
    /// Matching markers
    pub markers: usize,
    /// Seconds covered by matching markers
    pub seconds: u64,
}

impl Totals {
    /// Count one matching marker and the time it covers. Saturates.
    pub fn add_marker(&mut self, covered_secs: u64) {
        self.markers = self.markers.saturating_add(1);
        self.seconds = self.seconds.saturating_add(covered_secs);
    }

    /// Count one contributing episode.
    pub fn add_episode(&mut self) {
        self.episodes = self.episodes.saturating_add(1);
    }

    /// Recompute totals from finished match groups.
    pub fn from_groups(groups: &[MatchGroup]) -> Self {
        let mut totals = Self::default();
        for group in groups {
            totals.add_episode();
            let episode = group.episode();
            for m in &group.matches {
                totals.add_marker(episode.marker_duration(m.marker_index));
            }
        }
        totals
    }

    /// Formatted summary line.
    pub fn summary(&self) -> Summary {
        Summary(*self)
    }
}

/// `Found: {episodes} episodes, {markers} markers, {H}h {M}m {S}s total.`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary(pub Totals);

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found: {} episodes, {} markers, {} total.",
            self.0.episodes,
            self.0.markers,
            summary_time(self.0.seconds)
        )
    }
}
