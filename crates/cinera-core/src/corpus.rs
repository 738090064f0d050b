//! In-memory corpus of projects.
//!
//! Holds every declared project in declaration order along with its load
//! state and visibility. Search passes never read the corpus directly; they
//! take a [`ProjectSnapshot`] list at the start of the pass.

use crate::{CoreError, LoadEvent, LoadState, Project, ProjectKey, ProjectSpec};
use cinera_index::{Episode, ParsedIndex};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Read-only view of one project for a single search pass.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    /// Declaration position
    pub index: usize,
    /// Declared identity
    pub spec: Arc<ProjectSpec>,
    /// Visibility at snapshot time
    pub filtered_out: bool,
    /// Load state at snapshot time
    pub state: LoadState,
    /// Episodes, empty unless loaded
    pub episodes: Arc<[Episode]>,
}

impl ProjectSnapshot {
    /// Only loaded projects take part in search.
    pub fn is_searchable(&self) -> bool {
        self.state == LoadState::Loaded
    }
}

/// Manages all known projects.
pub struct Corpus {
    projects: RwLock<Vec<Project>>,
}

impl Corpus {
    /// Create a corpus of unloaded projects.
    pub fn new(specs: impl IntoIterator<Item = ProjectSpec>) -> Self {
        Self {
            projects: RwLock::new(specs.into_iter().map(Project::new).collect()),
        }
    }

    /// Number of declared projects
    pub fn len(&self) -> usize {
        self.projects.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.projects.read().is_empty()
    }

    /// Declared specs, in order
    pub fn specs(&self) -> Vec<Arc<ProjectSpec>> {
        self.projects.read().iter().map(|p| p.spec.clone()).collect()
    }

    /// Position of the project with this id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.projects.read().iter().position(|p| p.spec.id == id)
    }

    /// Load state of one project
    pub fn state(&self, index: usize) -> Option<LoadState> {
        self.projects.read().get(index).map(|p| p.state.clone())
    }

    /// Number of projects still waiting on a fetch
    pub fn pending(&self) -> usize {
        self.projects
            .read()
            .iter()
            .filter(|p| p.state.is_pending())
            .count()
    }

    /// Mark a project as having a fetch in flight. Only an unloaded project
    /// can start a fetch.
    pub fn mark_loading(&self, index: usize) -> Result<(), CoreError> {
        let mut projects = self.projects.write();
        let project = projects
            .get_mut(index)
            .ok_or_else(|| CoreError::ProjectNotFound(index.to_string()))?;
        if project.state != LoadState::Unloaded {
            return Err(CoreError::InvalidTransition {
                project: project.spec.id.clone(),
                from: project.state.to_string(),
                to: "loading",
            });
        }
        project.state = LoadState::Loading;
        Ok(())
    }

    /// Replace a project's episodes with a freshly parsed index.
    ///
    /// An errored project stays errored.
    pub fn install(&self, index: usize, parsed: ParsedIndex) -> Result<usize, CoreError> {
        let mut projects = self.projects.write();
        let project = projects
            .get_mut(index)
            .ok_or_else(|| CoreError::ProjectNotFound(index.to_string()))?;

        if matches!(project.state, LoadState::Errored(_)) {
            return Err(CoreError::InvalidTransition {
                project: project.spec.id.clone(),
                from: project.state.to_string(),
                to: "loaded",
            });
        }

        if !parsed.warnings.is_empty() {
            warn!(
                project = %project.spec.id,
                warnings = parsed.warnings.len(),
                first = %parsed.warnings[0],
                "Index parsed with warnings"
            );
        }

        let count = parsed.episodes.len();
        project.episodes = Arc::from(parsed.episodes);
        project.state = LoadState::Loaded;

        info!(project = %project.spec.id, episodes = count, "Project loaded");
        Ok(count)
    }

    /// Exclude a project from search for the rest of the session.
    pub fn mark_errored(&self, index: usize, reason: impl Into<String>) -> Result<(), CoreError> {
        let mut projects = self.projects.write();
        let project = projects
            .get_mut(index)
            .ok_or_else(|| CoreError::ProjectNotFound(index.to_string()))?;
        let reason = reason.into();
        warn!(project = %project.spec.id, reason = %reason, "Project failed to load");
        project.state = LoadState::Errored(reason);
        project.episodes = Arc::from(Vec::new());
        Ok(())
    }

    /// Record the outcome of a fetch.
    pub fn apply(&self, event: LoadEvent) -> Result<(), CoreError> {
        match event.result {
            Ok(parsed) => self.install(event.index, parsed).map(|_| ()),
            Err(e) => self.mark_errored(event.index, e.to_string()),
        }
    }

    /// Set visibility on every project sharing `key`. Returns how many
    /// projects matched.
    pub fn set_filtered_out(&self, key: &ProjectKey, filtered_out: bool) -> usize {
        let mut projects = self.projects.write();
        let mut matched = 0;
        for project in projects.iter_mut().filter(|p| &p.spec.key() == key) {
            project.filtered_out = filtered_out;
            matched += 1;
        }
        debug!(key = %key, filtered_out, matched, "Visibility changed");
        matched
    }

    /// Set visibility of one project by id.
    pub fn set_filtered_out_by_id(&self, id: &str, filtered_out: bool) -> Result<(), CoreError> {
        let key = {
            let projects = self.projects.read();
            projects
                .iter()
                .find(|p| p.spec.id == id)
                .map(|p| p.spec.key())
                .ok_or_else(|| CoreError::ProjectNotFound(id.to_string()))?
        };
        self.set_filtered_out(&key, filtered_out);
        Ok(())
    }

    /// Capture every project for one search pass.
    pub fn snapshot(&self) -> Vec<ProjectSnapshot> {
        self.projects
            .read()
            .iter()
            .enumerate()
            .map(|(index, p)| ProjectSnapshot {
                index,
                spec: p.spec.clone(),
                filtered_out: p.filtered_out,
                state: p.state.clone(),
                episodes: p.episodes.clone(),
            })
            .collect()
    }
}
