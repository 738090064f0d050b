//! Project identity and load state.

use cinera_index::Episode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Declared identity of one content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Project id; names the `{id}.index` file
    pub id: String,

    /// Site root, may be empty
    #[serde(default)]
    pub base_url: String,

    /// Directory holding the index, may be empty
    #[serde(default)]
    pub search_location: String,

    /// Directory holding the player pages, may be empty
    #[serde(default)]
    pub player_location: String,

    /// Theme tag handed through to the renderer
    #[serde(default)]
    pub theme: String,

    /// Start filtered out
    #[serde(default)]
    pub hidden: bool,
}

impl ProjectSpec {
    /// Create a spec with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: String::new(),
            search_location: String::new(),
            player_location: String::new(),
            theme: String::new(),
            hidden: false,
        }
    }

    /// `(base/)?(search/)?{id}.index`
    pub fn index_location(&self) -> String {
        format!(
            "{}{}{}.index",
            segment(&self.base_url),
            segment(&self.search_location),
            self.id
        )
    }

    /// `(base/)?(player/)?`
    pub fn player_url_prefix(&self) -> String {
        format!(
            "{}{}",
            segment(&self.base_url),
            segment(&self.player_location)
        )
    }

    /// Identity used to match visibility toggles against projects.
    pub fn key(&self) -> ProjectKey {
        ProjectKey {
            base_url: self.base_url.clone(),
            search_location: self.search_location.clone(),
            player_location: self.player_location.clone(),
        }
    }
}

fn segment(part: &str) -> String {
    if part.is_empty() {
        String::new()
    } else {
        format!("{}/", part)
    }
}

/// (base_url, search_location, player_location)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectKey {
    pub base_url: String,
    pub search_location: String,
    pub player_location: String,
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.base_url, self.search_location, self.player_location
        )
    }
}

/// Where a project is in its load lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "reason")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    /// Fetch or parse failed; excluded from search for good
    Errored(String),
}

impl LoadState {
    /// Still waiting for a fetch to finish.
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::Unloaded | LoadState::Loading)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Unloaded => write!(f, "unloaded"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::Loaded => write!(f, "loaded"),
            LoadState::Errored(_) => write!(f, "errored"),
        }
    }
}

/// A project as held in the corpus.
#[derive(Debug, Clone)]
pub struct Project {
    /// Declared identity
    pub spec: Arc<ProjectSpec>,

    /// Load lifecycle
    pub state: LoadState,

    /// Visibility, toggled by the UI
    pub filtered_out: bool,

    /// Episodes in chronological order; empty until loaded
    pub episodes: Arc<[Episode]>,
}

impl Project {
    /// Create an unloaded project.
    pub fn new(spec: ProjectSpec) -> Self {
        let filtered_out = spec.hidden;
        Self {
            spec: Arc::new(spec),
            state: LoadState::Unloaded,
            filtered_out,
            episodes: Arc::from(Vec::new()),
        }
    }
}
