//! Configuration for the annotation browser.

use crate::{CoreError, FileSource, HttpSource, IndexSource, ProjectSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Episode ordering within each project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Old to new
    #[default]
    Chronological,
    /// New to old
    Reverse,
}

impl SortOrder {
    /// The other ordering.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Chronological => SortOrder::Reverse,
            SortOrder::Reverse => SortOrder::Chronological,
        }
    }
}

/// Where to fetch index documents from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// HTTP GET, relative locations resolved against `origin`
    Http {
        #[serde(default)]
        origin: Option<String>,
    },
    /// Local directory tree
    File { root: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Http { origin: None }
    }
}

impl SourceConfig {
    /// Build the configured source.
    pub fn build(&self) -> Result<Arc<dyn IndexSource>, CoreError> {
        Ok(match self {
            SourceConfig::Http { origin: Some(origin) } => {
                Arc::new(HttpSource::with_origin(origin.clone())?)
            }
            SourceConfig::Http { origin: None } => Arc::new(HttpSource::new()?),
            SourceConfig::File { root } => Arc::new(FileSource::new(root.clone())),
        })
    }
}

/// Browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Projects in declaration order
    #[serde(default)]
    pub projects: Vec<ProjectSpec>,

    /// Render units emitted per scheduling turn
    #[serde(default = "default_render_budget")]
    pub render_budget: usize,

    /// Initial episode ordering
    #[serde(default)]
    pub order: SortOrder,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Index source
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_render_budget() -> usize {
    42
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cinera")
        .join("config.yaml")
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            render_budget: default_render_budget(),
            order: SortOrder::default(),
            log_level: default_log_level(),
            source: SourceConfig::default(),
        }
    }
}

impl BrowserConfig {
    /// Load configuration from the default location, falling back to defaults.
    ///
    /// A file that exists but cannot be used is returned alongside the
    /// defaults, so the caller can report it once logging is set up.
    pub fn load_or_default() -> (Self, Option<CoreError>) {
        Self::load_or_default_from(&default_config_path())
    }

    /// [`BrowserConfig::load_or_default`] for an explicit path
    pub fn load_or_default_from(path: &Path) -> (Self, Option<CoreError>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.render_budget == 0 {
            return Err(CoreError::Config("render_budget must be positive".into()));
        }
        if let Some(spec) = self.projects.iter().find(|p| p.id.is_empty()) {
            return Err(CoreError::Config(format!(
                "project with empty id (base_url {:?})",
                spec.base_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert_eq!(config.render_budget, 42);
        assert_eq!(config.order, SortOrder::Chronological);
        assert_eq!(config.source, SourceConfig::Http { origin: None });
    }

    #[test]
    fn test_config_serialization() {
        let config = BrowserConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: BrowserConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.render_budget, parsed.render_budget);
    }

    #[test]
    fn test_load_from_yaml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
projects:
  - id: hero
    base_url: https://example.org
    search_location: search
    player_location: episode
    theme: hero
  - id: chat
    hidden: true
render_budget: 10
order: reverse
source:
  kind: file
  root: /srv/annotations
"#,
        )
        .unwrap();

        let config = BrowserConfig::load_from(&path).unwrap();
        assert_eq!(config.projects.len(), 2);
        assert_eq!(config.projects[0].search_location, "search");
        assert!(config.projects[1].hidden);
        assert_eq!(config.projects[1].base_url, "");
        assert_eq!(config.render_budget, 10);
        assert_eq!(config.order, SortOrder::Reverse);
        assert_eq!(
            config.source,
            SourceConfig::File {
                root: PathBuf::from("/srv/annotations")
            }
        );
    }

    #[test]
    fn test_zero_budget_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        std::fs::write(&path, "render_budget: 0\n").unwrap();
        assert!(matches!(
            BrowserConfig::load_from(&path),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_load_or_default_reports_bad_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let (config, error) = BrowserConfig::load_or_default_from(&path);
        assert!(error.is_none());
        assert_eq!(config.render_budget, 42);

        std::fs::write(&path, "projects: [[[\n").unwrap();
        let (config, error) = BrowserConfig::load_or_default_from(&path);
        assert!(matches!(error, Some(CoreError::Config(_))));
        assert!(config.projects.is_empty());
    }

    #[test]
    fn test_http_source_forms() {
        let config: BrowserConfig =
            serde_yaml::from_str("source:\n  kind: http\n  origin: https://example.org\n")
                .unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Http {
                origin: Some("https://example.org".into())
            }
        );

        let config: BrowserConfig = serde_yaml::from_str("source:\n  kind: http\n").unwrap();
        assert_eq!(config.source, SourceConfig::Http { origin: None });

        let config: BrowserConfig = serde_yaml::from_str("render_budget: 5\n").unwrap();
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_sort_order_toggle() {
        assert_eq!(SortOrder::Chronological.toggled(), SortOrder::Reverse);
        assert_eq!(SortOrder::Reverse.toggled(), SortOrder::Chronological);
    }

    #[test]
    fn test_build_file_source() {
        let source = SourceConfig::File {
            root: PathBuf::from("."),
        };
        assert!(source.build().is_ok());
    }
}
