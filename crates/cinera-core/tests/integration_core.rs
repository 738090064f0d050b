//! Integration tests for configuration, sources, loading and the corpus.

use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::mpsc;

use cinera_core::{BrowserConfig, Corpus, LoadState, Loader, SourceConfig};

const INDEX: &str = "name: day1\ntitle: \"Intro\"\nmarkers:\n\"10\": \"hello\"\n\"70\": \"world\"\n---\n";

/// Helper to lay out an index tree and a config pointing at it
fn create_site(base: &std::path::Path) -> std::path::PathBuf {
    let search = base.join("site").join("search");
    std::fs::create_dir_all(&search).unwrap();
    std::fs::write(search.join("hero.index"), INDEX).unwrap();
    std::fs::write(search.join("broken.index"), "<html>404</html>\n").unwrap();

    let config_path = base.join("config.yaml");
    std::fs::write(
        &config_path,
        format!(
            r#"
projects:
  - id: hero
    base_url: site
    search_location: search
    player_location: episode
  - id: broken
    base_url: site
    search_location: search
  - id: absent
    base_url: site
    search_location: search
    hidden: true
render_budget: 8
source:
  kind: file
  root: {}
"#,
            base.display()
        ),
    )
    .unwrap();

    config_path
}

#[tokio::test]
async fn test_config_to_loaded_corpus() {
    let temp_dir = tempdir().unwrap();
    let config_path = create_site(temp_dir.path());

    let config = BrowserConfig::load_from(&config_path).unwrap();
    assert_eq!(config.render_budget, 8);
    assert!(matches!(config.source, SourceConfig::File { .. }));

    let corpus = Corpus::new(config.projects.clone());
    let loader = Loader::new(config.source.build().unwrap());
    let (tx, mut rx) = mpsc::unbounded_channel();

    assert_eq!(loader.spawn_all(&corpus, tx), 3);
    assert_eq!(corpus.pending(), 3);

    for _ in 0..3 {
        let event = rx.recv().await.unwrap();
        corpus.apply(event).unwrap();
    }

    assert_eq!(corpus.pending(), 0);
    assert_eq!(corpus.state(0), Some(LoadState::Loaded));
    assert!(matches!(corpus.state(1), Some(LoadState::Errored(_))));
    assert!(matches!(corpus.state(2), Some(LoadState::Errored(_))));

    let snapshot = corpus.snapshot();
    assert!(snapshot[0].is_searchable());
    assert_eq!(snapshot[0].episodes.len(), 1);
    assert_eq!(snapshot[0].spec.player_url_prefix(), "site/episode/");
    assert!(snapshot[2].filtered_out);
    assert!(!snapshot[1].is_searchable());
}

#[tokio::test]
async fn test_settled_projects_not_refetched() {
    let temp_dir = tempdir().unwrap();
    let config_path = create_site(temp_dir.path());
    let config = BrowserConfig::load_from(&config_path).unwrap();

    let corpus = Arc::new(Corpus::new(config.projects.clone()));
    let loader = Loader::new(config.source.build().unwrap());

    let (tx, mut rx) = mpsc::unbounded_channel();
    loader.spawn_all(&corpus, tx.clone());
    for _ in 0..3 {
        corpus.apply(rx.recv().await.unwrap()).unwrap();
    }

    assert_eq!(loader.spawn_all(&corpus, tx), 0);
}

#[tokio::test]
async fn test_load_single_location() {
    let temp_dir = tempdir().unwrap();
    create_site(temp_dir.path());
    let loader = Loader::new(
        SourceConfig::File {
            root: temp_dir.path().to_path_buf(),
        }
        .build()
        .unwrap(),
    );

    let parsed = loader.load("site/search/hero.index").await.unwrap();
    assert_eq!(parsed.episodes[0].title, "Intro");
    assert!(loader.load("../etc/passwd").await.is_err());
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.yaml");
    std::fs::write(&path, "render_budget: 0\n").unwrap();
    assert!(BrowserConfig::load_from(&path).is_err());

    std::fs::write(&path, "projects: [[[\n").unwrap();
    assert!(BrowserConfig::load_from(&path).is_err());
}
