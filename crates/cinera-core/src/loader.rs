//! Concurrent index loading.
//!
//! One task per project fetches and parses its index, then reports back on a
//! channel. Tasks never touch the corpus; the receiver applies each
//! [`LoadEvent`] so completions arriving in any order cannot race.

use crate::{Corpus, CoreError, IndexSource, LoadState};
use cinera_index::{IndexParser, ParsedIndex};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Outcome of loading one project.
#[derive(Debug)]
pub struct LoadEvent {
    /// Declaration position of the project
    pub index: usize,
    /// Parsed index, or why it could not be loaded
    pub result: Result<ParsedIndex, CoreError>,
}

/// Spawns index fetches.
pub struct Loader {
    source: Arc<dyn IndexSource>,
}

impl Loader {
    /// Create a loader over a source.
    pub fn new(source: Arc<dyn IndexSource>) -> Self {
        Self { source }
    }

    /// Fetch and parse one index document.
    pub async fn load(&self, location: &str) -> Result<ParsedIndex, CoreError> {
        load_from(self.source.as_ref(), location).await
    }

    /// Start a fetch for every unloaded project. Returns how many started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_all(&self, corpus: &Corpus, tx: mpsc::UnboundedSender<LoadEvent>) -> usize {
        let mut started = 0;

        for (index, spec) in corpus.specs().into_iter().enumerate() {
            if corpus.state(index) != Some(LoadState::Unloaded) {
                continue;
            }
            if corpus.mark_loading(index).is_err() {
                continue;
            }

            let source = self.source.clone();
            let tx = tx.clone();
            let location = spec.index_location();

            tokio::spawn(async move {
                let result = load_from(source.as_ref(), &location).await;
                debug!(project = %spec.id, ok = result.is_ok(), "Fetch finished");
                // Receiver gone means the session ended; nothing to report to.
                let _ = tx.send(LoadEvent { index, result });
            });

            started += 1;
        }

        info!(projects = started, "Started index fetches");
        started
    }
}

async fn load_from(source: &dyn IndexSource, location: &str) -> Result<ParsedIndex, CoreError> {
    let document = source.fetch(location).await?;
    Ok(IndexParser::new().parse(&document)?)
}
