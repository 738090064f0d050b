//! Error types for search sessions.

use thiserror::Error;

/// Errors that can occur while driving a search session.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The session loop has stopped
    #[error("Search session closed")]
    SessionClosed,

    /// Corpus or loading error
    #[error("Core error: {0}")]
    Core(#[from] cinera_core::CoreError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
