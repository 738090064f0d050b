//! Core error types for Cinera.

use thiserror::Error;

/// Errors while fetching a project's index document
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected status {0}")]
    Status(u16),

    /// IO error reading a local index
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Location cannot be resolved by this source
    #[error("Invalid index location: {0}")]
    InvalidLocation(String),
}

/// Errors that can occur in core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Index could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Index was fetched but nothing usable was in it
    #[error("Index error: {0}")]
    Index(#[from] cinera_index::IndexError),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No project at this position or with this id
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Load state change not allowed from the project's current state
    #[error("Project {project} cannot go from {from} to {to}")]
    InvalidTransition {
        project: String,
        from: String,
        to: &'static str,
    },
}
