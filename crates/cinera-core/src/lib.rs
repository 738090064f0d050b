//! Cinera Core Components
//!
//! This crate provides the project layer of the annotation browser,
//! including project identity, the in-memory corpus, index sources and
//! loading, and configuration.

mod config;
mod corpus;
mod error;
mod loader;
mod project;
mod source;

pub use config::{BrowserConfig, SortOrder, SourceConfig};
pub use corpus::{Corpus, ProjectSnapshot};
pub use error::{CoreError, FetchError};
pub use loader::{LoadEvent, Loader};
pub use project::{LoadState, Project, ProjectKey, ProjectSpec};
pub use source::{FileSource, HttpSource, IndexSource};
