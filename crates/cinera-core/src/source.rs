//! Where index documents come from.

use crate::FetchError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Fetches the raw text of an index document.
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Fetch the document at `location` (see
    /// [`crate::ProjectSpec::index_location`]).
    async fn fetch(&self, location: &str) -> Result<String, FetchError>;
}

/// Plain GET over HTTP(S).
pub struct HttpSource {
    client: reqwest::Client,
    /// Prepended to relative locations
    origin: Option<String>,
}

impl HttpSource {
    /// Create a source that only accepts absolute URLs.
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            origin: None,
        })
    }

    /// Create a source that resolves relative locations against `origin`.
    pub fn with_origin(origin: impl Into<String>) -> Result<Self, FetchError> {
        Ok(Self {
            origin: Some(origin.into()),
            ..Self::new()?
        })
    }

    /// Absolute URL for a location.
    pub fn resolve(&self, location: &str) -> Result<String, FetchError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(location.to_string());
        }
        match &self.origin {
            Some(origin) => Ok(format!(
                "{}/{}",
                origin.trim_end_matches('/'),
                location.trim_start_matches('/')
            )),
            None => Err(FetchError::InvalidLocation(location.to_string())),
        }
    }
}

#[async_trait]
impl IndexSource for HttpSource {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let url = self.resolve(location)?;
        debug!(url = %url, "Fetching index");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Reads index documents from a local directory tree.
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for a location, refusing anything that escapes the root.
    pub fn resolve(&self, location: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(location.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || location.contains("://") {
            return Err(FetchError::InvalidLocation(location.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl IndexSource for FileSource {
    async fn fetch(&self, location: &str) -> Result<String, FetchError> {
        let path = self.resolve(location)?;
        debug!(path = ?path, "Reading index");
        Ok(tokio::fs::read_to_string(&path).await?)
    }
}
