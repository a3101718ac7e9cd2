//! Document retrieval: turns a path or URL into a parsed JSON document.
//!
//! The core only depends on [`DocumentSource`]; [`DocumentFetcher`] is the stock
//! implementation backed by the local filesystem and reqwest.

use crate::config::HttpConfig;
use crate::error::LoadError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Something that can turn a location into a parsed document, or fail.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Value, LoadError>;
}

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Fetches documents from disk or over HTTP(S).
///
/// Relative locations are resolved against `base`, which may itself be a directory
/// or a URL prefix.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: reqwest::Client,
    base: Option<String>,
}

impl DocumentFetcher {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.request_timeout_secs))
            .user_agent(&http.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base: None })
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.base = if base.is_empty() { None } else { Some(base) };
        self
    }

    /// Resolve a dataset location against the configured base.
    pub fn resolve_location(&self, location: &str) -> String {
        if is_url(location) {
            return location.to_string();
        }
        match &self.base {
            Some(base) if is_url(base) => {
                format!("{}/{}", base.trim_end_matches('/'), location.trim_start_matches('/'))
            }
            // Absolute paths only bypass a filesystem base
            _ if Path::new(location).is_absolute() => location.to_string(),
            Some(base) => PathBuf::from(base).join(location).to_string_lossy().into_owned(),
            None => location.to_string(),
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<String, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LoadError::Http {
                location: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(LoadError::Status {
                location: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|source| LoadError::Http {
            location: url.to_string(),
            source,
        })
    }

    async fn fetch_file(&self, path: &str) -> Result<String, LoadError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                location: path.to_string(),
                source,
            })
    }
}

#[async_trait]
impl DocumentSource for DocumentFetcher {
    async fn fetch(&self, location: &str) -> Result<Value, LoadError> {
        let resolved = self.resolve_location(location);
        debug!("Fetching document: {}", resolved);

        let body = if is_url(&resolved) {
            self.fetch_url(&resolved).await?
        } else {
            self.fetch_file(&resolved).await?
        };

        serde_json::from_str(&body).map_err(|source| LoadError::Parse {
            location: resolved,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> DocumentFetcher {
        DocumentFetcher::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/data.json"));
        assert!(is_url("http://localhost:8080/x.json"));
        assert!(!is_url("data/countries.json"));
        assert!(!is_url("ftp://example.com/x.json"));
    }

    #[test]
    fn test_resolve_location_without_base() {
        assert_eq!(fetcher().resolve_location("data/a.json"), "data/a.json");
    }

    #[test]
    fn test_resolve_location_against_directory() {
        let f = fetcher().with_base("datasets");
        let resolved = f.resolve_location("gdp.json");
        assert_eq!(PathBuf::from(resolved), PathBuf::from("datasets").join("gdp.json"));
    }

    #[test]
    fn test_resolve_location_against_url_base() {
        let f = fetcher().with_base("https://example.com/data/");
        assert_eq!(f.resolve_location("/gdp.json"), "https://example.com/data/gdp.json");
        assert_eq!(
            f.resolve_location("https://other.org/x.json"),
            "https://other.org/x.json"
        );
    }

    #[test]
    fn test_absolute_path_ignores_directory_base() {
        let absolute = std::env::temp_dir().join("gdp.json");
        let absolute = absolute.to_string_lossy().into_owned();
        let f = fetcher().with_base("datasets");
        assert_eq!(f.resolve_location(&absolute), absolute);
        assert_eq!(fetcher().resolve_location(&absolute), absolute);
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_io_error() {
        let err = fetcher().fetch("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert_eq!(err.location(), "/definitely/not/here.json");
    }

    #[tokio::test]
    async fn test_fetch_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = fetcher().fetch(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
