//! Error types for catalog and dataset retrieval.

use thiserror::Error;

/// A reference catalog or dataset document could not be fetched or parsed.
///
/// For the catalog this is fatal: nothing can be resolved without it. For a dataset
/// document inside a coverage run it only excludes that document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request for {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request for {location} returned HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("Failed to parse {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid reference document {location}: {message}")]
    Schema { location: String, message: String },
}

impl LoadError {
    /// The path or URL the failure refers to.
    pub fn location(&self) -> &str {
        match self {
            LoadError::Io { location, .. }
            | LoadError::Http { location, .. }
            | LoadError::Status { location, .. }
            | LoadError::Parse { location, .. }
            | LoadError::Schema { location, .. } => location,
        }
    }

    pub(crate) fn schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Schema {
            location: location.into(),
            message: message.into(),
        }
    }
}
