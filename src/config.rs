//! Configuration management for countryresolver
//!
//! Configuration is loaded from `./config/countryresolver.toml` unless another path is
//! given. The embedded template below is what `--init` writes.

use serde::Deserialize;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/countryresolver.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/countryresolver.toml");

/// File name of the sample catalog written beside a fresh config
pub const DEFAULT_CATALOG_FILE: &str = "country_reference.json";

/// Sample reference catalog the default config points at
pub const DEFAULT_CATALOG: &str = include_str!("../config/country_reference.json");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the reference catalog lives
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub location: String,
}

/// Dataset retrieval settings for coverage runs
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetsConfig {
    #[serde(default)]
    pub base_dir: String,
    #[serde(default)]
    pub manifest: String,
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_parallelism() -> usize {
    8
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            base_dir: String::new(),
            manifest: String::new(),
            parallelism: default_parallelism(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("countryresolver/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Coverage report settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_top_n() -> usize {
    20
}

fn default_max_suggestions() -> usize {
    crate::suggest::DEFAULT_MAX_SUGGESTIONS
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_suggestions: default_max_suggestions(),
            format: default_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.location.trim().is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "catalog.location".to_string(),
            });
        }
        if self.catalog.location.contains("://") && !crate::fetch::is_url(&self.catalog.location) {
            return Err(ConfigError::InvalidUrl {
                field: "catalog.location".to_string(),
                url: self.catalog.location.clone(),
            });
        }

        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "http.request_timeout_secs".to_string(),
            });
        }

        if self.datasets.parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                field: "datasets.parallelism".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        if self.report.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.top_n".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if crate::report::ReportFormat::parse(&self.report.format).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "report.format".to_string(),
                message: format!("unknown format '{}' (expected text, json, csv or markdown)", self.report.format),
            });
        }

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        Self::create_default_config_at(Path::new(CONFIG_PATH))
    }

    pub fn create_default_config_at(path: &Path) -> Result<PathBuf, ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        // Never overwrite a catalog the user already maintains
        let catalog_path = path.with_file_name(DEFAULT_CATALOG_FILE);
        if !catalog_path.exists() {
            fs::write(&catalog_path, DEFAULT_CATALOG)?;
        }

        Ok(path.to_path_buf())
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        io::stdin().is_terminal()
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config() -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config()?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}
