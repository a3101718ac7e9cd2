//! Dataset lists for coverage runs
//!
//! Supports:
//! - CSV manifests with one location per line or a "path" column (and optional "name"
//!   and "source" columns)
//! - JSON manifests with an array of locations or objects with a "path" field, either
//!   at the root or under a "datasets" key
//! - Directory discovery (every `.json` file, sorted by file name)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One dataset document to analyze.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetEntry {
    /// Display name used in reports
    pub name: String,
    /// Path or URL, resolved against the configured base
    pub location: String,
    /// Data source id whose spellings apply to this dataset
    #[serde(default)]
    pub source: Option<String>,
}

impl DatasetEntry {
    /// Create an entry named after the last segment of its location
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            name: default_name(&location),
            location,
            source: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

fn default_name(location: &str) -> String {
    location
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(location)
        .to_string()
}

/// Input format for manifest files
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref() {
            Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a dataset manifest (auto-detects format from extension)
pub fn parse_manifest(path: &Path) -> Result<Vec<DatasetEntry>> {
    let format = InputFormat::from_path(path).context(format!(
        "Cannot determine manifest format from file extension. Expected .csv or .json: {}",
        path.display()
    ))?;

    let content = fs::read_to_string(path)
        .context(format!("Failed to read manifest: {}", path.display()))?;

    match format {
        InputFormat::Csv => parse_csv_datasets(&content),
        InputFormat::Json => parse_json_datasets(&content),
    }
}

/// Parse datasets from CSV content
///
/// Either one location per line (no header; `#` comments skipped) or a header row
/// containing a "path" column.
pub fn parse_csv_datasets(content: &str) -> Result<Vec<DatasetEntry>> {
    let mut datasets = Vec::new();
    let Some(first_line) = content.lines().next() else {
        return Ok(datasets);
    };

    let has_header = first_line
        .split(',')
        .any(|h| h.trim().eq_ignore_ascii_case("path"));

    if has_header {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers().context("Failed to read CSV headers")?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let path_idx = column("path").context("CSV must have a 'path' column when using headers")?;
        let name_idx = column("name");
        let source_idx = column("source");

        for result in reader.records() {
            let record = result.context("Failed to parse CSV record")?;
            let field = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            };

            let Some(location) = field(Some(path_idx)) else {
                continue;
            };
            let mut entry = DatasetEntry::new(location);
            if let Some(name) = field(name_idx) {
                entry = entry.with_name(name);
            }
            entry.source = field(source_idx);
            datasets.push(entry);
        }
    } else {
        for line in content.lines() {
            let location = line.split(',').next().unwrap_or(line).trim();
            if location.is_empty() || location.starts_with('#') {
                continue;
            }
            datasets.push(DatasetEntry::new(location));
        }
    }

    Ok(datasets)
}

/// Parse datasets from JSON content
///
/// Supports three formats:
/// 1. Array of locations: ["gdp.json", "quiz.json"]
/// 2. Array of objects: [{"path": "gdp.json", "name": "GDP", "source": "worldbank"}]
/// 3. Object with "datasets" array holding either of the above
pub fn parse_json_datasets(content: &str) -> Result<Vec<DatasetEntry>> {
    let value: serde_json::Value = serde_json::from_str(content)
        .context("Failed to parse JSON content")?;

    match &value {
        serde_json::Value::Array(arr) => Ok(parse_json_array(arr)),
        serde_json::Value::Object(obj) => match obj.get("datasets") {
            Some(serde_json::Value::Array(arr)) => Ok(parse_json_array(arr)),
            Some(_) => bail!("'datasets' field must be an array"),
            None => bail!("JSON object must have a 'datasets' array field"),
        },
        _ => bail!("JSON must be an array of datasets or an object with 'datasets' field"),
    }
}

fn parse_json_array(arr: &[serde_json::Value]) -> Vec<DatasetEntry> {
    let mut entries = Vec::new();

    for item in arr {
        match item {
            serde_json::Value::String(location) => {
                let location = location.trim();
                if !location.is_empty() {
                    entries.push(DatasetEntry::new(location));
                }
            }
            serde_json::Value::Object(obj) => {
                let text = |key: &str| {
                    obj.get(key)
                        .and_then(|v| v.as_str())
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                };
                if let Some(location) = text("path") {
                    let mut entry = DatasetEntry::new(location);
                    if let Some(name) = text("name") {
                        entry = entry.with_name(name);
                    }
                    entry.source = text("source");
                    entries.push(entry);
                }
            }
            _ => {
                // Skip invalid entries
            }
        }
    }

    entries
}

/// Every `.json` file directly inside `dir`, sorted by file name.
///
/// Locations are file names relative to `dir`.
pub fn discover_directory(dir: &Path) -> Result<Vec<DatasetEntry>> {
    let mut datasets = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read: {:?}", dir))? {
        let path = entry?.path();
        if !path.is_file() || InputFormat::from_path(&path) != Some(InputFormat::Json) {
            continue;
        }
        if let Some(file_name) = path.file_name() {
            datasets.push(DatasetEntry::new(file_name.to_string_lossy()));
        }
    }
    datasets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(datasets)
}
