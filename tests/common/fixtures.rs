use countryresolver::{ReferenceCatalog, Resolver, SuggestionEngine};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn load_fixture(relative: &str) -> String {
    std::fs::read_to_string(fixture_path(relative))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", relative))
}

pub fn load_json_fixture<T: DeserializeOwned>(relative: &str) -> T {
    let content = load_fixture(relative);
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse JSON fixture {}: {}", relative, e))
}

/// The reference catalog shipped with the fixtures.
pub fn fixture_catalog() -> Arc<ReferenceCatalog> {
    let catalog = ReferenceCatalog::from_json_str(&load_fixture("country_reference.json"))
        .unwrap_or_else(|e| panic!("Fixture catalog should load: {}", e));
    Arc::new(catalog)
}

pub fn fixture_resolver() -> Resolver {
    Resolver::new(fixture_catalog())
}

pub fn fixture_suggester() -> SuggestionEngine {
    SuggestionEngine::new(fixture_catalog())
}

pub fn datasets_dir() -> PathBuf {
    fixture_path("datasets")
}
