//! Near-match suggestions for tokens the resolver could not place.
//!
//! Candidates come from the sovereign tier only. A country is proposed when the
//! lowercased query contains its name (or an alias), or is contained in it. There is
//! no scoring: matches keep catalog order and the list is cut at the limit.

use crate::catalog::{ReferenceCatalog, Tier};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Suggestion {
    pub name: String,
    pub iso2: String,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.iso2)
    }
}

/// `Name (ISO2)` for each suggestion, joined by `separator`.
pub fn format_suggestions(suggestions: &[Suggestion], separator: &str) -> String {
    suggestions
        .iter()
        .map(Suggestion::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    catalog: Arc<ReferenceCatalog>,
    limit: usize,
}

impl SuggestionEngine {
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        Self {
            catalog,
            limit: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn suggest(&self, raw: &str) -> Vec<Suggestion> {
        let query = raw.to_lowercase();

        self.catalog
            .tier(Tier::Sovereign)
            .filter(|entry| {
                let country = &entry.country;
                overlaps(&query, &country.name.to_lowercase())
                    || country
                        .aliases
                        .iter()
                        .any(|alias| overlaps(&query, &alias.to_lowercase()))
            })
            .take(self.limit)
            .map(|entry| Suggestion {
                name: entry.country.name.clone(),
                iso2: entry.country.iso2.clone(),
            })
            .collect()
    }
}

fn overlaps(query: &str, candidate: &str) -> bool {
    candidate.contains(query) || query.contains(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "countries": {
            "KR": { "iso2": "KR", "iso3": "KOR", "name": "South Korea", "aliases": ["Republic of Korea"] },
            "KP": { "iso2": "KP", "iso3": "PRK", "name": "North Korea", "aliases": ["DPRK"] },
            "NE": { "iso2": "NE", "iso3": "NER", "name": "Niger" },
            "NG": { "iso2": "NG", "iso3": "NGA", "name": "Nigeria" },
            "GN": { "iso2": "GN", "iso3": "GIN", "name": "Guinea" },
            "GW": { "iso2": "GW", "iso3": "GNB", "name": "Guinea-Bissau" },
            "GQ": { "iso2": "GQ", "iso3": "GNQ", "name": "Equatorial Guinea" },
            "PG": { "iso2": "PG", "iso3": "PNG", "name": "Papua New Guinea" }
        },
        "special_cases": {
            "territories": { "XK": { "iso2": "XK", "iso3": "XKX", "name": "Korea Special Zone" } }
        }
    }"#;

    fn engine() -> SuggestionEngine {
        SuggestionEngine::new(Arc::new(ReferenceCatalog::from_json_str(CATALOG).unwrap()))
    }

    #[test]
    fn test_query_contained_in_name() {
        let names: Vec<String> = engine().suggest("Korea").into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["South Korea", "North Korea"]);
    }

    #[test]
    fn test_suggestions_exclude_special_cases() {
        let suggestions = engine().suggest("korea special");
        assert!(suggestions.iter().all(|s| s.iso2 != "XK"));
    }

    #[test]
    fn test_name_contained_in_query() {
        let suggestions = engine().suggest("Republic of Niger");
        assert_eq!(
            suggestions,
            vec![Suggestion { name: "Niger".to_string(), iso2: "NE".to_string() }]
        );
    }

    #[test]
    fn test_alias_match() {
        let suggestions = engine().suggest("dprk (north)");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].iso2, "KP");
    }

    #[test]
    fn test_truncated_to_three_in_catalog_order() {
        let names: Vec<String> = engine().suggest("guinea").into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Guinea", "Guinea-Bissau", "Equatorial Guinea"]);
    }

    #[test]
    fn test_custom_limit() {
        assert_eq!(engine().with_limit(1).suggest("guinea").len(), 1);
        assert_eq!(engine().with_limit(10).suggest("guinea").len(), 4);
    }

    #[test]
    fn test_display_includes_iso2() {
        let suggestions = engine().suggest("Korea");
        assert_eq!(suggestions[0].to_string(), "South Korea (KR)");
        assert_eq!(format_suggestions(&suggestions, ", "), "South Korea (KR), North Korea (KP)");
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(engine().suggest("Ruritania").is_empty());
    }

    #[test]
    fn test_empty_query_matches_every_name() {
        // "" is a substring of every name, so the first sovereign entries come back
        let names: Vec<String> = engine().suggest("").into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["South Korea", "North Korea", "Niger"]);
    }

    #[test]
    fn test_every_suggestion_overlaps_query() {
        for s in engine().suggest("Korea") {
            let name = s.name.to_lowercase();
            assert!(name.contains("korea") || "korea".contains(&name));
        }
    }
}
