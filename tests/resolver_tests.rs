mod common;

use common::fixtures::{fixture_catalog, fixture_resolver, fixture_suggester};
use countryresolver::{MatchKind, Tier};

// ============ Resolve ============

#[test]
fn test_common_alias_wins() {
    let resolver = fixture_resolver();
    let resolution = resolver.resolve_detailed("USA", None).unwrap();
    assert_eq!(resolution.name(), "United States");
    assert_eq!(resolution.matched_by, MatchKind::CommonAlias);
    assert_eq!(resolver.resolve("Korea, South", None), Some("South Korea"));
}

#[test]
fn test_common_aliases_and_codes_are_case_sensitive() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve("usa", None), None);
    assert_eq!(resolver.resolve("us", None), None);
    assert_eq!(resolver.resolve("US", None), Some("United States"));
    assert_eq!(resolver.resolve("GBR", None), Some("United Kingdom"));
}

#[test]
fn test_names_and_aliases_ignore_case() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve("FRANCE", None), Some("France"));
    assert_eq!(resolver.resolve("united states of america", None), Some("United States"));
    assert_eq!(resolver.resolve("holy see", None), Some("Vatican City"));
    assert_eq!(resolver.resolve("Hong Kong (CN)", None), Some("Hong Kong"));
    assert_eq!(resolver.resolve("Côte d'Ivoire", None), Some("Ivory Coast"));
}

#[test]
fn test_blank_and_missing_tokens() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve("", None), None);
    assert_eq!(resolver.resolve("   ", None), None);
    assert_eq!(resolver.resolve_optional(None, None), None);
    assert_eq!(resolver.resolve_optional(Some("  Peru "), None), Some("Peru"));
}

#[test]
fn test_unknown_token() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve("Ruritania", None), None);
    assert_eq!(resolver.resolve("Euro area", Some("worldbank")), None);
}

#[test]
fn test_source_spellings_need_matching_source() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve("Korea, Rep.", None), None);
    assert_eq!(resolver.resolve("Korea, Rep.", Some("imf")), None);

    let resolution = resolver.resolve_detailed("Korea, Rep.", Some("worldbank")).unwrap();
    assert_eq!(resolution.name(), "South Korea");
    assert_eq!(resolution.matched_by, MatchKind::SourceName);

    assert_eq!(resolver.resolve("korea", Some("imf")), Some("South Korea"));
    assert_eq!(
        resolver.resolve("Hong Kong SAR, China", Some("worldbank")),
        Some("Hong Kong")
    );
    assert_eq!(resolver.resolve("Korea", Some("no-such-source")), None);
}

#[test]
fn test_resolution_is_deterministic() {
    let resolver = fixture_resolver();
    let tokens = ["USA", "Deutschland", "Hong Kong (CN)", "Narnia", "korea"];
    let first: Vec<Option<String>> = tokens
        .iter()
        .map(|t| resolver.resolve(t, Some("imf")).map(str::to_string))
        .collect();
    for _ in 0..3 {
        let again: Vec<Option<String>> = tokens
            .iter()
            .map(|t| resolver.resolve(t, Some("imf")).map(str::to_string))
            .collect();
        assert_eq!(first, again);
    }
}

#[test]
fn test_resolved_name_is_always_canonical() {
    let catalog = fixture_catalog();
    let resolver = fixture_resolver();
    let canonical: Vec<&str> = catalog.iterate().map(|e| e.country.name.as_str()).collect();
    for token in ["USA", "UK", "Vatican", "DPRK", "Brasil", "PRC", "HKG", "GL"] {
        let name = resolver.resolve(token, None).unwrap();
        assert!(canonical.contains(&name), "{} resolved to non-canonical {}", token, name);
    }
}

// ============ Companion lookups ============

#[test]
fn test_companions_match_canonical_name_only() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve_iso2("south korea"), Some("KR"));
    assert_eq!(resolver.resolve_iso3("South Korea"), Some("KOR"));
    assert_eq!(resolver.resolve_iso3("Korea, South"), None);
    assert_eq!(resolver.resolve_iso3("Republic of Korea"), None);
    assert_eq!(resolver.resolve_iso2("KR"), None);
}

#[test]
fn test_iso2_falls_back_to_catalog_key() {
    let resolver = fixture_resolver();
    assert_eq!(resolver.resolve_iso2("Greenland"), Some("GL"));
    assert_eq!(resolver.resolve("GL", None), Some("Greenland"));
}

#[test]
fn test_aliases_and_source_names() {
    let resolver = fixture_resolver();
    let aliases = resolver.resolve_aliases("North Korea").unwrap();
    assert_eq!(aliases[0], "Democratic People's Republic of Korea");
    assert!(aliases.iter().any(|a| a == "DPRK"));
    assert_eq!(resolver.resolve_aliases("Japan"), Some(&[][..]));
    assert_eq!(resolver.resolve_aliases("Atlantis"), None);

    assert_eq!(resolver.resolve_source_name("South Korea", "worldbank"), Some("Korea, Rep."));
    assert_eq!(resolver.resolve_source_name("France", "worldbank"), None);
}

// ============ Catalog / suggestions ============

#[test]
fn test_fixture_catalog_tiers() {
    let catalog = fixture_catalog();
    let stats = catalog.stats();
    assert_eq!(stats.sovereign, 14);
    assert_eq!(stats.microstates, 3);
    assert_eq!(stats.territories, 3);
    assert_eq!(stats.common_aliases, 5);
    assert_eq!(catalog.len(), 20);

    let tiers: Vec<Tier> = catalog.iterate().map(|e| e.tier).collect();
    let mut sorted = tiers.clone();
    sorted.sort_by_key(|t| Tier::ALL.iter().position(|x| x == t));
    assert_eq!(tiers, sorted, "catalog iterates sovereign, microstates, territories");
}

#[test]
fn test_suggestions_for_partial_tokens() {
    let suggester = fixture_suggester();
    let names: Vec<String> = suggester.suggest("Korea").into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["South Korea", "North Korea"]);

    let egypt = suggester.suggest("Egypt, Arab Rep.");
    assert_eq!(egypt.len(), 1);
    assert_eq!(egypt[0].iso2, "EG");

    // Territories and microstates are never proposed
    assert!(suggester.suggest("Monaco-Ville").is_empty());
    assert!(suggester.suggest("   ").is_empty());
}

#[test]
fn test_suggestion_limit() {
    let suggester = fixture_suggester().with_limit(1);
    assert_eq!(suggester.suggest("Korea").len(), 1);
    assert!(fixture_suggester().with_limit(0).suggest("Korea").is_empty());
}
