//! Country identity resolution
//!
//! Resolution order for a raw token:
//! 1. Empty or blank input never resolves
//! 2. The trimmed token is looked up verbatim in the catalog's common aliases
//! 3. Otherwise the first catalog entry (in tier order) matching the token wins, where
//!    an entry matches on its iso2/iso3 (exact), its canonical name, any alias, or the
//!    requested data source's spelling (all three case-insensitive)
//!
//! Rather than scanning the catalog per call, every matchable string is indexed once
//! to the lowest catalog ordinal carrying it. Taking the smallest ordinal across the
//! hits gives the same answer a front-to-back scan would.

use crate::catalog::{CatalogEntry, ReferenceCatalog};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which test decided a resolution. Declaration order is test priority.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    CommonAlias,
    Code,
    Name,
    Alias,
    SourceName,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchKind::CommonAlias => "common alias",
            MatchKind::Code => "iso code",
            MatchKind::Name => "canonical name",
            MatchKind::Alias => "alias",
            MatchKind::SourceName => "data source name",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub entry: &'a CatalogEntry,
    pub matched_by: MatchKind,
}

impl<'a> Resolution<'a> {
    pub fn name(&self) -> &'a str {
        &self.entry.country.name
    }
}

#[derive(Debug)]
pub struct Resolver {
    catalog: Arc<ReferenceCatalog>,
    /// iso2 and iso3 codes, case-sensitive
    codes: HashMap<String, usize>,
    /// lowercased canonical names
    names: HashMap<String, usize>,
    /// lowercased aliases
    aliases: HashMap<String, usize>,
    /// source id -> lowercased source spelling -> ordinal
    source_names: HashMap<String, HashMap<String, usize>>,
}

impl Resolver {
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        let mut codes = HashMap::new();
        let mut names = HashMap::new();
        let mut aliases = HashMap::new();
        let mut source_names: HashMap<String, HashMap<String, usize>> = HashMap::new();

        for entry in catalog.iterate() {
            let country = &entry.country;
            for code in [&country.iso2, &country.iso3] {
                if !code.is_empty() {
                    codes.entry(code.clone()).or_insert(entry.ordinal);
                }
            }
            names.entry(country.name.to_lowercase()).or_insert(entry.ordinal);
            for alias in &country.aliases {
                aliases.entry(alias.to_lowercase()).or_insert(entry.ordinal);
            }
            for (source, spelling) in &country.data_sources {
                source_names
                    .entry(source.clone())
                    .or_default()
                    .entry(spelling.to_lowercase())
                    .or_insert(entry.ordinal);
            }
        }

        debug!(
            "Resolver index built: {} codes, {} names, {} aliases, {} data sources",
            codes.len(),
            names.len(),
            aliases.len(),
            source_names.len()
        );

        Self {
            catalog,
            codes,
            names,
            aliases,
            source_names,
        }
    }

    pub fn catalog(&self) -> &Arc<ReferenceCatalog> {
        &self.catalog
    }

    /// Canonical name for a raw token, or `None` when nothing matches.
    pub fn resolve(&self, raw: &str, source_id: Option<&str>) -> Option<&str> {
        self.resolve_detailed(raw, source_id).map(|r| r.name())
    }

    /// Same as [`Resolver::resolve`] for tokens that may be missing altogether.
    pub fn resolve_optional(&self, raw: Option<&str>, source_id: Option<&str>) -> Option<&str> {
        raw.and_then(|r| self.resolve(r, source_id))
    }

    pub fn resolve_detailed(&self, raw: &str, source_id: Option<&str>) -> Option<Resolution<'_>> {
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }

        if let Some(iso2) = self.catalog.common_alias(token) {
            match self.catalog.find_by_iso2(iso2) {
                Some(entry) => {
                    return Some(Resolution {
                        entry,
                        matched_by: MatchKind::CommonAlias,
                    })
                }
                None => warn!("Common alias '{}' points to unknown iso2 '{}'", token, iso2),
            }
        }

        let lower = token.to_lowercase();
        let source_hit = source_id
            .and_then(|source| self.source_names.get(source))
            .and_then(|spellings| spellings.get(&lower));

        let candidates = [
            (self.codes.get(token), MatchKind::Code),
            (self.names.get(&lower), MatchKind::Name),
            (self.aliases.get(&lower), MatchKind::Alias),
            (source_hit, MatchKind::SourceName),
        ];

        let (ordinal, matched_by) = candidates
            .into_iter()
            .filter_map(|(hit, kind)| hit.map(|&ordinal| (ordinal, kind)))
            .min()?;

        self.catalog
            .entry(ordinal)
            .map(|entry| Resolution { entry, matched_by })
    }

    /// First entry whose canonical name equals `name`, ignoring case.
    ///
    /// The companion lookups below all key on the canonical name only: an iso code or
    /// alias passed here does not match.
    fn by_name(&self, name: &str) -> Option<&CatalogEntry> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.names
            .get(&name.to_lowercase())
            .and_then(|&ordinal| self.catalog.entry(ordinal))
    }

    pub fn resolve_iso2(&self, name: &str) -> Option<&str> {
        self.by_name(name).map(|e| e.country.iso2.as_str())
    }

    pub fn resolve_iso3(&self, name: &str) -> Option<&str> {
        self.by_name(name)
            .map(|e| e.country.iso3.as_str())
            .filter(|code| !code.is_empty())
    }

    pub fn resolve_aliases(&self, name: &str) -> Option<&[String]> {
        self.by_name(name).map(|e| e.country.aliases.as_slice())
    }

    pub fn resolve_source_name(&self, name: &str, source_id: &str) -> Option<&str> {
        self.by_name(name).and_then(|e| e.country.source_name(source_id))
    }
}
