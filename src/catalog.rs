//! Reference Catalog - the static country reference data every lookup runs against
//!
//! The catalog is layered: the sovereign tier comes first, followed by the
//! `special_cases` categories (`microstates`, then `territories`). Iteration order
//! is fixed at load time and decides which entry wins when one string could match
//! several.

use crate::error::LoadError;
use crate::fetch::DocumentSource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Location label used for catalogs parsed from an in-memory string.
const INLINE_LOCATION: &str = "<inline>";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Sovereign,
    Microstates,
    Territories,
}

impl Tier {
    /// Tiers in match-precedence order.
    pub const ALL: [Tier; 3] = [Tier::Sovereign, Tier::Microstates, Tier::Territories];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Sovereign => "sovereign",
            Tier::Microstates => "microstates",
            Tier::Territories => "territories",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalCountry {
    #[serde(default)]
    pub iso2: String,
    #[serde(default)]
    pub iso3: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Source identifier -> that source's spelling of the country
    #[serde(default)]
    pub data_sources: HashMap<String, String>,
}

impl CanonicalCountry {
    pub fn source_name(&self, source_id: &str) -> Option<&str> {
        self.data_sources.get(source_id).map(String::as_str)
    }

    /// Fill the iso2 from the map key when absent and drop repeated aliases
    /// (case-insensitive, first spelling kept).
    fn normalize(&mut self, key: &str) {
        if self.iso2.is_empty() {
            self.iso2 = key.to_string();
        }
        let mut seen = HashSet::new();
        self.aliases.retain(|alias| seen.insert(alias.to_lowercase()));
    }
}

/// One catalog entry together with its position in match-precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub ordinal: usize,
    pub tier: Tier,
    pub key: String,
    pub country: CanonicalCountry,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub sovereign: usize,
    pub microstates: usize,
    pub territories: usize,
    pub aliases: usize,
    pub common_aliases: usize,
    pub data_sources: usize,
}

#[derive(Debug)]
pub struct ReferenceCatalog {
    entries: Vec<CatalogEntry>,
    common_aliases: HashMap<String, String>,
    key_to_ordinal: HashMap<String, usize>,
}

impl ReferenceCatalog {
    /// Fetch and parse the reference document at `location`.
    pub async fn load<S>(source: &S, location: &str) -> Result<Self, LoadError>
    where
        S: DocumentSource + ?Sized,
    {
        let document = source.fetch(location).await?;
        let catalog = Self::from_value(document, location)?;
        let stats = catalog.stats();
        info!(
            "Loaded reference catalog from {}: {} sovereign, {} microstates, {} territories, {} common aliases",
            location, stats.sovereign, stats.microstates, stats.territories, stats.common_aliases
        );
        Ok(catalog)
    }

    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        let document: Value = serde_json::from_str(content).map_err(|source| LoadError::Parse {
            location: INLINE_LOCATION.to_string(),
            source,
        })?;
        Self::from_value(document, INLINE_LOCATION)
    }

    pub fn from_value(document: Value, location: &str) -> Result<Self, LoadError> {
        let Value::Object(mut root) = document else {
            return Err(LoadError::schema(location, "root must be an object"));
        };

        let countries = match root.remove("countries") {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(LoadError::schema(location, "'countries' must be an object")),
            None => return Err(LoadError::schema(location, "missing 'countries' section")),
        };

        let (microstates, territories) = match root.remove("special_cases") {
            Some(Value::Object(mut special)) => (
                take_category(&mut special, Tier::Microstates, location)?,
                take_category(&mut special, Tier::Territories, location)?,
            ),
            Some(Value::Null) | None => (Map::new(), Map::new()),
            Some(_) => return Err(LoadError::schema(location, "'special_cases' must be an object")),
        };

        let common_aliases = match root.remove("common_aliases") {
            Some(Value::Object(map)) => parse_common_aliases(map, location)?,
            Some(Value::Null) | None => HashMap::new(),
            Some(_) => return Err(LoadError::schema(location, "'common_aliases' must be an object")),
        };

        let mut catalog = Self {
            entries: Vec::new(),
            common_aliases,
            key_to_ordinal: HashMap::new(),
        };
        catalog.push_tier(Tier::Sovereign, countries, location)?;
        catalog.push_tier(Tier::Microstates, microstates, location)?;
        catalog.push_tier(Tier::Territories, territories, location)?;

        Ok(catalog)
    }

    fn push_tier(&mut self, tier: Tier, map: Map<String, Value>, location: &str) -> Result<(), LoadError> {
        for (key, value) in map {
            let mut country: CanonicalCountry =
                serde_json::from_value(value).map_err(|source| LoadError::Parse {
                    location: format!("{} ({}.{})", location, tier, key),
                    source,
                })?;
            country.normalize(&key);

            let ordinal = self.entries.len();
            self.key_to_ordinal.entry(key.clone()).or_insert(ordinal);
            debug!("Catalog entry {}: {} [{}] {}", ordinal, key, tier, country.name);
            self.entries.push(CatalogEntry {
                ordinal,
                tier,
                key,
                country,
            });
        }
        Ok(())
    }

    /// Every entry in match-precedence order: sovereign, microstates, territories.
    /// Each call starts a fresh pass.
    pub fn iterate(&self) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries.iter()
    }

    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &CatalogEntry> + '_ {
        self.entries.iter().filter(move |e| e.tier == tier)
    }

    pub fn entry(&self, ordinal: usize) -> Option<&CatalogEntry> {
        self.entries.get(ordinal)
    }

    /// First entry, in catalog order, stored under the given iso2 key.
    pub fn find_by_iso2(&self, iso2: &str) -> Option<&CatalogEntry> {
        self.key_to_ordinal.get(iso2).and_then(|&i| self.entries.get(i))
    }

    pub fn common_alias(&self, alias: &str) -> Option<&str> {
        self.common_aliases.get(alias).map(String::as_str)
    }

    pub fn common_aliases(&self) -> &HashMap<String, String> {
        &self.common_aliases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tier_len(&self, tier: Tier) -> usize {
        self.tier(tier).count()
    }

    pub fn stats(&self) -> CatalogStats {
        let sources: BTreeSet<&str> = self
            .entries
            .iter()
            .flat_map(|e| e.country.data_sources.keys().map(String::as_str))
            .collect();
        CatalogStats {
            sovereign: self.tier_len(Tier::Sovereign),
            microstates: self.tier_len(Tier::Microstates),
            territories: self.tier_len(Tier::Territories),
            aliases: self.entries.iter().map(|e| e.country.aliases.len()).sum(),
            common_aliases: self.common_aliases.len(),
            data_sources: sources.len(),
        }
    }
}

fn take_category(special: &mut Map<String, Value>, tier: Tier, location: &str) -> Result<Map<String, Value>, LoadError> {
    match special.remove(tier.as_str()) {
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Null) | None => Ok(Map::new()),
        Some(_) => Err(LoadError::schema(
            location,
            format!("'special_cases.{}' must be an object", tier),
        )),
    }
}

fn parse_common_aliases(map: Map<String, Value>, location: &str) -> Result<HashMap<String, String>, LoadError> {
    map.into_iter()
        .map(|(alias, iso2)| match iso2 {
            Value::String(code) => Ok((alias, code)),
            _ => Err(LoadError::schema(
                location,
                format!("common alias '{}' must map to an iso2 string", alias),
            )),
        })
        .collect()
}
