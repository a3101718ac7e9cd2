//! Country identity resolution: maps the many spellings of a country found in
//! third-party datasets onto one canonical name from a reference catalog, and reports
//! how well a batch of datasets is covered.

pub mod batch;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod document;
pub mod error;
pub mod fetch;
pub mod logger;
pub mod report;
pub mod resolver;
pub mod suggest;

pub use catalog::{CanonicalCountry, CatalogEntry, ReferenceCatalog, Tier};
pub use coverage::{CoverageAnalyzer, CoverageReport};
pub use error::LoadError;
pub use fetch::{DocumentFetcher, DocumentSource};
pub use resolver::{MatchKind, Resolution, Resolver};
pub use suggest::{Suggestion, SuggestionEngine};
