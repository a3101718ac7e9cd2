//! Coverage analysis across a batch of dataset documents
//!
//! Each document is fetched, classified, and tallied on its own (token set plus the
//! tokens that failed to resolve). Tallies are merged after every fetch has finished,
//! so the report does not depend on completion order. A document that cannot be
//! fetched or parsed is reported and left out of the totals.

use crate::batch::DatasetEntry;
use crate::document::{DocumentShape, ShapeKind};
use crate::fetch::DocumentSource;
use crate::logger::AnalysisLogger;
use crate::resolver::Resolver;
use crate::suggest::{Suggestion, SuggestionEngine};
use chrono::Utc;
use futures::{stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_TOP_N: usize = 20;
pub const DEFAULT_PARALLELISM: usize = 8;

/// What one document contributed, before merging.
#[derive(Debug, Clone)]
pub struct DocumentTally {
    pub name: String,
    pub shape: ShapeKind,
    pub tokens: BTreeSet<String>,
    /// Resolved tokens and their canonical names
    pub resolved: BTreeMap<String, String>,
    pub unresolved: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub shape: ShapeKind,
    pub token_count: usize,
    pub unresolved_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentFailure {
    pub name: String,
    pub location: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenFrequency {
    pub token: String,
    /// Number of documents the raw spelling appeared in
    pub count: usize,
    pub resolved: bool,
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnresolvedToken {
    pub token: String,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub generated_at: String,
    pub documents_analyzed: usize,
    pub documents: Vec<DocumentSummary>,
    pub failed_documents: Vec<DocumentFailure>,
    /// Distinct raw tokens across all analyzed documents
    pub total_tokens: usize,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    /// Sorted lexicographically
    pub unresolved: Vec<String>,
    pub top_tokens: Vec<TokenFrequency>,
    /// One entry per unresolved token, same order as `unresolved`
    pub suggestions: Vec<UnresolvedToken>,
}

impl CoverageReport {
    /// Share of distinct tokens that resolved, between 0.0 and 1.0.
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_tokens == 0 {
            return 1.0;
        }
        self.resolved_count as f64 / self.total_tokens as f64
    }

    pub fn frequency_of(&self, token: &str) -> Option<usize> {
        self.top_tokens.iter().find(|t| t.token == token).map(|t| t.count)
    }
}

#[derive(Debug, Clone)]
pub struct CoverageAnalyzer {
    resolver: Arc<Resolver>,
    suggester: SuggestionEngine,
    top_n: usize,
    parallelism: usize,
}

impl CoverageAnalyzer {
    pub fn new(resolver: Arc<Resolver>, suggester: SuggestionEngine) -> Self {
        Self {
            resolver,
            suggester,
            top_n: DEFAULT_TOP_N,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Classify one document and resolve its tokens.
    pub fn tally(&self, name: &str, document: &Value, source_id: Option<&str>) -> DocumentTally {
        let shape = DocumentShape::classify(document);
        let tokens = shape.tokens();
        let mut resolved = BTreeMap::new();
        let mut unresolved = BTreeSet::new();

        for token in &tokens {
            match self.resolver.resolve(token, source_id) {
                Some(canonical) => {
                    resolved.insert(token.clone(), canonical.to_string());
                }
                None => {
                    unresolved.insert(token.clone());
                }
            }
        }

        debug!(
            "Document {}: {:?} shape, {} tokens, {} unresolved",
            name,
            shape.kind(),
            tokens.len(),
            unresolved.len()
        );

        DocumentTally {
            name: name.to_string(),
            shape: shape.kind(),
            tokens,
            resolved,
            unresolved,
        }
    }

    /// Analyze documents that are already parsed.
    pub fn analyze_documents<I, N>(&self, documents: I) -> CoverageReport
    where
        I: IntoIterator<Item = (N, Value)>,
        N: Into<String>,
    {
        let tallies = documents
            .into_iter()
            .map(|(name, document)| {
                let name: String = name.into();
                self.tally(&name, &document, None)
            })
            .collect();
        self.build_report(tallies, Vec::new())
    }

    /// Fetch every dataset through `source` and analyze the ones that load.
    pub async fn analyze<S>(
        &self,
        source: &S,
        datasets: &[DatasetEntry],
        logger: Option<&AnalysisLogger>,
    ) -> CoverageReport
    where
        S: DocumentSource + ?Sized,
    {
        info!("Analyzing {} datasets ({} concurrent fetches)", datasets.len(), self.parallelism);

        let outcomes: Vec<Result<DocumentTally, DocumentFailure>> = stream::iter(datasets.iter())
            .map(|dataset| async move {
                if let Some(logger) = logger {
                    logger.log_dataset_fetch_start(&dataset.name, &dataset.location);
                    logger.update_progress(&dataset.name).await;
                }
                let fetched = source.fetch(&dataset.location).await;
                let outcome = match fetched {
                    Ok(document) => {
                        let tally = self.tally(&dataset.name, &document, dataset.source.as_deref());
                        if let Some(logger) = logger {
                            logger.log_dataset_analyzed(&dataset.name, tally.tokens.len(), tally.unresolved.len());
                        }
                        Ok(tally)
                    }
                    Err(e) => {
                        warn!("Skipping dataset {}: {}", dataset.name, e);
                        if let Some(logger) = logger {
                            logger.log_dataset_failed(&dataset.name, &e.to_string());
                        }
                        Err(DocumentFailure {
                            name: dataset.name.clone(),
                            location: dataset.location.clone(),
                            error: e.to_string(),
                        })
                    }
                };
                if let Some(logger) = logger {
                    logger.advance_progress(1).await;
                }
                outcome
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut tallies = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(tally) => tallies.push(tally),
                Err(failure) => failures.push(failure),
            }
        }

        self.build_report(tallies, failures)
    }

    /// Merge per-document tallies into the final report.
    pub fn build_report(&self, mut tallies: Vec<DocumentTally>, mut failures: Vec<DocumentFailure>) -> CoverageReport {
        tallies.sort_by(|a, b| a.name.cmp(&b.name));
        failures.sort_by(|a, b| a.name.cmp(&b.name));

        let mut frequency: HashMap<String, usize> = HashMap::new();
        let mut canonical: BTreeMap<String, String> = BTreeMap::new();
        let mut unresolved: BTreeSet<String> = BTreeSet::new();

        for tally in &tallies {
            for token in &tally.tokens {
                *frequency.entry(token.clone()).or_insert(0) += 1;
            }
            for (token, name) in &tally.resolved {
                canonical.entry(token.clone()).or_insert_with(|| name.clone());
            }
            unresolved.extend(tally.unresolved.iter().cloned());
        }

        let mut ranked: Vec<(String, usize)> = frequency.into_iter().collect();
        ranked.sort_by(|(ta, ca), (tb, cb)| cb.cmp(ca).then_with(|| ta.cmp(tb)));

        let total_tokens = ranked.len();
        let top_tokens = ranked
            .into_iter()
            .take(self.top_n)
            .map(|(token, count)| {
                // A token unresolved in any document is unresolved overall
                let resolved = !unresolved.contains(&token);
                TokenFrequency {
                    canonical: canonical.get(&token).filter(|_| resolved).cloned(),
                    token,
                    count,
                    resolved,
                }
            })
            .collect();

        let suggestions = unresolved
            .iter()
            .map(|token| UnresolvedToken {
                token: token.clone(),
                suggestions: self.suggester.suggest(token),
            })
            .collect();

        let documents = tallies
            .iter()
            .map(|t| DocumentSummary {
                name: t.name.clone(),
                shape: t.shape,
                token_count: t.tokens.len(),
                unresolved_count: t.unresolved.len(),
            })
            .collect();

        let unresolved: Vec<String> = unresolved.into_iter().collect();
        info!(
            "Coverage: {} distinct tokens, {} unresolved, {} documents analyzed, {} failed",
            total_tokens,
            unresolved.len(),
            tallies.len(),
            failures.len()
        );

        CoverageReport {
            generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            documents_analyzed: tallies.len(),
            documents,
            failed_documents: failures,
            total_tokens,
            resolved_count: total_tokens - unresolved.len(),
            unresolved_count: unresolved.len(),
            unresolved,
            top_tokens,
            suggestions,
        }
    }
}
