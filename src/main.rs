use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use countryresolver::batch::{self, DatasetEntry};
use countryresolver::cli::{Cli, Commands, CoverageArgs, LookupAttribute};
use countryresolver::config::{self, AppConfig};
use countryresolver::coverage::CoverageAnalyzer;
use countryresolver::fetch::{is_url, DocumentFetcher};
use countryresolver::logger::{AnalysisLogger, VerbosityLevel};
use countryresolver::report::{self, ReportFormat};
use countryresolver::suggest::format_suggestions;
use countryresolver::{ReferenceCatalog, Resolver, SuggestionEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let default_level = match cli.verbosity() {
        VerbosityLevel::Silent => "error",
        VerbosityLevel::Summary => "warn",
        VerbosityLevel::Detailed => "info",
        VerbosityLevel::Debug => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Handle --init flag first (before any other processing)
    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("Created default configuration file at: {}", path.display());
                println!("   A sample reference catalog was written next to it if none existed.");
                println!("   Edit this file to customize settings, then run countryresolver again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from_path(Path::new(path)),
        None => AppConfig::load(),
    };
    let app_config = match loaded {
        Ok(cfg) => cfg,
        Err(config::ConfigError::FileNotFound(path)) => {
            // Only offer to create the default location
            let prompt = if cli.config.is_none() {
                AppConfig::prompt_create_config()
            } else {
                Ok(None)
            };
            match prompt {
                Ok(Some(created_path)) => {
                    println!("Created default configuration file at: {}", created_path.display());
                    println!("   Edit this file to customize settings, then run countryresolver again.");
                    std::process::exit(0);
                }
                Ok(None) => {
                    eprintln!("Configuration file not found at: {}", path.display());
                    eprintln!("   Run with --init to create a default configuration file.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Failed to create configuration file: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command.take() else {
        Cli::command().print_help()?;
        std::process::exit(2);
    };

    let logger = match &cli.log_file {
        Some(path) => AnalysisLogger::with_log_file(cli.verbosity(), path.clone()),
        None => AnalysisLogger::new(cli.verbosity()),
    };

    let fetcher = DocumentFetcher::new(&app_config.http)?;
    let catalog_location = cli
        .catalog
        .clone()
        .unwrap_or_else(|| app_config.catalog.location.clone());

    let catalog = match ReferenceCatalog::load(&fetcher, &catalog_location).await {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            logger.error(&format!("Failed to load reference catalog: {}", e));
            std::process::exit(1);
        }
    };
    logger.log_catalog_loaded(&catalog_location, catalog.len());

    let resolver = Arc::new(Resolver::new(catalog.clone()));
    let suggester = SuggestionEngine::new(catalog.clone()).with_limit(app_config.report.max_suggestions);

    let exit_code = match command {
        Commands::Resolve { tokens, source } => {
            run_resolve(&resolver, &suggester, &tokens, source.as_deref(), cli.verbose > 0)
        }
        Commands::Suggest { token, limit } => {
            let engine = match limit {
                Some(limit) => suggester.with_limit(limit),
                None => suggester,
            };
            let suggestions = engine.suggest(&token);
            if suggestions.is_empty() {
                println!("No suggestions for '{}'", token);
            }
            for suggestion in suggestions {
                println!("{}", suggestion);
            }
            0
        }
        Commands::Lookup { attribute, name, source } => {
            run_lookup(&resolver, attribute, &name, source.as_deref())?
        }
        Commands::Catalog => {
            let stats = catalog.stats();
            println!("Reference catalog: {}", catalog_location);
            println!("  Sovereign countries: {}", stats.sovereign);
            println!("  Microstates: {}", stats.microstates);
            println!("  Territories: {}", stats.territories);
            println!("  Country aliases: {}", stats.aliases);
            println!("  Common aliases: {}", stats.common_aliases);
            println!("  Data sources: {}", stats.data_sources);
            0
        }
        Commands::Coverage(args) => {
            if let Err(e) = args.validate() {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
            let analyzer = CoverageAnalyzer::new(resolver, suggester)
                .with_top_n(args.top.unwrap_or(app_config.report.top_n))
                .with_parallelism(args.parallel_jobs.unwrap_or(app_config.datasets.parallelism));
            run_coverage(&app_config, &args, fetcher, &analyzer, &logger).await?
        }
    };

    if logger.is_log_export_enabled() {
        if let Err(e) = logger.export_logs() {
            eprintln!("Failed to export logs: {}", e);
        }
    }

    std::process::exit(exit_code);
}

fn run_resolve(
    resolver: &Resolver,
    suggester: &SuggestionEngine,
    tokens: &[String],
    source: Option<&str>,
    show_match: bool,
) -> i32 {
    let mut unresolved = 0;
    for token in tokens {
        match resolver.resolve_detailed(token, source) {
            Some(resolution) if show_match => {
                println!("{} -> {} [{}]", token, resolution.name(), resolution.matched_by)
            }
            Some(resolution) => println!("{} -> {}", token, resolution.name()),
            None => {
                unresolved += 1;
                let suggestions = suggester.suggest(token);
                if suggestions.is_empty() {
                    println!("{}: not found", token);
                } else {
                    println!("{}: not found (did you mean: {})", token, format_suggestions(&suggestions, ", "));
                }
            }
        }
    }
    if unresolved > 0 {
        1
    } else {
        0
    }
}

fn run_lookup(resolver: &Resolver, attribute: LookupAttribute, name: &str, source: Option<&str>) -> Result<i32> {
    let found = match attribute {
        LookupAttribute::Iso2 => resolver.resolve_iso2(name).map(str::to_string),
        LookupAttribute::Iso3 => resolver.resolve_iso3(name).map(str::to_string),
        LookupAttribute::Aliases => resolver.resolve_aliases(name).map(|aliases| aliases.join("\n")),
        LookupAttribute::Source => {
            let source = source.context("--source is required for source lookups")?;
            resolver.resolve_source_name(name, source).map(str::to_string)
        }
    };

    match found {
        Some(value) => {
            if !value.is_empty() {
                println!("{}", value);
            }
            Ok(0)
        }
        None => {
            println!("{}: not found", name);
            Ok(1)
        }
    }
}

/// Collect the dataset list from arguments, manifest, and directory discovery.
fn collect_datasets(app_config: &AppConfig, args: &CoverageArgs, base: Option<&str>) -> Result<Vec<DatasetEntry>> {
    let mut datasets: Vec<DatasetEntry> = args.datasets.iter().map(DatasetEntry::new).collect();

    let manifest = args
        .manifest
        .clone()
        .or_else(|| Some(app_config.datasets.manifest.clone()).filter(|m| !m.is_empty()));
    if let Some(manifest) = manifest {
        datasets.extend(batch::parse_manifest(Path::new(&manifest))?);
    }

    if datasets.is_empty() {
        match base {
            Some(dir) if !is_url(dir) => datasets = batch::discover_directory(Path::new(dir))?,
            _ => bail!("No datasets to analyze (list them, pass --manifest, or point --dir at a directory)"),
        }
    }

    if let Some(source) = &args.source {
        for dataset in datasets.iter_mut().filter(|d| d.source.is_none()) {
            dataset.source = Some(source.clone());
        }
    }

    Ok(datasets)
}

async fn run_coverage(
    app_config: &AppConfig,
    args: &CoverageArgs,
    fetcher: DocumentFetcher,
    analyzer: &CoverageAnalyzer,
    logger: &AnalysisLogger,
) -> Result<i32> {
    let format_name = args.format.as_deref().unwrap_or(&app_config.report.format);
    let format = ReportFormat::parse(format_name)
        .with_context(|| format!("Unknown report format '{}'", format_name))?;

    let base = args
        .dir
        .clone()
        .or_else(|| Some(app_config.datasets.base_dir.clone()).filter(|d| !d.is_empty()));
    let datasets = collect_datasets(app_config, args, base.as_deref())?;
    let fetcher = match &base {
        Some(base) => fetcher.with_base(base.clone()),
        None => fetcher,
    };

    logger.info(&format!("Analyzing {} datasets", datasets.len()));
    logger.start_progress(datasets.len() as u64).await;
    let report = analyzer.analyze(&fetcher, &datasets, Some(logger)).await;
    logger
        .finish_progress(&format!("Analyzed {} of {} datasets", report.documents_analyzed, datasets.len()))
        .await;
    logger.record_coverage(report.total_tokens, report.unresolved_count);

    match &args.output {
        Some(output) => {
            let path = report::output_path(output, format);
            report::export(&report, format, &path)?;
            logger.log_export_success(&path);
        }
        None if format == ReportFormat::Text => report::print_summary(&report),
        None => print!("{}", report::render(&report, format)?),
    }

    if logger.verbosity() > VerbosityLevel::Silent {
        logger.print_final_summary();
    }

    Ok(0)
}
