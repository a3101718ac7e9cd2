use crate::logger::VerbosityLevel;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "countryresolver")]
#[command(about = "Resolve country spellings from heterogeneous datasets to canonical names")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Create default configuration file at ./config/countryresolver.toml
    #[arg(long, global = true)]
    pub init: bool,

    /// Verbose logging (use -v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print the requested output and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to ./config/countryresolver.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Reference catalog path or URL (overrides config)
    #[arg(long, global = true, value_name = "LOCATION")]
    pub catalog: Option<String>,

    /// Export execution logs to a file (specify file path)
    #[arg(long, global = true)]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Silent
        } else {
            VerbosityLevel::from_verbose_count(self.verbose)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve raw country tokens to canonical names
    Resolve {
        /// Tokens to resolve
        #[arg(required = true)]
        tokens: Vec<String>,

        /// Data source id whose spellings should also be matched
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Suggest sovereign countries for an unknown token
    Suggest {
        token: String,

        /// Maximum number of suggestions (overrides config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Look up a companion attribute by canonical name
    Lookup {
        #[arg(value_enum)]
        attribute: LookupAttribute,

        /// Canonical country name
        name: String,

        /// Data source id (required for `source`)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Analyze country coverage across dataset documents
    Coverage(CoverageArgs),

    /// Print reference catalog statistics
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupAttribute {
    Iso2,
    Iso3,
    Aliases,
    Source,
}

#[derive(Args, Debug, Default)]
pub struct CoverageArgs {
    /// Dataset paths or URLs (relative ones resolve against --dir)
    pub datasets: Vec<String>,

    /// Base directory or URL for datasets; with no datasets listed, every .json file in it
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,

    /// CSV or JSON file listing datasets
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<String>,

    /// Output format: 'text', 'json', 'csv', or 'markdown' (overrides config)
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of datasets fetched concurrently (overrides config)
    #[arg(short = 'j', long)]
    pub parallel_jobs: Option<usize>,

    /// Number of most frequent tokens to report (overrides config)
    #[arg(long)]
    pub top: Option<usize>,

    /// Data source id applied to every dataset that does not name its own
    #[arg(short, long)]
    pub source: Option<String>,
}

impl CoverageArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.parallel_jobs == Some(0) {
            return Err("Parallel jobs must be greater than 0".to_string());
        }
        if self.parallel_jobs.is_some_and(|j| j > 100) {
            return Err("Parallel jobs cannot exceed 100".to_string());
        }
        if self.top == Some(0) {
            return Err("--top must be greater than 0".to_string());
        }
        if let Some(format) = &self.format {
            if crate::report::ReportFormat::parse(format).is_none() {
                return Err("Output format must be 'text', 'json', 'csv', or 'markdown'".to_string());
            }
        }
        Ok(())
    }
}
