use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,    // Only the final report
    Summary = 1,   // High-level progress (default)
    Detailed = 2,  // Per-dataset results and warnings
    Debug = 3,     // Everything, including per-fetch details
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }
}

#[derive(Clone)]
pub struct AnalysisLogger {
    verbosity: VerbosityLevel,
    progress_bar: Arc<RwLock<Option<ProgressBar>>>,
    analysis_metadata: Arc<Mutex<AnalysisMetadata>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    log_file_path: Option<String>,
}

#[derive(Default, Clone)]
struct AnalysisMetadata {
    start_time: Option<SystemTime>,
    end_time: Option<SystemTime>,
    catalog_location: String,
    catalog_entries: usize,
    datasets_analyzed: usize,
    datasets_failed: usize,
    distinct_tokens: usize,
    unresolved_tokens: usize,
    output_file: String,
}

impl AnalysisLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: Arc::new(RwLock::new(None)),
            analysis_metadata: Arc::new(Mutex::new(AnalysisMetadata::default())),
            log_buffer: Arc::new(Mutex::new(Vec::new())),
            log_file_path: None,
        }
    }

    pub fn with_log_file(verbosity: VerbosityLevel, log_file_path: String) -> Self {
        Self {
            log_file_path: Some(log_file_path),
            ..Self::new(verbosity)
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("INFO", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("WARN", message);
        }
    }

    pub fn error(&self, message: &str) {
        // Errors are shown at every verbosity level
        self.print_message("ERROR", message);
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Debug {
            self.print_message("DEBUG", message);
        }
    }

    fn print_message(&self, level: &str, message: &str) {
        let msg = format!("[{}] {}: {}", self.get_timestamp(), level, message);

        if self.log_file_path.is_some() {
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg.clone());
            }
        }

        // Route through the progress bar while one is active so it is not overdrawn
        if let Ok(guard) = self.progress_bar.try_read() {
            if let Some(pb) = guard.as_ref() {
                pb.println(msg);
                return;
            }
        }

        eprintln!("{}", msg);
    }

    fn get_timestamp(&self) -> String {
        Local::now().format("%H:%M:%S%.3f").to_string()
    }

    fn with_metadata(&self, update: impl FnOnce(&mut AnalysisMetadata)) {
        if let Ok(mut metadata) = self.analysis_metadata.lock() {
            update(&mut metadata);
        }
    }

    pub async fn start_progress(&self, total_steps: u64) {
        let pb = ProgressBar::new(total_steps);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message("Fetching datasets...");

        // A silent run draws no bar at all
        if self.verbosity == VerbosityLevel::Silent {
            pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        }

        *self.progress_bar.write().await = Some(pb);
        self.with_metadata(|m| m.start_time = Some(SystemTime::now()));
    }

    pub async fn advance_progress(&self, steps: u64) {
        if let Some(pb) = self.progress_bar.read().await.as_ref() {
            pb.inc(steps);
        }
    }

    pub async fn update_progress(&self, message: &str) {
        if let Some(pb) = self.progress_bar.read().await.as_ref() {
            pb.set_message(message.to_string());
        }
    }

    pub async fn finish_progress(&self, final_message: &str) {
        if let Some(pb) = self.progress_bar.write().await.take() {
            pb.finish_and_clear();
        }
        self.with_metadata(|m| m.end_time = Some(SystemTime::now()));
        self.info(final_message);
    }

    // Specialized logging methods for the coverage run

    pub fn log_catalog_loaded(&self, location: &str, entries: usize) {
        self.with_metadata(|m| {
            m.catalog_location = location.to_string();
            m.catalog_entries = entries;
        });
        self.info(&format!("Reference catalog loaded: {} entries from {}", entries, location));
    }

    pub fn log_dataset_fetch_start(&self, name: &str, location: &str) {
        self.debug(&format!("Fetching dataset {} from {}", name, location));
    }

    pub fn log_dataset_analyzed(&self, name: &str, token_count: usize, unresolved_count: usize) {
        self.with_metadata(|m| m.datasets_analyzed += 1);
        if unresolved_count > 0 {
            self.warn(&format!(
                "Dataset {}: {} tokens, {} unresolved",
                name, token_count, unresolved_count
            ));
        } else {
            self.debug(&format!("Dataset {}: {} tokens, all resolved", name, token_count));
        }
    }

    pub fn log_dataset_failed(&self, name: &str, error: &str) {
        self.with_metadata(|m| m.datasets_failed += 1);
        self.warn(&format!("Dataset {} skipped: {}", name, error));
    }

    pub fn record_coverage(&self, distinct_tokens: usize, unresolved_tokens: usize) {
        self.with_metadata(|m| {
            m.distinct_tokens = distinct_tokens;
            m.unresolved_tokens = unresolved_tokens;
        });
    }

    pub fn log_export_success(&self, path: &str) {
        self.with_metadata(|m| m.output_file = path.to_string());
        self.info(&format!("Export completed: {}", path));
    }

    /// Closing block printed after a coverage run
    pub fn print_final_summary(&self) {
        let Ok(metadata) = self.analysis_metadata.lock() else {
            return;
        };

        eprintln!("\n=== COVERAGE SUMMARY ===");
        if let (Some(start), Some(end)) = (metadata.start_time, metadata.end_time) {
            let duration = end.duration_since(start).unwrap_or_default();
            eprintln!("Analysis Duration: {:.2}s", duration.as_secs_f64());
        }
        eprintln!("Reference Catalog: {} ({} entries)", metadata.catalog_location, metadata.catalog_entries);
        eprintln!("Datasets Analyzed: {}", metadata.datasets_analyzed);
        eprintln!("Datasets Skipped: {}", metadata.datasets_failed);
        eprintln!("Distinct Tokens: {}", metadata.distinct_tokens);
        eprintln!("Unresolved Tokens: {}", metadata.unresolved_tokens);
        if !metadata.output_file.is_empty() {
            eprintln!("Report Exported: {}", metadata.output_file);
        }
        eprintln!("========================\n");
    }

    /// Export all collected logs to the configured file
    pub fn export_logs(&self) -> io::Result<()> {
        let Some(ref log_file_path) = self.log_file_path else {
            return Ok(());
        };
        let Ok(buffer) = self.log_buffer.lock() else {
            return Ok(());
        };

        if let Some(parent) = Path::new(log_file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)?;

        for log_entry in buffer.iter() {
            writeln!(file, "{}", log_entry)?;
        }

        file.flush()
    }

    pub fn is_log_export_enabled(&self) -> bool {
        self.log_file_path.is_some()
    }

    pub fn get_log_count(&self) -> usize {
        self.log_buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_count() {
        assert_eq!(VerbosityLevel::from_verbose_count(0), VerbosityLevel::Summary);
        assert_eq!(VerbosityLevel::from_verbose_count(1), VerbosityLevel::Detailed);
        assert_eq!(VerbosityLevel::from_verbose_count(2), VerbosityLevel::Debug);
        assert_eq!(VerbosityLevel::from_verbose_count(9), VerbosityLevel::Debug);
    }

    #[test]
    fn test_messages_buffered_only_with_log_file() {
        let plain = AnalysisLogger::new(VerbosityLevel::Debug);
        plain.info("hello");
        assert_eq!(plain.get_log_count(), 0);
        assert!(!plain.is_log_export_enabled());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");
        let logger = AnalysisLogger::with_log_file(VerbosityLevel::Summary, path.to_string_lossy().into_owned());
        logger.info("catalog loaded");
        logger.debug("filtered out at this verbosity");
        logger.error("always recorded");
        assert_eq!(logger.get_log_count(), 2);

        logger.export_logs().unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("INFO: catalog loaded"));
        assert!(written.contains("ERROR: always recorded"));
        assert!(!written.contains("filtered out"));
    }

    #[test]
    fn test_timestamp_is_local_clock_with_millis() {
        let stamp = AnalysisLogger::new(VerbosityLevel::Summary).get_timestamp();
        assert_eq!(stamp.len(), 12);
        assert_eq!(&stamp[2..3], ":");
        assert_eq!(&stamp[5..6], ":");
        assert_eq!(&stamp[8..9], ".");
        assert!(stamp.chars().filter(|c| c.is_ascii_digit()).count() == 9);
    }

    #[test]
    fn test_quiet_logger_drops_info() {
        let logger = AnalysisLogger::with_log_file(VerbosityLevel::Silent, "unused.log".to_string());
        assert_eq!(logger.verbosity(), VerbosityLevel::Silent);
        logger.info("hidden");
        logger.warn("hidden");
        logger.error("shown");
        assert_eq!(logger.get_log_count(), 1);
    }

    #[tokio::test]
    async fn test_progress_lifecycle() {
        let logger = AnalysisLogger::new(VerbosityLevel::Silent);
        logger.start_progress(2).await;
        logger.advance_progress(1).await;
        logger.update_progress("halfway").await;
        logger.advance_progress(1).await;
        logger.finish_progress("done").await;
        assert!(logger.progress_bar.read().await.is_none());
    }
}
