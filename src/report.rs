use crate::coverage::CoverageReport;
use crate::suggest::format_suggestions;
use anyhow::{anyhow, Result};
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "markdown" | "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Markdown => "md",
        }
    }
}

/// `-o` path with the format's extension appended when it has none.
pub fn output_path(output: &str, format: ReportFormat) -> String {
    if Path::new(output).extension().is_some() {
        output.to_string()
    } else {
        format!("{}.{}", output, format.extension())
    }
}

/// Render in the given format.
pub fn render(report: &CoverageReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => render_json(report),
        ReportFormat::Csv => render_csv(report),
        ReportFormat::Markdown => Ok(render_markdown(report)),
    }
}

/// Render and write to `output_path`.
pub fn export(report: &CoverageReport, format: ReportFormat, output_path: &str) -> Result<()> {
    debug!("Exporting coverage report as {:?}: {}", format, output_path);

    let content = render(report, format)?;
    let mut file = File::create(output_path)?;
    file.write_all(content.as_bytes())?;

    info!(
        "Successfully exported coverage report ({} tokens) to {}",
        report.total_tokens, output_path
    );
    Ok(())
}

pub fn render_json(report: &CoverageReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// One table with a `Section` column: `summary` counts, the `top` tokens, then every
/// `unresolved` token with its suggestions.
pub fn render_csv(report: &CoverageReport) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());

    wtr.write_record(["Section", "Token", "Documents", "Resolved", "Canonical Name", "Suggestions"])?;

    let summary = [
        ("documents_analyzed", report.documents_analyzed),
        ("documents_skipped", report.failed_documents.len()),
        ("total_tokens", report.total_tokens),
        ("resolved", report.resolved_count),
        ("unresolved", report.unresolved_count),
    ];
    for (label, value) in summary {
        wtr.write_record(["summary", label, value.to_string().as_str(), "", "", ""])?;
    }

    for entry in &report.top_tokens {
        wtr.write_record([
            "top",
            entry.token.as_str(),
            entry.count.to_string().as_str(),
            if entry.resolved { "yes" } else { "no" },
            entry.canonical.as_deref().filter(|_| entry.resolved).unwrap_or(""),
            "",
        ])?;
    }

    for item in &report.suggestions {
        let documents = report
            .frequency_of(&item.token)
            .map(|count| count.to_string())
            .unwrap_or_default();
        wtr.write_record([
            "unresolved",
            item.token.as_str(),
            documents.as_str(),
            "no",
            "",
            format_suggestions(&item.suggestions, "; ").as_str(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn render_text(report: &CoverageReport) -> String {
    let mut out = String::new();

    out.push_str("=== Coverage Report ===\n");
    out.push_str(&format!("Generated: {}\n", report.generated_at));
    out.push_str(&format!("Documents analyzed: {}\n", report.documents_analyzed));
    if !report.failed_documents.is_empty() {
        out.push_str(&format!("Documents skipped: {}\n", report.failed_documents.len()));
    }
    out.push_str(&format!("Distinct tokens: {}\n", report.total_tokens));
    out.push_str(&format!(
        "Resolved: {} ({:.1}%)\n",
        report.resolved_count,
        report.coverage_ratio() * 100.0
    ));
    out.push_str(&format!("Unresolved: {}\n", report.unresolved_count));

    if !report.top_tokens.is_empty() {
        out.push_str(&format!("\nTop {} tokens:\n", report.top_tokens.len()));
        for entry in &report.top_tokens {
            let status = match &entry.canonical {
                Some(name) if entry.resolved => format!("-> {}", name),
                _ => "(unresolved)".to_string(),
            };
            out.push_str(&format!("  {:>4}  {}  {}\n", entry.count, entry.token, status));
        }
    }

    if !report.suggestions.is_empty() {
        out.push_str("\nUnresolved tokens:\n");
        for item in &report.suggestions {
            if item.suggestions.is_empty() {
                out.push_str(&format!("  {}\n", item.token));
            } else {
                out.push_str(&format!(
                    "  {}  (did you mean: {})\n",
                    item.token,
                    format_suggestions(&item.suggestions, ", ")
                ));
            }
        }
    }

    if !report.failed_documents.is_empty() {
        out.push_str("\nSkipped documents:\n");
        for failure in &report.failed_documents {
            out.push_str(&format!("  {}: {}\n", failure.name, failure.error));
        }
    }

    out
}

pub fn render_markdown(report: &CoverageReport) -> String {
    let mut content = String::new();

    content.push_str("# Country Coverage Report\n\n");
    content.push_str(&format!("*Generated on: {}*\n\n", report.generated_at));

    content.push_str("## Summary\n\n");
    content.push_str(&format!("- **Documents analyzed:** {}\n", report.documents_analyzed));
    content.push_str(&format!("- **Documents skipped:** {}\n", report.failed_documents.len()));
    content.push_str(&format!("- **Distinct tokens:** {}\n", report.total_tokens));
    content.push_str(&format!(
        "- **Resolved:** {} ({:.1}%)\n",
        report.resolved_count,
        report.coverage_ratio() * 100.0
    ));
    content.push_str(&format!("- **Unresolved:** {}\n\n", report.unresolved_count));

    if !report.documents.is_empty() {
        content.push_str("## Documents\n\n");
        content.push_str("| Document | Shape | Tokens | Unresolved |\n");
        content.push_str("|----------|-------|--------|------------|\n");
        for doc in &report.documents {
            content.push_str(&format!(
                "| {} | {:?} | {} | {} |\n",
                escape_markdown(&doc.name),
                doc.shape,
                doc.token_count,
                doc.unresolved_count
            ));
        }
        content.push('\n');
    }

    if !report.top_tokens.is_empty() {
        content.push_str("## Most Frequent Tokens\n\n");
        content.push_str("| Token | Documents | Resolved | Canonical Name |\n");
        content.push_str("|-------|-----------|----------|----------------|\n");
        for entry in &report.top_tokens {
            let canonical = match &entry.canonical {
                Some(name) if entry.resolved => escape_markdown(name),
                _ => "*unresolved*".to_string(),
            };
            content.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_markdown(&entry.token),
                entry.count,
                if entry.resolved { "yes" } else { "no" },
                canonical
            ));
        }
        content.push('\n');
    }

    if !report.suggestions.is_empty() {
        content.push_str("## Unresolved Tokens\n\n");
        for item in &report.suggestions {
            if item.suggestions.is_empty() {
                content.push_str(&format!("- `{}`\n", item.token));
            } else {
                let names = escape_markdown(&format_suggestions(&item.suggestions, ", "));
                content.push_str(&format!("- `{}`: did you mean {}?\n", item.token, names));
            }
        }
        content.push('\n');
    }

    if !report.failed_documents.is_empty() {
        content.push_str("## Skipped Documents\n\n");
        for failure in &report.failed_documents {
            content.push_str(&format!(
                "- **{}** (`{}`): {}\n",
                escape_markdown(&failure.name),
                failure.location,
                escape_markdown(&failure.error)
            ));
        }
        content.push('\n');
    }

    content
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('*', "\\*").replace('_', "\\_")
}

pub fn print_summary(report: &CoverageReport) {
    print!("{}", render_text(report));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{DocumentFailure, DocumentSummary, TokenFrequency, UnresolvedToken};
    use crate::document::ShapeKind;
    use crate::suggest::Suggestion;

    fn sample() -> CoverageReport {
        CoverageReport {
            generated_at: "2024-01-01 00:00:00 UTC".to_string(),
            documents_analyzed: 1,
            documents: vec![DocumentSummary {
                name: "gdp.json".to_string(),
                shape: ShapeKind::RecordArray,
                token_count: 2,
                unresolved_count: 1,
            }],
            failed_documents: vec![DocumentFailure {
                name: "broken.json".to_string(),
                location: "data/broken.json".to_string(),
                error: "Failed to parse JSON".to_string(),
            }],
            total_tokens: 2,
            resolved_count: 1,
            unresolved_count: 1,
            unresolved: vec!["Korea".to_string()],
            top_tokens: vec![
                TokenFrequency {
                    token: "Korea, Rep.".to_string(),
                    count: 1,
                    resolved: true,
                    canonical: Some("South Korea".to_string()),
                },
                TokenFrequency {
                    token: "Korea".to_string(),
                    count: 1,
                    resolved: false,
                    canonical: None,
                },
            ],
            suggestions: vec![UnresolvedToken {
                token: "Korea".to_string(),
                suggestions: vec![Suggestion {
                    name: "South Korea".to_string(),
                    iso2: "KR".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ReportFormat::parse("JSON"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::parse("md"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::parse(" text "), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::parse("html"), None);
        assert_eq!(ReportFormat::Csv.extension(), "csv");
    }

    #[test]
    fn test_output_path_appends_missing_extension() {
        assert_eq!(output_path("coverage", ReportFormat::Markdown), "coverage.md");
        assert_eq!(output_path("out/coverage", ReportFormat::Csv), "out/coverage.csv");
        assert_eq!(output_path("coverage.txt", ReportFormat::Json), "coverage.txt");
    }

    #[test]
    fn test_csv_quotes_tokens_with_commas() {
        let csv = render_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Section,Token,Documents,Resolved,Canonical Name,Suggestions");
        assert!(lines.contains(&"top,\"Korea, Rep.\",1,yes,South Korea,"));
        assert!(lines.contains(&"top,Korea,1,no,,"));
    }

    #[test]
    fn test_csv_carries_summary_and_suggestions() {
        let csv = render_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines.contains(&"summary,total_tokens,2,,,"));
        assert!(lines.contains(&"summary,unresolved,1,,,"));
        assert!(lines.contains(&"unresolved,Korea,1,no,,South Korea (KR)"));
    }

    #[test]
    fn test_json_round_trips_through_value() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["unresolved"][0], "Korea");
        assert_eq!(value["documents"][0]["shape"], "record_array");
        assert_eq!(value["suggestions"][0]["suggestions"][0]["iso2"], "KR");
    }

    #[test]
    fn test_text_mentions_suggestions_and_failures() {
        let text = render_text(&sample());
        assert!(text.contains("Resolved: 1 (50.0%)"));
        assert!(text.contains("Korea  (did you mean: South Korea (KR))"));
        assert!(text.contains("broken.json: Failed to parse JSON"));
    }

    #[test]
    fn test_markdown_escapes_table_cells() {
        let mut report = sample();
        report.top_tokens[0].token = "A|B".to_string();
        let md = render_markdown(&report);
        assert!(md.starts_with("# Country Coverage Report"));
        assert!(md.contains("| A\\|B | 1 | yes | South Korea |"));
        assert!(md.contains("| Korea | 1 | no | *unresolved* |"));
        assert!(md.contains("- `Korea`: did you mean South Korea (KR)?"));
    }

    #[test]
    fn test_unresolved_marker_agrees_across_formats() {
        let mut report = sample();
        report.top_tokens[0].resolved = false;

        let md = render_markdown(&report);
        assert!(md.contains("| Korea, Rep. | 1 | no | *unresolved* |"));
        let text = render_text(&report);
        assert!(text.contains("Korea, Rep.  (unresolved)"));
        let csv = render_csv(&report).unwrap();
        assert!(csv.contains("top,\"Korea, Rep.\",1,no,,"));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        export(&sample(), ReportFormat::Markdown, path.to_str().unwrap()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("## Skipped Documents"));
    }
}
