//! Rendering of blocking reports.
//!
//! Three formatters share the [`ReportFormatter`] trait: JSON for tools,
//! human-readable text for terminals and Markdown for pull requests or
//! documentation.
//!
//! # Examples
//!
//! ```rust
//! use term_linkage::analysis::BlockingAnalyzer;
//! use term_linkage::formatters::{FormatterConfig, HumanFormatter, ReportFormatter};
//! use term_linkage::statistics::InMemoryStatistics;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let analyzer = BlockingAnalyzer::new(InMemoryStatistics::new().with_count("people", "city", 40));
//! let report = analyzer.report("people", &["l.city = r.city"], 2_000).await.unwrap();
//!
//! let text = HumanFormatter::with_config(FormatterConfig::minimal()).format(&report).unwrap();
//! assert!(text.contains("Blocking analysis"));
//! # })
//! ```

use std::fmt::{self, Write};

use crate::analysis::{BlockingReport, Recommendation, Severity};
use crate::error::{LinkageError, Result};

/// What to include when formatting a report.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the per-rule results
    pub include_results: bool,
    /// Include rules the analyzer skipped
    pub include_skipped: bool,
    /// Include recommendations
    pub include_recommendations: bool,
    /// Include the reordered rule list
    pub include_optimized_order: bool,
    /// Maximum number of recommendations to show (-1 for all)
    pub max_recommendations: i32,
    /// Use ANSI colours (human formatter only)
    pub use_colors: bool,
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_results: true,
            include_skipped: true,
            include_recommendations: true,
            include_optimized_order: true,
            max_recommendations: -1,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Summary only.
    pub fn minimal() -> Self {
        Self {
            include_results: false,
            include_skipped: false,
            include_recommendations: false,
            include_optimized_order: false,
            max_recommendations: 0,
            use_colors: false,
            include_timestamps: false,
        }
    }

    pub fn detailed() -> Self {
        Self::default()
    }

    /// Everything except colours, with recommendations capped.
    pub fn ci() -> Self {
        Self {
            include_results: true,
            include_skipped: true,
            include_recommendations: true,
            include_optimized_order: true,
            max_recommendations: 20,
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_results(mut self, include: bool) -> Self {
        self.include_results = include;
        self
    }

    pub fn with_recommendations(mut self, include: bool) -> Self {
        self.include_recommendations = include;
        self
    }

    pub fn with_max_recommendations(mut self, max: i32) -> Self {
        self.max_recommendations = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn recommendations<'a>(&self, report: &'a BlockingReport) -> &'a [Recommendation] {
        if !self.include_recommendations {
            return &[];
        }
        match usize::try_from(self.max_recommendations) {
            Ok(max) => &report.recommendations[..max.min(report.recommendations.len())],
            Err(_) => &report.recommendations,
        }
    }
}

/// Turns a [`BlockingReport`] into text.
///
/// ```rust
/// use term_linkage::analysis::BlockingReport;
/// use term_linkage::formatters::ReportFormatter;
///
/// struct OneLine;
///
/// impl ReportFormatter for OneLine {
///     fn format(&self, report: &BlockingReport) -> term_linkage::error::Result<String> {
///         Ok(format!("{}: {}", report.table, report.summary.runtime_estimate))
///     }
/// }
/// ```
pub trait ReportFormatter {
    fn format(&self, report: &BlockingReport) -> Result<String>;

    /// Formats with a configuration other than the formatter's own.
    fn format_with_config(&self, report: &BlockingReport, _config: &FormatterConfig) -> Result<String> {
        self.format(report)
    }
}

fn render_error(err: fmt::Error) -> LinkageError {
    LinkageError::Internal(format!("Failed to render report: {err}"))
}

/// Structured JSON output.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &BlockingReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &BlockingReport, config: &FormatterConfig) -> Result<String> {
        let mut value = serde_json::to_value(report)?;
        if let Some(object) = value.as_object_mut() {
            if !config.include_results {
                object.remove("results");
            }
            if !config.include_skipped {
                object.remove("skipped");
            }
            if !config.include_optimized_order {
                object.remove("optimized_order");
            }
            if !config.include_timestamps {
                object.remove("generated_at");
            }
            object.insert(
                "recommendations".to_string(),
                serde_json::to_value(config.recommendations(report))?,
            );
        }

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        Ok(rendered?)
    }
}

/// Console output.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(&self, report: &BlockingReport, config: &FormatterConfig, out: &mut String) -> fmt::Result {
        let paint = |code: &str, text: &str| {
            if config.use_colors {
                format!("\x1b[{code}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        writeln!(out)?;
        writeln!(out, "Blocking analysis of '{}' ({} records)", report.table, report.row_count)?;
        if config.include_timestamps {
            writeln!(out, "Generated: {}", report.generated_at.to_rfc3339())?;
        }
        if let Some(error) = &report.aborted {
            writeln!(out, "{}", paint("31", &format!("Analysis aborted: {error}")))?;
        }

        let summary = &report.summary;
        writeln!(out)?;
        writeln!(out, "Summary:")?;
        writeln!(out, "   Comparisons without blocking: {}", summary.baseline_comparisons)?;
        writeln!(out, "   Comparisons after blocking:   {}", summary.final_comparisons)?;
        writeln!(out, "   Total reduction: {:.2}%", summary.total_reduction_percentage)?;
        writeln!(out, "   Estimated runtime: {}", summary.runtime_estimate)?;

        if config.include_results && !report.results.is_empty() {
            writeln!(out)?;
            writeln!(out, "Rules:")?;
            for result in &report.results {
                let verdict = if result.is_efficient {
                    paint("32", "efficient")
                } else {
                    paint("33", "inefficient")
                };
                writeln!(out, "   {}. {} [{verdict}]", result.rule_index + 1, result.predicate)?;
                writeln!(
                    out,
                    "      cardinality {}, avg block {:.1}, comparisons {}, reduction {:.2}%, score {}",
                    result.cardinality,
                    result.avg_block_size,
                    result.estimated_comparisons,
                    result.reduction_percentage,
                    result.efficiency_score
                )?;
            }
        }

        if config.include_skipped && !report.skipped.is_empty() {
            writeln!(out)?;
            writeln!(out, "Skipped:")?;
            for skipped in &report.skipped {
                writeln!(out, "   {}. {}: {}", skipped.rule_index + 1, skipped.predicate, skipped.reason)?;
            }
        }

        let recommendations = config.recommendations(report);
        if !recommendations.is_empty() {
            writeln!(out)?;
            writeln!(out, "Recommendations:")?;
            for recommendation in recommendations {
                let tag = match recommendation.severity {
                    Severity::Success => paint("32", "success"),
                    Severity::Warning => paint("33", "warning"),
                    Severity::Info => paint("34", "info"),
                };
                writeln!(out, "   [{tag}] {}", recommendation.message)?;
            }
            let hidden = report.recommendations.len() - recommendations.len();
            if hidden > 0 {
                writeln!(out, "   ... and {hidden} more")?;
            }
        }

        if config.include_optimized_order && !report.optimized_order.is_empty() {
            writeln!(out)?;
            writeln!(out, "Suggested order:")?;
            for (position, predicate) in report.optimized_order.iter().enumerate() {
                writeln!(out, "   {}. {predicate}", position + 1)?;
            }
        }

        writeln!(out)
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &BlockingReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &BlockingReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.render(report, config, &mut output)
            .map_err(render_error)?;
        Ok(output)
    }
}

/// Markdown output.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the level of the top heading, 1 to 6.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(&self, report: &BlockingReport, config: &FormatterConfig, out: &mut String) -> fmt::Result {
        let h1 = "#".repeat(usize::from(self.heading_level));
        let h2 = "#".repeat(usize::from((self.heading_level + 1).min(6)));

        writeln!(out, "{h1} Blocking analysis: `{}`", report.table)?;
        writeln!(out)?;
        if config.include_timestamps {
            writeln!(out, "_Generated {}_", report.generated_at.to_rfc3339())?;
            writeln!(out)?;
        }
        if let Some(error) = &report.aborted {
            writeln!(out, "> **Analysis aborted:** {error}")?;
            writeln!(out)?;
        }

        let summary = &report.summary;
        writeln!(out, "| Records | Without blocking | After blocking | Reduction | Runtime |")?;
        writeln!(out, "|---:|---:|---:|---:|---|")?;
        writeln!(
            out,
            "| {} | {} | {} | {:.2}% | {} |",
            report.row_count,
            summary.baseline_comparisons,
            summary.final_comparisons,
            summary.total_reduction_percentage,
            summary.runtime_estimate
        )?;

        if config.include_results && !report.results.is_empty() {
            writeln!(out)?;
            writeln!(out, "{h2} Rules")?;
            writeln!(out)?;
            writeln!(out, "| # | Rule | Cardinality | Comparisons | Reduction | Score | Efficient |")?;
            writeln!(out, "|---:|---|---:|---:|---:|---:|:---:|")?;
            for result in &report.results {
                writeln!(
                    out,
                    "| {} | `{}` | {} | {} | {:.2}% | {} | {} |",
                    result.rule_index + 1,
                    escape_cell(&result.predicate),
                    result.cardinality,
                    result.estimated_comparisons,
                    result.reduction_percentage,
                    result.efficiency_score,
                    if result.is_efficient { "yes" } else { "no" }
                )?;
            }
        }

        if config.include_skipped && !report.skipped.is_empty() {
            writeln!(out)?;
            writeln!(out, "{h2} Skipped rules")?;
            writeln!(out)?;
            for skipped in &report.skipped {
                writeln!(out, "- `{}`: {}", skipped.predicate, skipped.reason)?;
            }
        }

        let recommendations = config.recommendations(report);
        if !recommendations.is_empty() {
            writeln!(out)?;
            writeln!(out, "{h2} Recommendations")?;
            writeln!(out)?;
            for recommendation in recommendations {
                writeln!(out, "- **{}**: {}", recommendation.severity, recommendation.message)?;
            }
        }

        if config.include_optimized_order && !report.optimized_order.is_empty() {
            writeln!(out)?;
            writeln!(out, "{h2} Suggested order")?;
            writeln!(out)?;
            for (position, predicate) in report.optimized_order.iter().enumerate() {
                writeln!(out, "{}. `{predicate}`", position + 1)?;
            }
        }

        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &BlockingReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &BlockingReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.render(report, config, &mut output)
            .map_err(render_error)?;
        Ok(output)
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::BlockingAnalyzer;
    use crate::test_fixtures::{people_statistics, PEOPLE_ROWS};

    async fn sample_report() -> BlockingReport {
        BlockingAnalyzer::new(people_statistics())
            .report(
                "people",
                &[
                    "l.country = r.country",
                    "l.first_name = r.first_name or l.dob = r.dob",
                    "l.surname = r.surname",
                ],
                PEOPLE_ROWS,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_formatter() {
        let report = sample_report().await;
        let json = JsonFormatter::new().format(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["table"], "people");
        assert_eq!(value["results"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["skipped"].as_array().map(Vec::len), Some(1));
        assert!(value["generated_at"].is_string());
    }

    #[tokio::test]
    async fn test_json_formatter_minimal() {
        let report = sample_report().await;
        let json = JsonFormatter::with_config(FormatterConfig::minimal())
            .with_pretty(false)
            .format(&report)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value.get("results").is_none());
        assert!(value.get("generated_at").is_none());
        assert_eq!(value["recommendations"].as_array().map(Vec::len), Some(0));
        assert!(value["summary"]["final_comparisons"].is_u64());
        assert!(!json.contains('\n'));
    }

    #[tokio::test]
    async fn test_human_formatter() {
        let report = sample_report().await;
        let text = HumanFormatter::with_config(FormatterConfig::ci())
            .format(&report)
            .unwrap();

        assert!(text.contains("Blocking analysis of 'people' (20 records)"));
        assert!(text.contains("Comparisons without blocking: 190"));
        assert!(text.contains("too broad"));
        assert!(text.contains("Skipped:"));
        assert!(!text.contains("\x1b["));
    }

    #[tokio::test]
    async fn test_human_formatter_colors() {
        let report = sample_report().await;
        let text = HumanFormatter::new().format(&report).unwrap();
        assert!(text.contains("\x1b[33m"));
    }

    #[tokio::test]
    async fn test_recommendation_cap() {
        let report = sample_report().await;
        assert!(report.recommendations.len() > 1);

        let config = FormatterConfig::ci()
            .with_max_recommendations(1)
            .with_results(false);
        let text = HumanFormatter::with_config(config).format(&report).unwrap();
        assert!(text.contains("... and"));
        assert!(!text.contains("Rules:"));
    }

    #[tokio::test]
    async fn test_markdown_formatter() {
        let report = sample_report().await;
        let markdown = MarkdownFormatter::new()
            .with_heading_level(3)
            .format(&report)
            .unwrap();

        assert!(markdown.starts_with("### Blocking analysis: `people`"));
        assert!(markdown.contains("#### Rules"));
        assert!(markdown.contains("| 1 | `l.country = r.country` | 1 |"));
        assert!(markdown.contains("#### Suggested order"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a | b"), "a \\| b");
    }
}
