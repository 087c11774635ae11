//! Headline numbers for a rule set.

use super::types::{baseline_comparisons, BlockingAnalysis, BlockingAnalysisResult, BlockingSummary};

/// Comparison throughput assumed by [`summarize`].
pub const DEFAULT_COMPARISONS_PER_SECOND: f64 = 10_000.0;

/// Summarises results produced for a table of `row_count` rows.
///
/// The final comparison count is the estimate of the last result, or the
/// unblocked pair count when there are no results.
pub fn summarize(row_count: u64, results: &[BlockingAnalysisResult]) -> BlockingSummary {
    summarize_with_rate(row_count, results, DEFAULT_COMPARISONS_PER_SECOND)
}

/// Like [`summarize`] with an explicit comparisons-per-second rate.
pub fn summarize_with_rate(
    row_count: u64,
    results: &[BlockingAnalysisResult],
    comparisons_per_second: f64,
) -> BlockingSummary {
    let baseline = baseline_comparisons(row_count);
    let final_comparisons = results
        .last()
        .map_or(baseline, |r| r.estimated_comparisons);

    let total_reduction_percentage = if baseline == 0 {
        0.0
    } else {
        (baseline as f64 - final_comparisons as f64) / baseline as f64 * 100.0
    };

    let estimated_runtime_seconds = if comparisons_per_second > 0.0 {
        final_comparisons as f64 / comparisons_per_second
    } else {
        0.0
    };

    BlockingSummary {
        baseline_comparisons: baseline,
        final_comparisons,
        total_reduction_percentage,
        estimated_runtime_seconds,
        runtime_estimate: format_runtime(estimated_runtime_seconds),
    }
}

/// Summarises a complete or partial analysis.
pub fn summarize_analysis(analysis: &BlockingAnalysis, comparisons_per_second: f64) -> BlockingSummary {
    summarize_with_rate(analysis.row_count, &analysis.results, comparisons_per_second)
}

/// Renders a duration as "< 1 second", "N seconds", "N minutes" or
/// "N hours", rounding to the nearest whole unit.
pub fn format_runtime(seconds: f64) -> String {
    if seconds < 1.0 {
        "< 1 second".to_string()
    } else if seconds < 60.0 {
        format!("{} seconds", seconds.round())
    } else if seconds < 3_600.0 {
        format!("{} minutes", (seconds / 60.0).round())
    } else {
        format!("{} hours", (seconds / 3_600.0).round())
    }
}
