//! Data produced by a blocking analysis run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LinkageError;
use crate::rules::UnsupportedReason;
use crate::statistics::StatisticsError;

/// Number of record pairs compared without any blocking: `n * (n - 1) / 2`.
///
/// Saturates at `u64::MAX` for row counts whose pair count does not fit.
pub fn baseline_comparisons(row_count: u64) -> u64 {
    if row_count < 2 {
        return 0;
    }
    let pairs = u128::from(row_count) * u128::from(row_count - 1) / 2;
    u64::try_from(pairs).unwrap_or(u64::MAX)
}

/// Performance estimate for one analysed blocking rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingAnalysisResult {
    /// Position of the rule in the analysed input
    pub rule_index: usize,
    /// Rule text as supplied
    pub predicate: String,
    /// Column compared by the rule
    pub column: String,
    /// Distinct values of the column
    pub cardinality: u64,
    /// Rows per block assuming equally sized blocks
    pub avg_block_size: f64,
    /// Pairs compared when blocking on this column
    pub estimated_comparisons: u64,
    /// Reduction relative to the comparisons left by the previous rule
    pub reduction_percentage: f64,
    /// Score between 0 and 100
    pub efficiency_score: u8,
    /// Whether the score reaches the efficient threshold
    pub is_efficient: bool,
}

/// Why a rule produced no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkipReason {
    /// The rule is not a single-column equality.
    Unresolvable { detail: UnsupportedReason },
    /// The column has no distinct values.
    ZeroCardinality { column: String },
    /// The provider could not answer for this column.
    LookupFailed { column: String, message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolvable { detail } => write!(f, "unresolvable rule: {detail}"),
            Self::ZeroCardinality { column } => {
                write!(f, "column '{column}' has no distinct values")
            }
            Self::LookupFailed { column, message } => {
                write!(f, "statistics lookup for '{column}' failed: {message}")
            }
        }
    }
}

/// A rule the analyzer passed over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRule {
    pub rule_index: usize,
    pub predicate: String,
    pub reason: SkipReason,
}

/// Results of analysing an ordered rule list against one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingAnalysis {
    /// Table the statistics were read from
    pub table: String,
    /// Rows in the table
    pub row_count: u64,
    /// Results in input order, one per analysed rule
    pub results: Vec<BlockingAnalysisResult>,
    /// Rules that produced no result
    pub skipped: Vec<SkippedRule>,
}

impl BlockingAnalysis {
    /// Comparisons without blocking.
    pub fn baseline_comparisons(&self) -> u64 {
        baseline_comparisons(self.row_count)
    }

    /// Comparisons left after the last analysed rule.
    pub fn final_comparisons(&self) -> u64 {
        self.results
            .last()
            .map_or_else(|| self.baseline_comparisons(), |r| r.estimated_comparisons)
    }

    /// Number of rules looked at, analysed or skipped.
    pub fn rules_seen(&self) -> usize {
        self.results.len() + self.skipped.len()
    }
}

/// How an analysis run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Every rule was analysed or skipped.
    Complete(BlockingAnalysis),
    /// The provider became unavailable; `partial` holds what was computed
    /// before the failure.
    Aborted {
        partial: BlockingAnalysis,
        error: StatisticsError,
    },
}

impl AnalysisOutcome {
    /// Returns true if the run finished.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// The analysis, complete or partial.
    pub fn analysis(&self) -> &BlockingAnalysis {
        match self {
            Self::Complete(analysis) => analysis,
            Self::Aborted { partial, .. } => partial,
        }
    }

    /// The provider error that aborted the run.
    pub fn error(&self) -> Option<&StatisticsError> {
        match self {
            Self::Complete(_) => None,
            Self::Aborted { error, .. } => Some(error),
        }
    }

    /// Converts into a `Result`, dropping partial results on failure.
    pub fn into_result(self) -> crate::error::Result<BlockingAnalysis> {
        match self {
            Self::Complete(analysis) => Ok(analysis),
            Self::Aborted { partial, error } => Err(LinkageError::AnalysisAborted {
                completed: partial.results.len(),
                source: error,
            }),
        }
    }
}

/// Headline statistics for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingSummary {
    /// Comparisons without blocking
    pub baseline_comparisons: u64,
    /// Comparisons after all rules are applied in sequence
    pub final_comparisons: u64,
    /// Reduction from baseline to final, in percent
    pub total_reduction_percentage: f64,
    /// Estimated runtime of the final comparisons, in seconds
    pub estimated_runtime_seconds: f64,
    /// Human-readable runtime estimate
    pub runtime_estimate: String,
}

/// Severity of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A piece of guidance about the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
    /// Rule the recommendation is about; `None` for overall assessments
    pub predicate: Option<String>,
}

impl Recommendation {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            predicate: None,
        }
    }

    /// Attaches the rule this recommendation refers to.
    pub fn for_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_comparisons() {
        assert_eq!(baseline_comparisons(0), 0);
        assert_eq!(baseline_comparisons(1), 0);
        assert_eq!(baseline_comparisons(2), 1);
        assert_eq!(baseline_comparisons(1_000), 499_500);
        assert_eq!(baseline_comparisons(10_000), 49_995_000);
        assert_eq!(baseline_comparisons(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_final_comparisons_falls_back_to_baseline() {
        let analysis = BlockingAnalysis {
            table: "people".to_string(),
            row_count: 1_000,
            results: vec![],
            skipped: vec![],
        };
        assert_eq!(analysis.final_comparisons(), 499_500);
    }

    #[test]
    fn test_aborted_outcome_into_result() {
        let outcome = AnalysisOutcome::Aborted {
            partial: BlockingAnalysis {
                table: "people".to_string(),
                row_count: 10,
                results: vec![],
                skipped: vec![],
            },
            error: StatisticsError::unavailable("gone"),
        };
        assert!(!outcome.is_complete());
        assert!(outcome.error().is_some());
        assert!(matches!(
            outcome.into_result(),
            Err(LinkageError::AnalysisAborted { completed: 0, .. })
        ));
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let rec = Recommendation::new(Severity::Warning, "too broad").for_predicate("l.a = r.a");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["predicate"], "l.a = r.a");
    }
}
