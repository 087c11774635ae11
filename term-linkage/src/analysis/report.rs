//! A complete, serialisable account of one analysis run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analyzer::BlockingAnalyzer;
use super::optimizer::optimize;
use super::recommendations::RecommendationEngine;
use super::summary::summarize_analysis;
use super::types::{
    AnalysisOutcome, BlockingAnalysisResult, BlockingSummary, Recommendation, SkippedRule,
};
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::statistics::ColumnStatistics;

/// Analysis results with everything derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingReport {
    pub generated_at: DateTime<Utc>,
    pub table: String,
    pub row_count: u64,
    /// Rules in the order they were analysed
    pub predicates: Vec<String>,
    pub results: Vec<BlockingAnalysisResult>,
    pub skipped: Vec<SkippedRule>,
    pub summary: BlockingSummary,
    pub recommendations: Vec<Recommendation>,
    /// The same rules, most efficient first
    pub optimized_order: Vec<String>,
    /// Set when the statistics provider failed part way through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl BlockingReport {
    /// Builds a report from an outcome. Partial outcomes produce a report
    /// over the rules analysed before the failure.
    pub fn build<P: AsRef<str>>(
        outcome: &AnalysisOutcome,
        predicates: &[P],
        config: &AnalyzerConfig,
    ) -> Self {
        let analysis = outcome.analysis();
        let engine = RecommendationEngine::with_default_rules(config.recommendations.clone());

        Self {
            generated_at: Utc::now(),
            table: analysis.table.clone(),
            row_count: analysis.row_count,
            predicates: predicates.iter().map(|p| p.as_ref().to_string()).collect(),
            results: analysis.results.clone(),
            skipped: analysis.skipped.clone(),
            summary: summarize_analysis(analysis, config.comparisons_per_second),
            recommendations: engine.recommend(&analysis.results, analysis.row_count),
            optimized_order: optimize(predicates, &analysis.results),
            aborted: outcome.error().map(ToString::to_string),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    /// Number of analysed rules that reach the efficient threshold.
    pub fn efficient_rules(&self) -> usize {
        self.results.iter().filter(|r| r.is_efficient).count()
    }
}

impl<S: ColumnStatistics> BlockingAnalyzer<S> {
    /// Analyses the rules and builds a report in one step.
    pub async fn report<P: AsRef<str>>(
        &self,
        table: &str,
        predicates: &[P],
        row_count: u64,
    ) -> Result<BlockingReport> {
        let outcome = self.analyze(table, predicates, row_count).await?;
        Ok(BlockingReport::build(&outcome, predicates, self.config()))
    }
}
