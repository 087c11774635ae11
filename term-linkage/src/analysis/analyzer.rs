//! Sequential cardinality-based estimation of blocking rules.
//!
//! Rules are applied in order. Each analysed rule is measured against the
//! comparisons left by the previous analysed rule, starting from the full
//! `n * (n - 1) / 2` pair count. A rule that cannot be analysed is skipped
//! and does not move the chain.

use futures::stream::{self, TryStreamExt};
use tracing::{info, instrument, warn};

use super::types::{
    baseline_comparisons, AnalysisOutcome, BlockingAnalysis, BlockingAnalysisResult, SkipReason,
    SkippedRule,
};
use crate::config::AnalyzerConfig;
use crate::error::{LinkageError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::rules::{BlockingRule, RuleKind};
use crate::security::SqlSecurity;
use crate::statistics::{ColumnStatistics, StatisticsError};

/// Estimates how well an ordered list of blocking rules reduces the number
/// of record comparisons.
///
/// ```rust
/// use term_linkage::analysis::BlockingAnalyzer;
/// use term_linkage::statistics::InMemoryStatistics;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let stats = InMemoryStatistics::new().with_count("people", "surname", 5_000);
/// let analyzer = BlockingAnalyzer::new(stats);
///
/// let outcome = analyzer
///     .analyze("people", &["l.surname = r.surname"], 10_000)
///     .await
///     .unwrap();
///
/// let result = &outcome.analysis().results[0];
/// assert_eq!(result.estimated_comparisons, 5_000);
/// assert_eq!(result.efficiency_score, 85);
/// # })
/// ```
#[derive(Debug)]
pub struct BlockingAnalyzer<S> {
    statistics: S,
    config: AnalyzerConfig,
    log_config: LogConfig,
}

/// Running state of the cumulative chain.
struct Chain {
    cumulative: u64,
    analysis: BlockingAnalysis,
}

/// A fatal provider error together with everything computed before it.
struct Abort {
    chain: Chain,
    error: StatisticsError,
}

impl<S: ColumnStatistics> BlockingAnalyzer<S> {
    /// Creates an analyzer with the default scoring configuration.
    pub fn new(statistics: S) -> Self {
        Self {
            statistics,
            config: AnalyzerConfig::default(),
            log_config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalyzerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn statistics(&self) -> &S {
        &self.statistics
    }

    /// Analyses rule texts against `table` holding `row_count` rows.
    ///
    /// Returns `Err` only when the input is rejected up front. Provider
    /// failures during the run are reported through [`AnalysisOutcome`],
    /// which keeps the results computed before the failure.
    pub async fn analyze<P: AsRef<str>>(
        &self,
        table: &str,
        predicates: &[P],
        row_count: u64,
    ) -> Result<AnalysisOutcome> {
        let rules: Vec<BlockingRule> = predicates
            .iter()
            .map(|p| BlockingRule::parse(p.as_ref()))
            .collect();
        self.analyze_rules(table, &rules, row_count).await
    }

    /// Analyses already parsed rules.
    #[instrument(skip(self, rules), fields(provider = self.statistics.name(), rules = rules.len()))]
    pub async fn analyze_rules(
        &self,
        table: &str,
        rules: &[BlockingRule],
        row_count: u64,
    ) -> Result<AnalysisOutcome> {
        self.config.validate()?;
        SqlSecurity::validate_identifier(table)
            .map_err(|e| LinkageError::invalid_input(format!("table name rejected: {e}")))?;
        crate::perf_debug!(self.log_config, table, row_count, "Starting blocking analysis");

        let start = Chain {
            cumulative: baseline_comparisons(row_count),
            analysis: BlockingAnalysis {
                table: table.to_string(),
                row_count,
                results: Vec::with_capacity(rules.len()),
                skipped: Vec::new(),
            },
        };

        let analyzer = self;
        let folded = stream::iter(rules.iter().enumerate().map(Ok::<_, Abort>))
            .try_fold(start, move |chain, (index, rule)| {
                analyzer.step(chain, index, rule)
            })
            .await;

        match folded {
            Ok(chain) => {
                info!(
                    table,
                    analysed = chain.analysis.results.len(),
                    skipped = chain.analysis.skipped.len(),
                    final_comparisons = chain.cumulative,
                    "Blocking analysis complete"
                );
                Ok(AnalysisOutcome::Complete(chain.analysis))
            }
            Err(Abort { chain, error }) => {
                warn!(
                    table,
                    completed = chain.analysis.results.len(),
                    error = %error,
                    "Statistics provider failed, returning partial analysis"
                );
                Ok(AnalysisOutcome::Aborted {
                    partial: chain.analysis,
                    error,
                })
            }
        }
    }

    /// Applies one rule to the chain.
    async fn step(
        &self,
        mut chain: Chain,
        index: usize,
        rule: &BlockingRule,
    ) -> std::result::Result<Chain, Abort> {
        let column = match rule.kind() {
            RuleKind::ColumnEquality { column, .. } => column.as_str(),
            RuleKind::Unsupported(detail) => {
                self.skip(
                    &mut chain,
                    index,
                    rule,
                    SkipReason::Unresolvable {
                        detail: detail.clone(),
                    },
                );
                return Ok(chain);
            }
        };

        crate::log_stats_query!(
            self.log_config,
            table = %chain.analysis.table,
            column,
            "Requesting distinct count"
        );
        let lookup = self
            .statistics
            .distinct_count(&chain.analysis.table, column)
            .await;
        let cardinality = match lookup {
            Ok(count) => count,
            Err(error) if error.is_fatal() => return Err(Abort { chain, error }),
            Err(error) => {
                self.skip(
                    &mut chain,
                    index,
                    rule,
                    SkipReason::LookupFailed {
                        column: column.to_string(),
                        message: error.to_string(),
                    },
                );
                return Ok(chain);
            }
        };

        if cardinality == 0 {
            self.skip(
                &mut chain,
                index,
                rule,
                SkipReason::ZeroCardinality {
                    column: column.to_string(),
                },
            );
            return Ok(chain);
        }

        let result = self.estimate(
            index,
            rule.text(),
            column,
            cardinality,
            chain.analysis.row_count,
            chain.cumulative,
        );
        crate::log_rule!(
            self.log_config,
            rule = %truncate_field(rule.text(), self.log_config.max_field_length),
            cardinality,
            estimated = result.estimated_comparisons,
            reduction = result.reduction_percentage,
            efficiency = result.efficiency_score,
            "Rule estimated"
        );

        chain.cumulative = result.estimated_comparisons;
        chain.analysis.results.push(result);
        Ok(chain)
    }

    fn skip(&self, chain: &mut Chain, index: usize, rule: &BlockingRule, reason: SkipReason) {
        warn!(
            rule = %truncate_field(rule.text(), self.log_config.max_field_length),
            index,
            reason = %reason,
            "Skipping blocking rule"
        );
        chain.analysis.skipped.push(SkippedRule {
            rule_index: index,
            predicate: rule.text().to_string(),
            reason,
        });
    }

    fn estimate(
        &self,
        index: usize,
        predicate: &str,
        column: &str,
        cardinality: u64,
        row_count: u64,
        cumulative: u64,
    ) -> BlockingAnalysisResult {
        let (avg_block_size, estimated_comparisons) =
            estimate_blocked_comparisons(row_count, cardinality);
        let reduction_percentage = reduction_percentage(cumulative, estimated_comparisons);
        let efficiency_score = efficiency_score(
            reduction_percentage,
            cardinality,
            row_count,
            &self.config,
        );

        BlockingAnalysisResult {
            rule_index: index,
            predicate: predicate.to_string(),
            column: column.to_string(),
            cardinality,
            avg_block_size,
            estimated_comparisons,
            reduction_percentage,
            efficiency_score,
            is_efficient: efficiency_score >= self.config.efficient_threshold,
        }
    }
}

/// Average block size and the pairs compared within blocks when `row_count`
/// rows are split evenly into `cardinality` blocks.
///
/// `cardinality` must be positive.
pub fn estimate_blocked_comparisons(row_count: u64, cardinality: u64) -> (f64, u64) {
    let avg_block_size = row_count as f64 / cardinality as f64;
    let pairs_per_block = (avg_block_size * (avg_block_size - 1.0) / 2.0).max(0.0);
    let estimated = (cardinality as f64 * pairs_per_block).round();
    // float-to-int casts saturate
    (avg_block_size, estimated as u64)
}

/// Percentage of `previous` comparisons removed by going down to `estimated`.
///
/// Negative when a rule is broader than the one before it; zero when there
/// was nothing left to reduce.
pub fn reduction_percentage(previous: u64, estimated: u64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (previous as f64 - estimated as f64) / previous as f64 * 100.0
}

/// Weighted blend of reduction and cardinality ratio, rounded and clamped to
/// `0..=100`.
pub fn efficiency_score(
    reduction_percentage: f64,
    cardinality: u64,
    row_count: u64,
    config: &AnalyzerConfig,
) -> u8 {
    let cardinality_ratio = if row_count == 0 {
        0.0
    } else {
        (cardinality as f64 / row_count as f64).min(1.0)
    };
    let score = reduction_percentage * config.reduction_weight
        + cardinality_ratio * 100.0 * config.cardinality_weight;
    score.round().clamp(0.0, 100.0) as u8
}
