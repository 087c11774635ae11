//! Guidance derived from blocking analysis results.
//!
//! Each [`RecommendationRule`] looks at one result at a time, with the full
//! result list available for cross-rule checks. The engine walks the results
//! in order, applies every rule to each, and finishes with one overall
//! assessment of the rule set.
//!
//! ```rust
//! use term_linkage::analysis::{RecommendationEngine, Severity};
//!
//! let engine = RecommendationEngine::default();
//! let recommendations = engine.recommend(&[], 1_000);
//! assert!(recommendations.is_empty());
//! ```

use tracing::{debug, instrument};

use super::types::{BlockingAnalysisResult, Recommendation, Severity};
use crate::config::RecommendationConfig;

/// A check applied to every analysed rule.
pub trait RecommendationRule: Send + Sync {
    /// Returns recommendations about `result`. `all` is the slice of every
    /// result of the run that `result` was borrowed from.
    fn apply(
        &self,
        result: &BlockingAnalysisResult,
        all: &[BlockingAnalysisResult],
    ) -> Vec<Recommendation>;

    fn name(&self) -> &str;

    fn description(&self) -> &str;
}

/// Runs recommendation rules over analysis results.
pub struct RecommendationEngine {
    rules: Vec<Box<dyn RecommendationRule>>,
    config: RecommendationConfig,
}

impl RecommendationEngine {
    /// Creates an engine with no rules. Only the overall assessment runs.
    pub fn new(config: RecommendationConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Creates an engine with the reduction, cardinality and redundancy
    /// rules, in that order.
    pub fn with_default_rules(config: RecommendationConfig) -> Self {
        Self::new(config.clone())
            .add_rule(Box::new(ReductionRule::new(&config)))
            .add_rule(Box::new(CardinalityRule::new(config.min_cardinality)))
            .add_rule(Box::new(RedundancyRule))
    }

    pub fn add_rule(mut self, rule: Box<dyn RecommendationRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Produces recommendations for `results`, computed on a table of
    /// `row_count` rows.
    ///
    /// Per-rule items come first, in result order, followed by at most one
    /// overall assessment. Empty input yields no recommendations.
    #[instrument(skip(self, results), fields(results = results.len()))]
    pub fn recommend(
        &self,
        results: &[BlockingAnalysisResult],
        row_count: u64,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        for result in results {
            for rule in &self.rules {
                let items = rule.apply(result, results);
                if !items.is_empty() {
                    debug!(
                        rule = rule.name(),
                        column = %result.column,
                        count = items.len(),
                        "Recommendation rule matched"
                    );
                }
                recommendations.extend(items);
            }
        }

        recommendations.extend(self.overall_assessment(results, row_count));
        recommendations
    }

    fn overall_assessment(
        &self,
        results: &[BlockingAnalysisResult],
        row_count: u64,
    ) -> Option<Recommendation> {
        if results.is_empty() {
            return None;
        }
        let average = results
            .iter()
            .map(|r| f64::from(r.efficiency_score))
            .sum::<f64>()
            / results.len() as f64;

        if average > self.config.overall_efficient {
            Some(Recommendation::new(
                Severity::Success,
                format!(
                    "Blocking rules are efficient overall (average efficiency {average:.0} across {} rules on {row_count} records)",
                    results.len()
                ),
            ))
        } else if average < self.config.overall_inefficient {
            Some(Recommendation::new(
                Severity::Warning,
                format!(
                    "Average efficiency is {average:.0}; add more selective blocking rules"
                ),
            ))
        } else {
            None
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::with_default_rules(RecommendationConfig::default())
    }
}

/// Produces recommendations with the default engine.
pub fn recommend(results: &[BlockingAnalysisResult], row_count: u64) -> Vec<Recommendation> {
    RecommendationEngine::default().recommend(results, row_count)
}

/// Grades a rule by how much it reduces comparisons.
pub struct ReductionRule {
    excellent: f64,
    good: f64,
    poor: f64,
}

impl ReductionRule {
    pub fn new(config: &RecommendationConfig) -> Self {
        Self {
            excellent: config.excellent_reduction,
            good: config.good_reduction,
            poor: config.poor_reduction,
        }
    }
}

impl Default for ReductionRule {
    fn default() -> Self {
        Self::new(&RecommendationConfig::default())
    }
}

impl RecommendationRule for ReductionRule {
    fn apply(
        &self,
        result: &BlockingAnalysisResult,
        _all: &[BlockingAnalysisResult],
    ) -> Vec<Recommendation> {
        let reduction = result.reduction_percentage;
        let recommendation = if reduction > self.excellent {
            Recommendation::new(
                Severity::Success,
                format!(
                    "Rule '{}' is excellent: it removes {reduction:.2}% of comparisons",
                    result.predicate
                ),
            )
        } else if reduction > self.good {
            Recommendation::new(
                Severity::Info,
                format!(
                    "Rule '{}' shows good performance with a {reduction:.1}% reduction",
                    result.predicate
                ),
            )
        } else if reduction < self.poor {
            Recommendation::new(
                Severity::Warning,
                format!(
                    "Rule '{}' only removes {reduction:.1}% of comparisons; consider removing or reordering it",
                    result.predicate
                ),
            )
        } else {
            return Vec::new();
        };
        vec![recommendation.for_predicate(&result.predicate)]
    }

    fn name(&self) -> &str {
        "reduction"
    }

    fn description(&self) -> &str {
        "Grades each rule by its reduction of remaining comparisons"
    }
}

/// Flags columns with too few distinct values to form useful blocks.
pub struct CardinalityRule {
    min_cardinality: u64,
}

impl CardinalityRule {
    pub fn new(min_cardinality: u64) -> Self {
        Self { min_cardinality }
    }
}

impl Default for CardinalityRule {
    fn default() -> Self {
        Self::new(RecommendationConfig::default().min_cardinality)
    }
}

impl RecommendationRule for CardinalityRule {
    fn apply(
        &self,
        result: &BlockingAnalysisResult,
        _all: &[BlockingAnalysisResult],
    ) -> Vec<Recommendation> {
        if result.cardinality >= self.min_cardinality {
            return Vec::new();
        }
        vec![Recommendation::new(
            Severity::Warning,
            format!(
                "Column '{}' has only {} distinct values (about {:.0} records per block) and is too broad for efficient blocking",
                result.column, result.cardinality, result.avg_block_size
            ),
        )
        .for_predicate(&result.predicate)]
    }

    fn name(&self) -> &str {
        "cardinality"
    }

    fn description(&self) -> &str {
        "Warns about low-cardinality blocking columns"
    }
}

/// Points out rules whose column names contain one another, such as
/// `email` and `email_domain`.
pub struct RedundancyRule;

impl RecommendationRule for RedundancyRule {
    fn apply(
        &self,
        result: &BlockingAnalysisResult,
        all: &[BlockingAnalysisResult],
    ) -> Vec<Recommendation> {
        let overlapping: Vec<&str> = all
            .iter()
            .filter(|other| !std::ptr::eq(*other, result))
            .filter(|other| {
                other.column.contains(result.column.as_str())
                    || result.column.contains(other.column.as_str())
            })
            .map(|other| other.column.as_str())
            .collect();

        if overlapping.is_empty() {
            return Vec::new();
        }
        vec![Recommendation::new(
            Severity::Info,
            format!(
                "Column '{}' overlaps with '{}'; check for redundancy",
                result.column,
                overlapping.join("', '")
            ),
        )
        .for_predicate(&result.predicate)]
    }

    fn name(&self) -> &str {
        "redundancy"
    }

    fn description(&self) -> &str {
        "Detects rules on columns whose names contain one another"
    }
}
