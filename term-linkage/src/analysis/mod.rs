//! Blocking rule performance analysis.
//!
//! Record linkage compares pairs of records. Without blocking, a table of
//! `n` rows needs `n * (n - 1) / 2` comparisons; a blocking rule such as
//! `l.surname = r.surname` restricts comparisons to records that agree on a
//! column. This module estimates, from column cardinalities alone, how much
//! each rule in an ordered list reduces that work.
//!
//! ## Components
//!
//! - [`BlockingAnalyzer`] walks the rules in order, asks a
//!   [`ColumnStatistics`](crate::statistics::ColumnStatistics) provider for
//!   each column's distinct count, and scores every rule against the
//!   comparisons left by the rule before it.
//! - [`summarize`] reduces the results to baseline and final comparison
//!   counts and a runtime estimate.
//! - [`RecommendationEngine`] turns results into success, info and warning
//!   messages.
//! - [`optimize`] reorders the rules by efficiency.
//! - [`BlockingReport`] bundles all of the above for output.
//!
//! ## Example
//!
//! ```rust
//! use term_linkage::analysis::{optimize, recommend, summarize, BlockingAnalyzer};
//! use term_linkage::statistics::InMemoryStatistics;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let stats = InMemoryStatistics::new()
//!     .with_count("people", "city", 40)
//!     .with_count("people", "surname", 900);
//! let analyzer = BlockingAnalyzer::new(stats);
//!
//! let rules = ["l.city = r.city", "l.surname = r.surname"];
//! let outcome = analyzer.analyze("people", &rules, 2_000).await.unwrap();
//! let results = &outcome.analysis().results;
//!
//! let summary = summarize(2_000, results);
//! println!("{} comparisons, {}", summary.final_comparisons, summary.runtime_estimate);
//!
//! for recommendation in recommend(results, 2_000) {
//!     println!("[{}] {}", recommendation.severity, recommendation.message);
//! }
//!
//! let reordered = optimize(&rules, results);
//! assert_eq!(reordered.len(), rules.len());
//! # })
//! ```

pub mod analyzer;
pub mod optimizer;
pub mod recommendations;
pub mod report;
pub mod request;
pub mod summary;
pub mod types;

pub use analyzer::{
    efficiency_score, estimate_blocked_comparisons, reduction_percentage, BlockingAnalyzer,
};
pub use optimizer::optimize;
pub use recommendations::{
    recommend, CardinalityRule, RecommendationEngine, RecommendationRule, RedundancyRule,
    ReductionRule,
};
pub use report::BlockingReport;
pub use request::AnalysisRequest;
pub use summary::{format_runtime, summarize, summarize_with_rate, DEFAULT_COMPARISONS_PER_SECOND};
pub use types::{
    baseline_comparisons, AnalysisOutcome, BlockingAnalysis, BlockingAnalysisResult,
    BlockingSummary, Recommendation, Severity, SkipReason, SkippedRule,
};
