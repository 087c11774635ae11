//! Prelude for commonly used types and traits in term-linkage.

pub use crate::analysis::{
    optimize, recommend, summarize, AnalysisOutcome, AnalysisRequest, BlockingAnalysis,
    BlockingAnalysisResult, BlockingAnalyzer, BlockingReport, BlockingSummary, Recommendation,
    Severity,
};
pub use crate::config::{AnalyzerConfig, RecommendationConfig};
pub use crate::error::{ErrorContext, LinkageError, Result};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::rules::{extract_column, BlockingRule};
pub use crate::statistics::{ColumnStatistics, DataFusionStatistics, StatisticsError};
