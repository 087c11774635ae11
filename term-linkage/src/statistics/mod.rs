//! Column statistics providers.
//!
//! The blocking analyzer needs exactly one number per rule: how many distinct
//! values the compared column holds. [`ColumnStatistics`] is the boundary to
//! whatever engine can answer `SELECT COUNT(DISTINCT column) FROM table`.
//!
//! - [`DataFusionStatistics`] queries tables registered in a DataFusion
//!   `SessionContext`.
//! - [`InMemoryStatistics`] serves fixed counts, for tests and for callers
//!   that already hold the statistics.
//! - [`CachedStatistics`] wraps any provider and remembers recent answers.
//!
//! Errors are split by [`StatisticsError::is_fatal`]: a missing column only
//! affects one rule, while an unavailable provider ends the run.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

pub mod cache;
pub mod datafusion_provider;
pub mod in_memory;

pub use self::cache::{CacheStats, CachedStatistics, StatsCache};
pub use self::datafusion_provider::{resolve_table, DataFusionStatistics};
pub use self::in_memory::InMemoryStatistics;

/// Result type for statistics operations.
pub type StatisticsResult<T> = std::result::Result<T, StatisticsError>;

/// Errors reported by a statistics provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatisticsError {
    /// The table is not known to the provider.
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// The column does not exist in the table.
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// The table or column name was rejected before querying.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The query ran but its result could not be read as a count.
    #[error("Unexpected query result: {0}")]
    UnexpectedResult(String),

    /// The provider cannot be reached or failed while executing.
    #[error("Statistics provider unavailable: {0}")]
    Unavailable(String),
}

impl StatisticsError {
    /// Creates an unavailable error with the given message.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Returns true if the error should stop the remaining analysis.
    ///
    /// Only infrastructure failures are fatal; problems with a single table
    /// or column are confined to the rule that asked for them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A source of per-column distinct counts.
#[async_trait]
pub trait ColumnStatistics: Send + Sync + Debug {
    /// Returns the number of distinct values of `column` in `table`.
    async fn distinct_count(&self, table: &str, column: &str) -> StatisticsResult<u64>;

    /// Returns a short name used in logs.
    fn name(&self) -> &str {
        "statistics"
    }
}

#[async_trait]
impl<T: ColumnStatistics + ?Sized> ColumnStatistics for Arc<T> {
    async fn distinct_count(&self, table: &str, column: &str) -> StatisticsResult<u64> {
        (**self).distinct_count(table, column).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_fatal() {
        assert!(StatisticsError::unavailable("connection reset").is_fatal());
        assert!(!StatisticsError::column_not_found("people", "dob").is_fatal());
        assert!(!StatisticsError::TableNotFound {
            table: "people".to_string()
        }
        .is_fatal());
        assert!(!StatisticsError::InvalidIdentifier("bad name".to_string()).is_fatal());
        assert!(!StatisticsError::UnexpectedResult("no rows".to_string()).is_fatal());
    }

    #[tokio::test]
    async fn test_arc_provider_delegates() {
        let provider: Arc<dyn ColumnStatistics> =
            Arc::new(InMemoryStatistics::new().with_count("people", "city", 42));
        assert_eq!(provider.distinct_count("people", "city").await, Ok(42));
        assert_eq!(provider.name(), "in_memory");
    }
}
