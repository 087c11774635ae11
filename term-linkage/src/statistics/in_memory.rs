//! Fixed-count statistics provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

use super::{ColumnStatistics, StatisticsError, StatisticsResult};

/// Serves distinct counts from a map.
///
/// Useful when the counts were computed elsewhere, and in tests: the provider
/// can be switched offline, or told to fail after a number of queries to
/// simulate a connection dropping mid-run.
///
/// ```rust
/// use term_linkage::statistics::{ColumnStatistics, InMemoryStatistics};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let stats = InMemoryStatistics::new()
///     .with_count("people", "surname", 812)
///     .with_count("people", "city", 37);
///
/// assert_eq!(stats.distinct_count("people", "city").await.unwrap(), 37);
/// assert!(stats.distinct_count("people", "dob").await.is_err());
/// # })
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStatistics {
    counts: HashMap<(String, String), u64>,
    offline: AtomicBool,
    fail_after: Option<usize>,
    queries: AtomicUsize,
}

impl InMemoryStatistics {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a distinct count for a column.
    pub fn with_count(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        count: u64,
    ) -> Self {
        self.counts.insert((table.into(), column.into()), count);
        self
    }

    /// Makes every query after the first `queries` ones fail as unavailable.
    pub fn fail_after(mut self, queries: usize) -> Self {
        self.fail_after = Some(queries);
        self
    }

    /// Switches the provider on or off.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of queries received so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn has_table(&self, table: &str) -> bool {
        self.counts.keys().any(|(t, _)| t == table)
    }
}

#[async_trait]
impl ColumnStatistics for InMemoryStatistics {
    async fn distinct_count(&self, table: &str, column: &str) -> StatisticsResult<u64> {
        let previous = self.queries.fetch_add(1, Ordering::SeqCst);
        debug!(table, column, query = previous + 1, "In-memory distinct count");

        if self.offline.load(Ordering::SeqCst) {
            return Err(StatisticsError::unavailable("provider is offline"));
        }
        if let Some(limit) = self.fail_after {
            if previous >= limit {
                return Err(StatisticsError::unavailable(format!(
                    "connection lost after {limit} queries"
                )));
            }
        }

        match self.counts.get(&(table.to_string(), column.to_string())) {
            Some(count) => Ok(*count),
            None if self.has_table(table) => Err(StatisticsError::column_not_found(table, column)),
            None => Err(StatisticsError::TableNotFound {
                table: table.to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
