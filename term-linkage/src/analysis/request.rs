//! Serialisable analysis requests.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::analyzer::BlockingAnalyzer;
use super::types::AnalysisOutcome;
use crate::error::{LinkageError, Result};
use crate::security::{InputValidator, SqlSecurity};
use crate::statistics::ColumnStatistics;

/// Longest rule text accepted in a request.
pub const MAX_PREDICATE_LENGTH: usize = 4096;

/// Everything needed to analyse a rule set, as received from a caller.
///
/// ```rust
/// use term_linkage::analysis::AnalysisRequest;
///
/// let request = AnalysisRequest::from_json_str(
///     r#"{ "table": "people", "row_count": 1000, "predicates": ["l.city = r.city"] }"#,
/// )
/// .unwrap();
/// assert_eq!(request.row_count().unwrap(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisRequest {
    pub table: String,
    pub row_count: i64,
    pub predicates: Vec<String>,
}

impl AnalysisRequest {
    pub fn new(table: impl Into<String>, row_count: i64, predicates: Vec<String>) -> Self {
        Self {
            table: table.into(),
            row_count,
            predicates,
        }
    }

    /// Parses a request from JSON. Malformed or incomplete documents are
    /// rejected as invalid input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| LinkageError::invalid_input(format!("malformed analysis request: {e}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Checks the request without touching any data.
    pub fn validate(&self) -> Result<()> {
        self.row_count()?;
        SqlSecurity::validate_identifier(&self.table)
            .map_err(|e| LinkageError::invalid_input(format!("table name rejected: {e}")))?;

        for (index, predicate) in self.predicates.iter().enumerate() {
            let name = format!("predicate {index}");
            if predicate.trim().is_empty() {
                return Err(LinkageError::invalid_input(format!("{name} is empty")));
            }
            InputValidator::validate_no_null_bytes(predicate, &name)?;
            InputValidator::validate_string_length(predicate, MAX_PREDICATE_LENGTH, &name)?;
        }
        Ok(())
    }

    /// The row count as an unsigned value.
    pub fn row_count(&self) -> Result<u64> {
        u64::try_from(self.row_count).map_err(|_| {
            LinkageError::invalid_input(format!(
                "row_count must not be negative, got {}",
                self.row_count
            ))
        })
    }
}

impl<S: ColumnStatistics> BlockingAnalyzer<S> {
    /// Validates `request` and analyses its rules.
    pub async fn analyze_request(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        request.validate()?;
        let row_count = request.row_count()?;
        self.analyze(&request.table, &request.predicates, row_count)
            .await
    }
}
