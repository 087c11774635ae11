//! Error types for the Term linkage library.
//!
//! All fallible operations in this crate return [`LinkageError`] through the
//! [`Result`] alias. Per-rule data problems (an unparseable predicate, a
//! column with no distinct values) are not errors: the analyzer records them
//! as skipped rules and keeps going. Only invalid input and an unavailable
//! statistics provider surface here.

use thiserror::Error;

use crate::statistics::StatisticsError;

/// The main error type for the Term linkage library.
#[derive(Error, Debug)]
pub enum LinkageError {
    /// The caller supplied input that cannot be analysed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An identifier or expression was rejected before reaching SQL text.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// A blocking rule references a column the table does not have.
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Error reported by the column statistics provider.
    #[error("Statistics error: {0}")]
    Statistics(#[from] StatisticsError),

    /// The statistics provider became unavailable part way through a run.
    #[error("Blocking analysis aborted after {completed} rule(s): {source}")]
    AnalysisAborted {
        /// Number of rules analysed before the failure
        completed: usize,
        /// The provider failure that stopped the run
        #[source]
        source: StatisticsError,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, LinkageError>`.
pub type Result<T> = std::result::Result<T, LinkageError>;

impl LinkageError {
    /// Creates a new invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a new column-not-found error.
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Returns true if the error aborted a run that had already produced results.
    pub fn is_partial_failure(&self) -> bool {
        matches!(self, Self::AnalysisAborted { completed, .. } if *completed > 0)
    }
}

impl From<serde_json::Error> for LinkageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<LinkageError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            LinkageError::Internal(inner) => LinkageError::Internal(format!("{msg}: {inner}")),
            other => LinkageError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                LinkageError::Internal(inner) => LinkageError::Internal(format!("{msg}: {inner}")),
                other => LinkageError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}
