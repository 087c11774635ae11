//! Security utilities for the Term linkage library.
//!
//! Table and column names taken from blocking rules end up inside SQL text
//! sent to the statistics provider. Everything in this module runs before
//! that happens.

use crate::error::{LinkageError, Result};
use datafusion::common::TableReference;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum identifier length accepted in SQL text.
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and escapes a SQL identifier (table name, column name).
    ///
    /// Qualified names are split on `.` and every segment is double-quoted,
    /// so `schema.people` becomes `"schema"."people"`.
    ///
    /// # Examples
    /// ```rust
    /// use term_linkage::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("surname").unwrap(), "\"surname\"");
    /// assert_eq!(
    ///     SqlSecurity::escape_identifier("staging.people").unwrap(),
    ///     "\"staging\".\"people\""
    /// );
    /// assert!(SqlSecurity::escape_identifier("id; DROP TABLE users--").is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;

        let quoted: Vec<String> = identifier
            .split('.')
            .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
            .collect();
        Ok(quoted.join("."))
    }

    /// Validates a SQL identifier without escaping it.
    ///
    /// SQL keywords such as `update` are accepted: identifiers only ever
    /// reach SQL text double-quoted.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(LinkageError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(LinkageError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }

        InputValidator::validate_no_null_bytes(identifier, "SQL identifier")?;

        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            // This regex is compile-time constant and known to be valid
            #[allow(clippy::expect_used)]
            Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$")
                .expect("Hard-coded regex pattern should be valid")
        });

        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(LinkageError::SecurityError(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, underscores, and dots"
            )));
        }

        Ok(())
    }

    /// Quotes every part of a resolved table reference.
    ///
    /// The parts are used verbatim, so the quoted name matches the table
    /// exactly as the session stores it.
    pub fn escape_table_reference(reference: &TableReference) -> String {
        [reference.catalog(), reference.schema(), Some(reference.table())]
            .into_iter()
            .flatten()
            .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Input validation utilities for request fields.
pub struct InputValidator;

impl InputValidator {
    /// Validates a numeric threshold value.
    pub fn validate_threshold(value: f64, name: &str) -> Result<()> {
        if !value.is_finite() {
            return Err(LinkageError::InvalidInput(format!(
                "Invalid {name} value: must be finite (not NaN or infinite)"
            )));
        }
        Ok(())
    }

    /// Validates a fraction value (0.0 to 1.0).
    pub fn validate_fraction(value: f64, name: &str) -> Result<()> {
        Self::validate_threshold(value, name)?;

        if !(0.0..=1.0).contains(&value) {
            return Err(LinkageError::InvalidInput(format!(
                "Invalid {name} value: must be between 0.0 and 1.0, got {value}"
            )));
        }
        Ok(())
    }

    /// Validates a string length.
    pub fn validate_string_length(value: &str, max_length: usize, name: &str) -> Result<()> {
        if value.len() > max_length {
            return Err(LinkageError::InvalidInput(format!(
                "{name} too long: {} characters (max {max_length})",
                value.len()
            )));
        }
        Ok(())
    }

    /// Validates that a string doesn't contain null bytes.
    pub fn validate_no_null_bytes(value: &str, name: &str) -> Result<()> {
        if value.contains('\0') {
            return Err(LinkageError::InvalidInput(format!(
                "{name} cannot contain null bytes"
            )));
        }
        Ok(())
    }
}
