//! Column profiling to help choose blocking columns.
//!
//! A good blocking column has many distinct values and few nulls. The
//! profile reports both for every column of a table in a single scan.

use datafusion::arrow::array::{Array, Int64Array};
use datafusion::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{LinkageError, Result};
use crate::security::SqlSecurity;
use crate::statistics::datafusion_provider::resolve_table;

/// Null rate and cardinality of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    /// Arrow data type, as displayed by Arrow
    pub data_type: String,
    /// Share of rows that are null, 0 to 100
    pub null_percentage: f64,
    /// Distinct non-null values
    pub distinct_count: u64,
}

/// Per-column summaries of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub table: String,
    pub row_count: u64,
    pub columns: Vec<ColumnSummary>,
}

impl TableProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// Columns worth blocking on, most distinct values first.
    ///
    /// Unique columns are left out since every block would hold one record
    /// and no pairs would be compared, and so are columns with fewer than
    /// `min_cardinality` distinct values.
    pub fn candidate_columns(&self, min_cardinality: u64) -> Vec<&ColumnSummary> {
        let mut candidates: Vec<&ColumnSummary> = self
            .columns
            .iter()
            .filter(|c| c.distinct_count >= min_cardinality.max(1))
            .filter(|c| c.distinct_count < self.row_count)
            .collect();
        candidates.sort_by(|a, b| b.distinct_count.cmp(&a.distinct_count));
        candidates
    }

    /// Equality rules for the candidate columns, in candidate order.
    pub fn suggested_rules(&self, min_cardinality: u64) -> Vec<String> {
        self.candidate_columns(min_cardinality)
            .into_iter()
            .map(|c| format!("l.{0} = r.{0}", c.column))
            .collect()
    }
}

/// Profiles every column of `table` with one aggregate query.
#[instrument(skip(ctx))]
pub async fn profile_table(ctx: &SessionContext, table: &str) -> Result<TableProfile> {
    let reference = resolve_table(ctx, table)?;
    let table_sql = SqlSecurity::escape_table_reference(&reference);
    let schema = ctx.table(reference).await?.schema().as_arrow().clone();

    let mut select = vec!["COUNT(*) AS row_count".to_string()];
    let mut columns = Vec::with_capacity(schema.fields().len());
    for (index, field) in schema.fields().iter().enumerate() {
        // Columns whose names cannot be quoted safely are not profiled
        let Ok(column_sql) = SqlSecurity::escape_identifier(field.name()) else {
            debug!(column = %field.name(), "Skipping column with unsupported name");
            continue;
        };
        select.push(format!("COUNT({column_sql}) AS non_null_{index}"));
        select.push(format!("COUNT(DISTINCT {column_sql}) AS distinct_{index}"));
        columns.push((field.name().clone(), field.data_type().to_string()));
    }

    let sql = format!("SELECT {} FROM {table_sql}", select.join(", "));
    debug!(sql = %sql, "Profiling table");
    let batches = ctx.sql(&sql).await?.collect().await?;
    let batch = batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .ok_or_else(|| LinkageError::Internal("profile query returned no rows".to_string()))?;

    let count_at = |position: usize| -> Result<u64> {
        let values = batch
            .column(position)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| {
                LinkageError::Internal(format!("profile column {position} is not Int64"))
            })?;
        if values.is_null(0) {
            return Ok(0);
        }
        u64::try_from(values.value(0))
            .map_err(|_| LinkageError::Internal("negative count in profile".to_string()))
    };

    let row_count = count_at(0)?;
    let mut summaries = Vec::with_capacity(columns.len());
    for (position, (column, data_type)) in columns.into_iter().enumerate() {
        let non_null = count_at(1 + position * 2)?;
        let distinct_count = count_at(2 + position * 2)?;
        let null_percentage = if row_count == 0 {
            0.0
        } else {
            (row_count - non_null) as f64 / row_count as f64 * 100.0
        };
        summaries.push(ColumnSummary {
            column,
            data_type,
            null_percentage,
            distinct_count,
        });
    }

    Ok(TableProfile {
        table: table.to_string(),
        row_count,
        columns: summaries,
    })
}
