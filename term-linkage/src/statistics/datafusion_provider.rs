//! Statistics provider backed by a DataFusion session.

use async_trait::async_trait;
use datafusion::arrow::array::Int64Array;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::error::DataFusionError;
use datafusion::prelude::*;
use tracing::{debug, instrument};

use super::{ColumnStatistics, StatisticsError, StatisticsResult};
use crate::error::Result;
use crate::security::SqlSecurity;

/// Runs `COUNT(DISTINCT ...)` queries against tables registered in a
/// [`SessionContext`].
///
/// Table and column names are validated and quoted before they are placed in
/// SQL text.
///
/// ```rust,no_run
/// use datafusion::prelude::*;
/// use term_linkage::statistics::{ColumnStatistics, DataFusionStatistics};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = SessionContext::new();
/// ctx.register_csv("people", "people.csv", CsvReadOptions::new()).await?;
///
/// let stats = DataFusionStatistics::new(ctx);
/// let surnames = stats.distinct_count("people", "surname").await?;
/// println!("{surnames} distinct surnames");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DataFusionStatistics {
    ctx: SessionContext,
}

impl std::fmt::Debug for DataFusionStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFusionStatistics")
            .field("session_id", &self.ctx.session_id())
            .finish()
    }
}

impl DataFusionStatistics {
    /// Wraps a session context.
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// The underlying session context.
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Counts the rows of a table.
    #[instrument(skip(self))]
    pub async fn row_count(&self, table: &str) -> StatisticsResult<u64> {
        let table_sql = self.table_sql(table)?;
        let sql = format!("SELECT COUNT(*) AS row_count FROM {table_sql}");
        let batches = self.collect(&sql, table, None).await?;
        read_single_count(&batches, "row_count")
    }

    /// Lists the column names of a table in schema order.
    #[instrument(skip(self))]
    pub async fn column_names(&self, table: &str) -> StatisticsResult<Vec<String>> {
        let table_sql = self.table_sql(table)?;
        let sql = format!("SELECT * FROM {table_sql} LIMIT 0");
        let df = self
            .ctx
            .sql(&sql)
            .await
            .map_err(|e| classify_error(e, table, None))?;
        Ok(df
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect())
    }

    fn table_sql(&self, table: &str) -> StatisticsResult<String> {
        let reference = resolve_table(&self.ctx, table)
            .map_err(|e| StatisticsError::InvalidIdentifier(e.to_string()))?;
        Ok(SqlSecurity::escape_table_reference(&reference))
    }

    async fn collect(
        &self,
        sql: &str,
        table: &str,
        column: Option<&str>,
    ) -> StatisticsResult<Vec<RecordBatch>> {
        debug!(sql, "Executing statistics query");
        let df = self
            .ctx
            .sql(sql)
            .await
            .map_err(|e| classify_error(e, table, column))?;
        df.collect()
            .await
            .map_err(|e| classify_error(e, table, column))
    }
}

#[async_trait]
impl ColumnStatistics for DataFusionStatistics {
    #[instrument(skip(self), fields(provider = "datafusion"))]
    async fn distinct_count(&self, table: &str, column: &str) -> StatisticsResult<u64> {
        let table_sql = self.table_sql(table)?;
        let column_sql = escape(column)?;
        let sql = format!("SELECT COUNT(DISTINCT {column_sql}) AS distinct_count FROM {table_sql}");

        let batches = self.collect(&sql, table, Some(column)).await?;
        read_single_count(&batches, "distinct_count")
    }

    fn name(&self) -> &str {
        "datafusion"
    }
}

/// Resolves a validated table name to the reference the session holds.
///
/// DataFusion folds unquoted names to lower case when a table is registered
/// by name, so `People` is looked up as `people`. A table registered under
/// an exact-case reference is found as written. When neither exists the
/// exact reference is returned and the query reports the missing table.
pub fn resolve_table(ctx: &SessionContext, table: &str) -> Result<TableReference> {
    SqlSecurity::validate_identifier(table)?;

    let normalized = TableReference::from(table);
    // An unknown schema is an error here rather than `false`
    if ctx.table_exist(normalized.clone()).unwrap_or(false) {
        return Ok(normalized);
    }

    let parts: Vec<&str> = table.split('.').collect();
    let exact = match parts.as_slice() {
        [catalog, schema, name] => TableReference::full(*catalog, *schema, *name),
        [schema, name] => TableReference::partial(*schema, *name),
        _ => TableReference::bare(table),
    };
    Ok(exact)
}

fn escape(identifier: &str) -> StatisticsResult<String> {
    SqlSecurity::escape_identifier(identifier)
        .map_err(|e| StatisticsError::InvalidIdentifier(e.to_string()))
}

/// Maps a DataFusion failure onto the provider error taxonomy.
///
/// Planning and schema errors mean the query referenced something that does
/// not exist; anything raised while executing is treated as the engine being
/// unavailable.
fn classify_error(err: DataFusionError, table: &str, column: Option<&str>) -> StatisticsError {
    let missing = |message: &str| {
        let lower = message.to_lowercase();
        if lower.contains("no field named") {
            Some(match column {
                Some(column) => StatisticsError::column_not_found(table, column),
                None => StatisticsError::UnexpectedResult(message.to_string()),
            })
        } else if lower.contains("table") && lower.contains("not found") {
            Some(StatisticsError::TableNotFound {
                table: table.to_string(),
            })
        } else {
            None
        }
    };

    match err.find_root() {
        DataFusionError::SchemaError(..) => match column {
            Some(column) => StatisticsError::column_not_found(table, column),
            None => StatisticsError::UnexpectedResult(err.to_string()),
        },
        DataFusionError::Plan(msg) | DataFusionError::NotImplemented(msg) => {
            missing(msg).unwrap_or_else(|| StatisticsError::UnexpectedResult(msg.clone()))
        }
        // Diagnostics and context wrappers can hide the planning error
        other => {
            let message = other.to_string();
            missing(&message).unwrap_or_else(|| StatisticsError::unavailable(message))
        }
    }
}

fn read_single_count(batches: &[RecordBatch], field: &str) -> StatisticsResult<u64> {
    let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
        return Ok(0);
    };

    let values = batch
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| {
            StatisticsError::UnexpectedResult(format!("expected Int64 array for {field}"))
        })?;

    u64::try_from(values.value(0))
        .map_err(|_| StatisticsError::UnexpectedResult(format!("negative {field}")))
}
