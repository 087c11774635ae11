//! Shared data for integration tests.

#![allow(dead_code)]

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use term_linkage::statistics::InMemoryStatistics;

/// Rows in the generated `customers` table.
pub const CUSTOMER_ROWS: usize = 1_000;

/// `customers` with known cardinalities:
/// `id` unique, `postcode` 250 values, `surname` 100, `region` 5,
/// `email` 600 with the rest null, `email_domain` 20.
pub async fn customers_context() -> SessionContext {
    let ids: Vec<i64> = (0..CUSTOMER_ROWS as i64).collect();
    let postcodes: Vec<String> = (0..CUSTOMER_ROWS).map(|i| format!("PC{:03}", i % 250)).collect();
    let surnames: Vec<String> = (0..CUSTOMER_ROWS).map(|i| format!("surname_{}", i % 100)).collect();
    let regions: Vec<String> = (0..CUSTOMER_ROWS).map(|i| format!("region_{}", i % 5)).collect();
    let emails: Vec<Option<String>> = (0..CUSTOMER_ROWS)
        .map(|i| (i < 600).then(|| format!("user{i}@domain{}.com", i % 20)))
        .collect();
    let domains: Vec<String> = (0..CUSTOMER_ROWS).map(|i| format!("domain{}.com", i % 20)).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("postcode", DataType::Utf8, false),
        Field::new("surname", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("email", DataType::Utf8, true),
        Field::new("email_domain", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids)),
        Arc::new(StringArray::from(postcodes)),
        Arc::new(StringArray::from(surnames)),
        Arc::new(StringArray::from(regions)),
        Arc::new(StringArray::from(emails)),
        Arc::new(StringArray::from(domains)),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let ctx = SessionContext::new();
    let table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    ctx.register_table("customers", Arc::new(table)).unwrap();
    ctx
}

/// A provider with fixed counts for one table.
pub fn statistics_for(table: &str, counts: &[(&str, u64)]) -> InMemoryStatistics {
    counts
        .iter()
        .fold(InMemoryStatistics::new(), |stats, (column, count)| {
            stats.with_count(table, *column, *count)
        })
}

/// Writes a small CSV of people into a fresh temporary directory.
pub fn write_people_csv() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "id,surname,city,country").unwrap();
    for i in 0..60 {
        writeln!(
            file,
            "{i},surname_{},city_{},uk",
            i % 30,
            i % 3
        )
        .unwrap();
    }
    (dir, path)
}
