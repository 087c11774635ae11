//! Test fixtures for blocking analysis.
//!
//! A small `people` table of the kind record linkage runs on, registered in
//! a DataFusion context, plus an in-memory provider with the same distinct
//! counts for tests that do not need a query engine.

use crate::error::Result;
use crate::statistics::InMemoryStatistics;
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use datafusion::common::TableReference;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use std::sync::Arc;

/// Rows in the `people` fixture table.
pub const PEOPLE_ROWS: u64 = 20;

/// Distinct non-null values per column of the `people` fixture table.
pub const PEOPLE_CARDINALITIES: [(&str, u64); 8] = [
    ("id", 20),
    ("surname", 14),
    ("first_name", 10),
    ("city", 4),
    ("country", 1),
    ("email", 5),
    ("email_domain", 3),
    ("dob", 20),
];

const SURNAMES: [&str; 20] = [
    "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Johnson", "Davies", "Robinson",
    "Wright", "Smith", "Jones", "Taylor", "Brown", "Evans", "Thomas", "Roberts", "Walker", "Smith",
    "Jones",
];

const FIRST_NAMES: [&str; 10] = [
    "Amelia", "Oliver", "Isla", "George", "Ava", "Harry", "Mia", "Jack", "Ella", "Noah",
];

const CITIES: [&str; 4] = ["London", "Leeds", "Bristol", "York"];

const EMAILS: [(&str, &str); 5] = [
    ("amelia.smith@example.com", "example.com"),
    ("oliver.jones@mail.co.uk", "mail.co.uk"),
    ("isla.taylor@example.com", "example.com"),
    ("george.brown@post.org", "post.org"),
    ("ava.williams@mail.co.uk", "mail.co.uk"),
];

/// Schema of the `people` fixture table.
pub fn people_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("surname", DataType::Utf8, false),
        Field::new("first_name", DataType::Utf8, false),
        Field::new("city", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("email", DataType::Utf8, true),
        Field::new("email_domain", DataType::Utf8, true),
        Field::new("dob", DataType::Utf8, false),
    ]))
}

/// Builds the 20 rows of the `people` fixture table.
pub fn people_batch() -> Result<RecordBatch> {
    let rows = PEOPLE_ROWS as usize;
    let ids: Vec<i64> = (1..=PEOPLE_ROWS as i64).collect();
    let first_names: Vec<&str> = (0..rows).map(|i| FIRST_NAMES[i % FIRST_NAMES.len()]).collect();
    let cities: Vec<&str> = (0..rows).map(|i| CITIES[i % CITIES.len()]).collect();
    // Only the first five people have an email address
    let emails: Vec<Option<&str>> = (0..rows).map(|i| EMAILS.get(i).map(|e| e.0)).collect();
    let domains: Vec<Option<&str>> = (0..rows).map(|i| EMAILS.get(i).map(|e| e.1)).collect();
    let dobs: Vec<String> = (1..=rows).map(|i| format!("{}-06-15", 1960 + i)).collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids)),
        Arc::new(StringArray::from(SURNAMES.to_vec())),
        Arc::new(StringArray::from(first_names)),
        Arc::new(StringArray::from(cities)),
        Arc::new(StringArray::from(vec!["UK"; rows])),
        Arc::new(StringArray::from(emails)),
        Arc::new(StringArray::from(domains)),
        Arc::new(StringArray::from(dobs)),
    ];

    Ok(RecordBatch::try_new(people_schema(), columns)?)
}

/// Creates a context with the `people` table registered.
pub async fn create_people_context() -> Result<SessionContext> {
    let ctx = SessionContext::new();
    register_people(&ctx, "people")?;
    Ok(ctx)
}

/// Registers the `people` rows under another name. Plain strings are
/// normalised by DataFusion; pass a [`TableReference`] to keep the case.
pub fn register_people(ctx: &SessionContext, name: impl Into<TableReference>) -> Result<()> {
    let table = MemTable::try_new(people_schema(), vec![vec![people_batch()?]])?;
    ctx.register_table(name, Arc::new(table))?;
    Ok(())
}

/// Creates a context with an empty `people` table.
pub async fn create_empty_people_context() -> Result<SessionContext> {
    let ctx = SessionContext::new();
    let empty = RecordBatch::new_empty(people_schema());
    let table = MemTable::try_new(people_schema(), vec![vec![empty]])?;
    ctx.register_table("people", Arc::new(table))?;
    Ok(ctx)
}

/// An in-memory provider answering with the `people` fixture counts.
pub fn people_statistics() -> InMemoryStatistics {
    PEOPLE_CARDINALITIES
        .iter()
        .fold(InMemoryStatistics::new(), |stats, (column, count)| {
            stats.with_count("people", *column, *count)
        })
}
