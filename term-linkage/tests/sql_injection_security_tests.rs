//! Security tests for SQL injection through table names, column names and
//! rule text.

mod common;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use common::customers_context;
use datafusion::datasource::MemTable;
use datafusion::prelude::*;
use std::sync::Arc;
use term_linkage::analysis::{AnalysisRequest, BlockingAnalyzer, SkipReason};
use term_linkage::error::LinkageError;
use term_linkage::profile::profile_table;
use term_linkage::security::SqlSecurity;
use term_linkage::statistics::{ColumnStatistics, DataFusionStatistics, StatisticsError};

const HOSTILE_NAMES: [&str; 9] = [
    "customers; DROP TABLE customers; --",
    "customers' OR '1'='1",
    "customers UNION SELECT * FROM secrets",
    "customers--comment",
    "customers/*comment*/",
    "customers#comment",
    "\"customers\"",
    "customers\0",
    "",
];

#[test]
fn test_hostile_identifiers_rejected() {
    for name in HOSTILE_NAMES {
        assert!(
            SqlSecurity::validate_identifier(name).is_err(),
            "should reject {name:?}"
        );
        assert!(SqlSecurity::escape_identifier(name).is_err());
    }
}

#[test]
fn test_overlong_identifier_rejected() {
    let name = "c".repeat(129);
    assert!(SqlSecurity::validate_identifier(&name).is_err());
    assert!(SqlSecurity::validate_identifier(&"c".repeat(128)).is_ok());
}

#[test]
fn test_legitimate_identifiers_accepted() {
    for name in ["customers", "public.customers", "_staging", "Customers2024"] {
        assert!(
            SqlSecurity::validate_identifier(name).is_ok(),
            "should accept {name}"
        );
    }
    assert_eq!(
        SqlSecurity::escape_identifier("public.customers").unwrap(),
        "\"public\".\"customers\""
    );
}

#[tokio::test]
async fn test_analyzer_rejects_hostile_table_names() {
    let analyzer = BlockingAnalyzer::new(DataFusionStatistics::new(customers_context().await));
    for name in HOSTILE_NAMES {
        let err = analyzer
            .analyze(name, &["l.surname = r.surname"], 1_000)
            .await
            .unwrap_err();
        assert!(
            matches!(err, LinkageError::InvalidInput(_)),
            "unexpected error for {name:?}: {err}"
        );
    }
}

#[tokio::test]
async fn test_hostile_column_never_reaches_sql() {
    let stats = DataFusionStatistics::new(customers_context().await);

    let err = stats
        .distinct_count("customers", "surname) FROM customers; DROP TABLE customers; --")
        .await
        .unwrap_err();
    assert!(matches!(err, StatisticsError::InvalidIdentifier(_)));

    // The table is still there
    assert_eq!(stats.row_count("customers").await, Ok(1_000));
}

#[tokio::test]
async fn test_hostile_rule_text_is_skipped() {
    let analyzer = BlockingAnalyzer::new(DataFusionStatistics::new(customers_context().await));
    let outcome = analyzer
        .analyze(
            "customers",
            &[
                "l.surname = r.surname; DROP TABLE customers",
                "l.surname = r.surname OR 1=1",
                "block_on('surname''); DROP TABLE customers; --')",
            ],
            1_000,
        )
        .await
        .unwrap();

    let analysis = outcome.analysis();
    assert!(analysis.results.is_empty());
    assert!(analysis
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::Unresolvable { .. })));
}

#[tokio::test]
async fn test_request_with_hostile_table_rejected() {
    let analyzer = BlockingAnalyzer::new(DataFusionStatistics::new(customers_context().await));
    let request = AnalysisRequest::new(
        "customers; DELETE FROM customers",
        1_000,
        vec!["l.surname = r.surname".to_string()],
    );
    assert!(matches!(
        analyzer.analyze_request(&request).await,
        Err(LinkageError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_profile_rejects_hostile_table() {
    let ctx = SessionContext::new();
    let err = profile_table(&ctx, "customers; DROP TABLE customers")
        .await
        .unwrap_err();
    assert!(matches!(err, LinkageError::SecurityError(_)));
}

#[tokio::test]
async fn test_keyword_names_are_quoted() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("update", DataType::Utf8, false),
        Field::new("order", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["a", "a", "b", "c"])) as ArrayRef,
            Arc::new(StringArray::from(vec!["x", "y", "x", "y"])) as ArrayRef,
        ],
    )
    .unwrap();
    let ctx = SessionContext::new();
    ctx.register_table(
        "select",
        Arc::new(MemTable::try_new(schema, vec![vec![batch]]).unwrap()),
    )
    .unwrap();

    let stats = DataFusionStatistics::new(ctx);
    assert_eq!(stats.row_count("select").await, Ok(4));
    assert_eq!(stats.distinct_count("select", "update").await, Ok(3));

    let outcome = BlockingAnalyzer::new(stats)
        .analyze("select", &["l.update = r.update", "block_on('order')"], 4)
        .await
        .unwrap();
    let analysis = outcome.analysis();
    assert!(analysis.skipped.is_empty());
    assert_eq!(analysis.results[0].cardinality, 3);
    assert_eq!(analysis.results[1].cardinality, 2);
}
