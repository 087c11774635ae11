//! Blocking analysis over the crate's `people` fixture, comparing the
//! DataFusion provider with the in-memory one.

#[cfg(feature = "test-utils")]
mod tests {
    use datafusion::common::TableReference;
    use datafusion::prelude::*;
    use term_linkage::analysis::BlockingAnalyzer;
    use term_linkage::statistics::{ColumnStatistics, DataFusionStatistics};
    use term_linkage::test_fixtures::{
        create_people_context, people_statistics, register_people, PEOPLE_CARDINALITIES,
        PEOPLE_ROWS,
    };

    const RULES: [&str; 4] = [
        "l.country = r.country",
        "l.city = r.city",
        "block_on('email_domain')",
        "l.surname = r.surname",
    ];

    #[tokio::test]
    async fn test_fixture_counts_match_table() {
        let stats = DataFusionStatistics::new(create_people_context().await.unwrap());
        let fixed = people_statistics();

        assert_eq!(stats.row_count("people").await, Ok(PEOPLE_ROWS));
        for (column, expected) in PEOPLE_CARDINALITIES {
            assert_eq!(stats.distinct_count("people", column).await, Ok(expected));
            assert_eq!(fixed.distinct_count("people", column).await, Ok(expected));
        }
    }

    #[tokio::test]
    async fn test_providers_agree_on_report() {
        let from_table = BlockingAnalyzer::new(DataFusionStatistics::new(
            create_people_context().await.unwrap(),
        ))
        .report("people", &RULES, PEOPLE_ROWS)
        .await
        .unwrap();
        let from_counts = BlockingAnalyzer::new(people_statistics())
            .report("people", &RULES, PEOPLE_ROWS)
            .await
            .unwrap();

        assert_eq!(from_table.results.len(), RULES.len());
        for (a, b) in from_table.results.iter().zip(&from_counts.results) {
            assert_eq!(a.cardinality, b.cardinality);
            assert_eq!(a.estimated_comparisons, b.estimated_comparisons);
            assert_eq!(a.efficiency_score, b.efficiency_score);
        }
        assert_eq!(from_table.optimized_order, from_counts.optimized_order);
        // A single country leaves every pair in one block
        assert_eq!(from_table.results[0].estimated_comparisons, 190);
    }

    #[tokio::test]
    async fn test_exact_case_fixture_table() {
        let ctx = SessionContext::new();
        register_people(&ctx, TableReference::bare("People")).unwrap();
        let stats = DataFusionStatistics::new(ctx);

        let outcome = BlockingAnalyzer::new(stats)
            .analyze("People", &["l.city = r.city"], PEOPLE_ROWS)
            .await
            .unwrap();
        assert!(outcome.analysis().skipped.is_empty());
        assert_eq!(outcome.analysis().results[0].cardinality, 4);
    }
}
