//! Property-based tests for blocking analysis.
//!
//! Generates row counts, cardinalities and rule lists and checks the
//! invariants every analysis must satisfy:
//! - the baseline is `n * (n - 1) / 2`
//! - at most one result per rule, in input order
//! - efficiency scores stay within 0 to 100
//! - the optimizer returns a permutation sorted by efficiency
//! - repeated runs give identical results
//! - rule parsing never panics

use proptest::prelude::*;
use std::collections::HashMap;
use term_linkage::analysis::{
    baseline_comparisons, estimate_blocked_comparisons, optimize, recommend, summarize,
    BlockingAnalyzer,
};
use term_linkage::rules::{extract_column, BlockingRule};
use term_linkage::statistics::InMemoryStatistics;

const COLUMNS: [&str; 6] = ["surname", "first_name", "city", "postcode", "dob", "email"];

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

/// Rule texts drawn from supported and unsupported shapes.
fn rule_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(COLUMNS.to_vec()).prop_map(|c| format!("l.{c} = r.{c}")),
        1 => prop::sample::select(COLUMNS.to_vec()).prop_map(|c| format!("block_on('{c}')")),
        1 => (prop::sample::select(COLUMNS.to_vec()), prop::sample::select(COLUMNS.to_vec()))
            .prop_map(|(a, b)| format!("l.{a} = r.{a} and l.{b} = r.{b}")),
        1 => Just("l.unknown_column = r.unknown_column".to_string()),
        1 => ".{0,30}",
    ]
}

/// A row count with per-column distinct counts no larger than it.
fn table_strategy() -> impl Strategy<Value = (u64, HashMap<&'static str, u64>)> {
    (0u64..200_000).prop_flat_map(|rows| {
        let counts = prop::collection::vec(0..=rows, COLUMNS.len());
        (Just(rows), counts).prop_map(|(rows, counts)| {
            (rows, COLUMNS.iter().copied().zip(counts).collect())
        })
    })
}

fn provider(counts: &HashMap<&'static str, u64>) -> InMemoryStatistics {
    counts
        .iter()
        .fold(InMemoryStatistics::new(), |stats, (column, count)| {
            stats.with_count("people", *column, *count)
        })
}

proptest! {
    #[test]
    fn prop_baseline_matches_formula(rows in 0u64..3_000_000) {
        let expected = if rows < 2 { 0 } else { rows * (rows - 1) / 2 };
        prop_assert_eq!(baseline_comparisons(rows), expected);
        prop_assert_eq!(summarize(rows, &[]).baseline_comparisons, expected);
    }

    #[test]
    fn prop_estimate_bounded_by_baseline(rows in 0u64..1_000_000, divisor in 1u64..1_000) {
        let cardinality = (rows / divisor).max(1);
        let (avg, estimated) = estimate_blocked_comparisons(rows, cardinality);
        prop_assert!(avg >= 0.0);
        // Rounding can push the estimate at most one pair past the baseline
        prop_assert!(estimated <= baseline_comparisons(rows) + 1);
    }

    #[test]
    fn prop_analysis_invariants(
        (rows, counts) in table_strategy(),
        rules in prop::collection::vec(rule_strategy(), 0..8),
    ) {
        let analyzer = BlockingAnalyzer::new(provider(&counts));
        let outcome = run(analyzer.analyze("people", &rules, rows)).unwrap();
        prop_assert!(outcome.is_complete());

        let analysis = outcome.analysis();
        prop_assert!(analysis.results.len() <= rules.len());
        prop_assert_eq!(analysis.rules_seen(), rules.len());

        let mut last_index = None;
        for result in &analysis.results {
            prop_assert!(result.efficiency_score <= 100);
            prop_assert_eq!(result.is_efficient, result.efficiency_score >= 70);
            prop_assert!(result.cardinality > 0);
            prop_assert!(last_index.map_or(true, |last| result.rule_index > last));
            prop_assert_eq!(&result.predicate, &rules[result.rule_index]);
            last_index = Some(result.rule_index);
        }

        let summary = summarize(rows, &analysis.results);
        prop_assert_eq!(summary.baseline_comparisons, baseline_comparisons(rows));
        prop_assert!(!summary.runtime_estimate.is_empty());
    }

    #[test]
    fn prop_optimize_is_sorted_permutation(
        (rows, counts) in table_strategy(),
        // Distinct texts so each result maps back to one position
        rules in prop::collection::hash_set(rule_strategy(), 0..8)
            .prop_map(|rules| rules.into_iter().collect::<Vec<_>>()),
    ) {
        let analyzer = BlockingAnalyzer::new(provider(&counts));
        let outcome = run(analyzer.analyze("people", &rules, rows)).unwrap();
        let results = &outcome.analysis().results;

        let ordered = optimize(&rules, results);

        let mut sorted_input = rules.clone();
        sorted_input.sort();
        let mut sorted_output = ordered.clone();
        sorted_output.sort();
        prop_assert_eq!(sorted_input, sorted_output);

        let mut scores: Vec<u8> = results.iter().map(|r| r.efficiency_score).collect();
        scores.sort_by(|a, b| b.cmp(a));
        let leading: Vec<u8> = ordered
            .iter()
            .take(results.len())
            .map(|text| {
                results
                    .iter()
                    .find(|r| &r.predicate == text)
                    .map_or(0, |r| r.efficiency_score)
            })
            .collect();
        prop_assert_eq!(leading, scores);
    }

    #[test]
    fn prop_analysis_is_idempotent(
        (rows, counts) in table_strategy(),
        rules in prop::collection::vec(rule_strategy(), 0..6),
    ) {
        let analyzer = BlockingAnalyzer::new(provider(&counts));
        let first = run(analyzer.analyze("people", &rules, rows)).unwrap();
        let second = run(analyzer.analyze("people", &rules, rows)).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            recommend(&first.analysis().results, rows),
            recommend(&second.analysis().results, rows)
        );
    }

    #[test]
    fn prop_parse_never_panics(text in ".{0,80}") {
        let rule = BlockingRule::parse(text.clone());
        prop_assert_eq!(rule.text(), text.as_str());
        prop_assert_eq!(rule.column().map(str::to_string), extract_column(&text));
    }

    #[test]
    fn prop_equality_rules_extract_column(
        // Connective words are valid names too
        column in prop_oneof!["[a-z_][a-z0-9_]{0,20}", Just("or".to_string()), Just("and".to_string())],
        left in prop_oneof!["[a-z][a-z0-9_]{0,5}", Just("and".to_string())],
        right in prop_oneof!["[a-z][a-z0-9_]{0,5}", Just("or".to_string())],
        spaces in " {0,3}",
    ) {
        prop_assume!(left != right);
        let text = format!("{left}.{column}{spaces}={spaces}{right}.{column}");
        prop_assert_eq!(extract_column(&text), Some(column));
    }
}
