//! Reordering of blocking rules by efficiency.

use std::cmp::Reverse;

use super::types::BlockingAnalysisResult;

/// Orders `predicates` by descending efficiency score.
///
/// The output is always a permutation of the input. Analysed rules come
/// first, most efficient first, with ties kept in input order. Rules
/// without a result follow in their original order. Results are matched to
/// predicates by [`BlockingAnalysisResult::rule_index`].
///
/// ```rust
/// use term_linkage::analysis::{optimize, BlockingAnalysisResult};
///
/// let result = |rule_index, efficiency_score| BlockingAnalysisResult {
///     rule_index,
///     predicate: String::new(),
///     column: String::new(),
///     cardinality: 1,
///     avg_block_size: 1.0,
///     estimated_comparisons: 0,
///     reduction_percentage: 0.0,
///     efficiency_score,
///     is_efficient: false,
/// };
///
/// let ordered = optimize(
///     &["l.city = r.city", "l.dob = r.dob and l.surname = r.surname", "l.surname = r.surname"],
///     &[result(0, 56), result(2, 85)],
/// );
/// assert_eq!(
///     ordered,
///     vec!["l.surname = r.surname", "l.city = r.city", "l.dob = r.dob and l.surname = r.surname"]
/// );
/// ```
pub fn optimize<P: AsRef<str>>(predicates: &[P], results: &[BlockingAnalysisResult]) -> Vec<String> {
    let mut ranked: Vec<&BlockingAnalysisResult> = results
        .iter()
        .filter(|r| r.rule_index < predicates.len())
        .collect();
    // sort_by_key is stable
    ranked.sort_by_key(|r| Reverse(r.efficiency_score));

    let mut placed = vec![false; predicates.len()];
    let mut ordered = Vec::with_capacity(predicates.len());

    for result in ranked {
        if !placed[result.rule_index] {
            placed[result.rule_index] = true;
            ordered.push(predicates[result.rule_index].as_ref().to_string());
        }
    }
    for (index, predicate) in predicates.iter().enumerate() {
        if !placed[index] {
            ordered.push(predicate.as_ref().to_string());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rule_index: usize, efficiency_score: u8) -> BlockingAnalysisResult {
        BlockingAnalysisResult {
            rule_index,
            predicate: format!("rule {rule_index}"),
            column: "c".to_string(),
            cardinality: 10,
            avg_block_size: 1.0,
            estimated_comparisons: 0,
            reduction_percentage: 0.0,
            efficiency_score,
            is_efficient: false,
        }
    }

    #[test]
    fn test_orders_by_efficiency() {
        let ordered = optimize(&["a", "b", "c"], &[result(0, 40), result(1, 90), result(2, 65)]);
        assert_eq!(ordered, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ordered = optimize(&["a", "b", "c"], &[result(0, 70), result(1, 80), result(2, 70)]);
        assert_eq!(ordered, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unanalysed_rules_appended() {
        let ordered = optimize(&["a", "b", "c", "d"], &[result(1, 30), result(3, 90)]);
        assert_eq!(ordered, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn test_without_results_keeps_input() {
        let predicates = vec!["a".to_string(), "b".to_string()];
        assert_eq!(optimize(&predicates, &[]), predicates);
        assert!(optimize::<&str>(&[], &[]).is_empty());
    }

    #[test]
    fn test_out_of_range_and_duplicate_results_ignored() {
        let ordered = optimize(&["a", "b"], &[result(5, 99), result(1, 50), result(1, 10)]);
        assert_eq!(ordered, vec!["b", "a"]);
    }
}
