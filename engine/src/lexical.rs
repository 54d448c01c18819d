//! Dependency-free lexical similarity.
//!
//! The retrieval tier of last resort: token overlap between the query and
//! a candidate's text. Deterministic, no I/O, always available.

use std::collections::HashSet;

/// Minimum denominator so short queries are not over-rewarded by trivial
/// full overlap.
const MIN_QUERY_TOKENS: usize = 3;

/// Score how well `candidate` covers the tokens of `query`, in [0, 1].
///
/// Both strings are lowered and split on non-alphanumeric separators;
/// query tokens are deduplicated before counting.
pub fn score(query: &str, candidate: &str) -> f32 {
    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokens(candidate);

    let hits = query_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(*t))
        .count();

    let denominator = query_tokens.len().max(MIN_QUERY_TOKENS);
    (hits as f32 / denominator as f32).min(1.0)
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_overlap_scores_one() {
        let s = score("capital of France", "Paris is the capital of France");
        assert!((s - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn no_overlap_scores_zero() {
        assert_eq!(score("quantum computing", "Paris is the capital"), 0.0);
    }

    #[test]
    fn short_queries_hit_the_denominator_floor() {
        // One token fully covered still divides by three.
        let s = score("paris", "paris");
        assert!((s - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn punctuation_and_case_are_separators_only() {
        let s = score("CAPITAL-of-France!", "the capital, of... France");
        assert!((s - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn duplicate_query_tokens_collapse() {
        // "paris paris paris" is a single distinct token.
        let a = score("paris paris paris", "paris");
        let b = score("paris", "paris");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(score("", "anything"), 0.0);
        assert_eq!(score("   ...   ", "anything"), 0.0);
        assert_eq!(score("some words here", ""), 0.0);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let a = score("how do plants make food", "photosynthesis is how plants make food");
        let b = score("how do plants make food", "photosynthesis is how plants make food");
        assert_eq!(a, b);
    }
}
