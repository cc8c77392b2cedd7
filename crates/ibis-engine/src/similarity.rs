//! Title similarity
//!
//! Token-set Jaccard overlap. Lowercases, treats every non-alphanumeric
//! character as a separator, and compares the resulting word sets.

use std::collections::BTreeSet;

/// Lowercased alphanumeric tokens of `text`
#[must_use]
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Jaccard overlap of the token sets of `a` and `b`, in [0, 1]
///
/// Identical strings score 1.0. Two strings with no tokens at all (pure
/// punctuation) score 1.0 only if they match after trimming and lowercasing.
#[must_use]
pub fn title_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let left = tokenize(a);
    let right = tokenize(b);
    if left.is_empty() && right.is_empty() {
        return if a.trim().to_lowercase() == b.trim().to_lowercase() {
            1.0
        } else {
            0.0
        };
    }

    let shared = left.intersection(&right).count();
    let union = left.union(&right).count();
    shared as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn punctuation_and_case_ignored() {
        assert_eq!(title_similarity("Budget Reform Now", "budget reform now!!"), 1.0);
    }

    #[test]
    fn unrelated_titles_score_zero() {
        assert_eq!(title_similarity("Budget Reform", "Tax Policy Overhaul"), 0.0);
    }

    #[test]
    fn partial_overlap() {
        // {budget, reform} vs {budget, reform, now}
        let score = title_similarity("Budget reform", "Budget reform now");
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn word_order_does_not_matter() {
        assert_eq!(title_similarity("reform the budget", "the budget reform"), 1.0);
    }

    #[test]
    fn punctuation_only_titles() {
        assert_eq!(title_similarity("?!", "?!"), 1.0);
        assert_eq!(title_similarity("?!", " ?! "), 1.0);
        assert_eq!(title_similarity("?!", "..."), 0.0);
    }

    #[test]
    fn unicode_words_tokenized() {
        assert_eq!(tokenize("Écoles — et santé!").len(), 3);
    }

    proptest! {
        #[test]
        fn prop_similarity_bounded_and_symmetric(a in "\\PC{0,40}", b in "\\PC{0,40}") {
            let ab = title_similarity(&a, &b);
            let ba = title_similarity(&b, &a);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - ba).abs() < 1e-12);
        }

        #[test]
        fn prop_self_similarity_is_one(a in "\\PC{0,40}") {
            prop_assert_eq!(title_similarity(&a, &a), 1.0);
        }
    }
}
