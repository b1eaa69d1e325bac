//! Long-context reordering.
//!
//! Consumers with a long context attend best to the beginning and the end
//! of their input. The most relevant items are moved to both ends and the
//! least relevant ones to the middle.

use std::collections::VecDeque;

/// Reorder a relevance-ranked sequence (best first) so the best items sit at
/// the two ends and the worst in the middle.
///
/// Walking from the least relevant item, items are alternately pushed to the
/// front and the back of the output. For `[d1, d2, d3, d4, d5]` this gives
/// `[d1, d3, d5, d4, d2]`.
///
/// The result is a permutation of the input. For any two positions `i` and
/// `j` where `i` is strictly closer to an end than `j`, the item at `i` was
/// ranked at least as well as the item at `j`.
pub fn long_context_reorder<T>(ranked: Vec<T>) -> Vec<T> {
    let mut reordered = VecDeque::with_capacity(ranked.len());

    for (i, item) in ranked.into_iter().rev().enumerate() {
        if i % 2 == 1 {
            reordered.push_back(item);
        } else {
            reordered.push_front(item);
        }
    }

    reordered.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faq_core::Document;

    /// Check the ends-best invariant on a reordering of `0..n` ranks.
    fn assert_ends_best(output: &[usize]) {
        let n = output.len();
        let distance = |i: usize| i.min(n - 1 - i);

        for i in 0..n {
            for j in 0..n {
                if distance(i) < distance(j) {
                    assert!(
                        output[i] <= output[j],
                        "rank {} at position {} is worse than rank {} at position {} in {:?}",
                        output[i],
                        i,
                        output[j],
                        j,
                        output
                    );
                }
            }
        }
    }

    #[test]
    fn test_five_documents() {
        let docs: Vec<Document> = ["d1", "d2", "d3", "d4", "d5"]
            .iter()
            .map(|s| Document::new(*s))
            .collect();

        let reordered = long_context_reorder(docs);
        let order: Vec<&str> = reordered.iter().map(|d| d.content.as_str()).collect();

        assert_eq!(order, vec!["d1", "d3", "d5", "d4", "d2"]);
        // Best two at the ends, worst in the center.
        assert_eq!(order[2], "d5");
    }

    #[test]
    fn test_even_length() {
        let reordered = long_context_reorder(vec![1, 2, 3, 4]);
        assert_eq!(reordered, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_ends_best_invariant() {
        for n in [0usize, 1, 2, 3, 4, 5, 10] {
            let ranks: Vec<usize> = (1..=n).collect();
            let reordered = long_context_reorder(ranks);
            assert_eq!(reordered.len(), n);
            assert_ends_best(&reordered);
        }
    }

    #[test]
    fn test_is_permutation() {
        for n in 0..=12usize {
            let ranks: Vec<usize> = (0..n).collect();
            let mut reordered = long_context_reorder(ranks.clone());
            reordered.sort_unstable();
            assert_eq!(reordered, ranks);
        }
    }

    #[test]
    fn test_permutation_keeps_duplicates() {
        let reordered = long_context_reorder(vec!["a", "b", "a", "c"]);
        let mut sorted = reordered.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["a", "a", "b", "c"]);
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(long_context_reorder(Vec::<u8>::new()).is_empty());
        assert_eq!(long_context_reorder(vec!["only"]), vec!["only"]);
        assert_eq!(long_context_reorder(vec![1, 2]), vec![2, 1]);
    }
}
