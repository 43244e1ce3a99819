use crate::core::{DiffResult, ItemMatcher, Watchlist};
use std::collections::HashSet;

/// `to_add_to_a = b - a`, `to_add_to_b = a - b`, by raw item identity.
pub fn diff(a: &Watchlist, b: &Watchlist) -> DiffResult {
    DiffResult {
        to_add_to_a: b.difference(a).cloned().collect(),
        to_add_to_b: a.difference(b).cloned().collect(),
    }
}

/// Same contract as [`diff`], but membership is decided on `matcher.key`.
/// Items keep the representation of the side they came from.
pub fn diff_with(a: &Watchlist, b: &Watchlist, matcher: &dyn ItemMatcher) -> DiffResult {
    let keys_a: HashSet<String> = a.iter().map(|item| matcher.key(item)).collect();
    let keys_b: HashSet<String> = b.iter().map(|item| matcher.key(item)).collect();

    DiffResult {
        to_add_to_a: missing_from(b, &keys_a, matcher),
        to_add_to_b: missing_from(a, &keys_b, matcher),
    }
}

fn missing_from(source: &Watchlist, present: &HashSet<String>, matcher: &dyn ItemMatcher) -> Watchlist {
    let mut pushed = HashSet::new();
    source
        .iter()
        // 同一側有多個項目對應到同一個 key 時只推送第一個
        .filter(|item| {
            let key = matcher.key(item);
            !present.contains(&key) && pushed.insert(key)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matching::{ExactMatcher, NormalizedTitleMatcher};
    use crate::core::WatchlistItem;

    fn list(items: &[&str]) -> Watchlist {
        items.iter().copied().map(WatchlistItem::from).collect()
    }

    fn sample_sets() -> Vec<Watchlist> {
        vec![
            list(&[]),
            list(&["Her"]),
            list(&["Inception", "Dune"]),
            list(&["Dune", "Arrival"]),
            list(&["Arrival", "Dune", "Inception", "Her"]),
            list(&["Alien", "Aliens", "Alien 3"]),
        ]
    }

    #[test]
    fn test_diff_movie_scenario() {
        let a = list(&["Inception", "Dune"]);
        let b = list(&["Dune", "Arrival"]);

        let result = diff(&a, &b);

        assert_eq!(result.to_add_to_a, list(&["Arrival"]));
        assert_eq!(result.to_add_to_b, list(&["Inception"]));
    }

    #[test]
    fn test_diff_identical_sets_is_empty() {
        let a = list(&["Her"]);
        let result = diff(&a, &a.clone());

        assert!(result.is_empty());
    }

    #[test]
    fn test_diff_empty_inputs() {
        assert!(diff(&list(&[]), &list(&[])).is_empty());

        let b = list(&["Dune", "Arrival"]);
        let result = diff(&list(&[]), &b);
        assert_eq!(result.to_add_to_a, b);
        assert!(result.to_add_to_b.is_empty());
    }

    #[test]
    fn test_diff_matches_set_difference_for_all_pairs() {
        for a in sample_sets() {
            for b in sample_sets() {
                let result = diff(&a, &b);

                let expected_a: Watchlist = b.difference(&a).cloned().collect();
                let expected_b: Watchlist = a.difference(&b).cloned().collect();
                assert_eq!(result.to_add_to_a, expected_a);
                assert_eq!(result.to_add_to_b, expected_b);

                // 交換參數時兩個結果也交換
                assert_eq!(result, diff(&b, &a).swap());
            }
            assert!(diff(&a, &a).is_empty());
        }
    }

    #[test]
    fn test_diff_with_exact_matcher_equals_diff() {
        for a in sample_sets() {
            for b in sample_sets() {
                assert_eq!(diff_with(&a, &b, &ExactMatcher), diff(&a, &b));
            }
        }
    }

    #[test]
    fn test_diff_with_normalized_matcher() {
        let a = list(&["Dune ", "Spider-Man: No Way Home"]);
        let b = list(&["dune", "Spider Man  No Way Home", "Arrival"]);

        let result = diff_with(&a, &b, &NormalizedTitleMatcher);

        assert_eq!(result.to_add_to_a, list(&["Arrival"]));
        assert!(result.to_add_to_b.is_empty());
    }

    #[test]
    fn test_diff_with_collapses_same_side_duplicates() {
        let a = list(&["Dune", "DUNE"]);
        let b = list(&[]);

        let result = diff_with(&a, &b, &NormalizedTitleMatcher);

        assert_eq!(result.to_add_to_b.len(), 1);
    }
}
