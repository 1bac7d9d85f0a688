use std::collections::BTreeSet;

/// Anything that carries question body text usable for similarity scoring.
pub trait HasContent {
    fn content(&self) -> &str;
}

/// Normalize question text for similarity comparison: lowercase, strip
/// characters that are neither alphanumeric nor whitespace, and collapse
/// multiple spaces. Punctuation is removed in place, so "large-scale" and
/// "don't" stay single tokens rather than splitting.
pub fn normalize_for_comparison(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                normalized.push(lower);
            }
        } else if ch.is_whitespace() {
            normalized.push(' ');
        }
    }

    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Set of significant words: normalized tokens longer than 2 characters.
/// The length cutoff drops "the", "and", "is" and the like without a
/// stop-word list.
pub fn word_set(text: &str) -> BTreeSet<String> {
    normalize_for_comparison(text)
        .split_whitespace()
        .filter(|token| token.len() > 2)
        .map(|token| token.to_string())
        .collect()
}

/// Jaccard similarity between two word sets: |intersection| / |union|.
/// Empty input on either side scores 0, never NaN.
pub fn jaccard_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count() as f32;
    let union = a.union(b).count() as f32;

    intersection / union
}

/// Highest similarity of `content` against any corpus entry. An empty corpus
/// gives no basis for comparison and scores 0.
pub fn max_similarity_to_corpus(content: &str, corpus: &[String]) -> f32 {
    if corpus.is_empty() {
        return 0.0;
    }

    let candidate_tokens = word_set(content);
    let mut max = 0.0_f32;
    for existing in corpus {
        let sim = jaccard_similarity(&candidate_tokens, &word_set(existing));
        if sim > max {
            max = sim;
        }
    }
    max
}

/// Whether two question texts share enough significant words to count as the
/// same question.
pub fn are_similar(a: &str, b: &str, threshold: f32) -> bool {
    jaccard_similarity(&word_set(a), &word_set(b)) >= threshold
}

/// Keep the `count` candidates with the lowest max similarity to the corpus,
/// i.e. the ones least likely to repeat recently published questions.
///
/// Ties keep their original relative order (stable sort), so identical inputs
/// always produce identical output. When there are no more candidates than
/// requested, the input comes back untouched without any scoring.
pub fn select_least_similar<T: HasContent>(
    candidates: Vec<T>,
    corpus: &[String],
    count: usize,
) -> Vec<T> {
    if candidates.len() <= count {
        return candidates;
    }

    let mut scored: Vec<(f32, T)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = max_similarity_to_corpus(candidate.content(), corpus);
            (score, candidate)
        })
        .collect();

    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    scored
        .into_iter()
        .take(count)
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Strict variant: drop every candidate that clears `threshold` against any
/// single corpus entry, keep the rest.
pub fn filter_duplicates<T: HasContent>(
    candidates: Vec<T>,
    corpus: &[String],
    threshold: f32,
) -> Vec<T> {
    candidates
        .into_iter()
        .filter(|candidate| {
            !corpus
                .iter()
                .any(|existing| are_similar(candidate.content(), existing, threshold))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str);

    impl HasContent for Item {
        fn content(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn normalize_strips_punctuation_and_collapses_spaces() {
        assert_eq!(
            normalize_for_comparison("  Who won\tthe 2024  Election?! "),
            "who won the 2024 election"
        );
        assert_eq!(normalize_for_comparison(""), "");
        assert_eq!(normalize_for_comparison("?!...,;"), "");
    }

    #[test]
    fn normalize_removes_intraword_punctuation_without_splitting() {
        assert_eq!(
            normalize_for_comparison("a large-scale don't test"),
            "a largescale dont test"
        );
    }

    #[test]
    fn hyphenation_does_not_change_similarity() {
        let a = word_set("large-scale budget");
        let b = word_set("largescale budget");
        assert_eq!(jaccard_similarity(&a, &b), 1.0);
    }

    #[test]
    fn word_set_keeps_only_significant_tokens() {
        let set = word_set("Who is at the Top of it?");
        // "is", "at", "of", "it" fall under the length cutoff; "the" survives it
        assert!(set.contains("who"));
        assert!(set.contains("the"));
        assert!(set.contains("top"));
        assert_eq!(set.len(), 3);

        assert!(word_set("a is to of").is_empty());
        assert!(word_set("").is_empty());
    }

    #[test]
    fn jaccard_is_symmetric() {
        let a = word_set("capital city France paris");
        let b = word_set("capital country France lyon");
        assert_eq!(jaccard_similarity(&a, &b), jaccard_similarity(&b, &a));
    }

    #[test]
    fn jaccard_identical_nonempty_sets_score_one() {
        let a = word_set("What is the capital of France?");
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    #[test]
    fn jaccard_disjoint_sets_score_zero() {
        let a = word_set("capital France");
        let b = word_set("olympic medal table");
        assert_eq!(jaccard_similarity(&a, &b), 0.0);
    }

    #[test]
    fn jaccard_empty_sets_score_zero_not_nan() {
        let empty = BTreeSet::new();
        let sim = jaccard_similarity(&empty, &empty);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
    }

    #[test]
    fn corpus_max_is_zero_for_empty_corpus() {
        assert_eq!(max_similarity_to_corpus("anything at all here", &[]), 0.0);
    }

    #[test]
    fn corpus_max_tracks_the_closest_entry() {
        let corpus = vec![
            "Who won the 2024 election?".to_string(),
            "tallest mountain ranked".to_string(),
        ];
        let exact = max_similarity_to_corpus("Who won the 2024 election?", &corpus);
        let unrelated = max_similarity_to_corpus("capital france paris", &corpus);
        assert_eq!(exact, 1.0);
        assert_eq!(unrelated, 0.0);
    }

    #[test]
    fn select_returns_all_when_count_covers_candidates() {
        let candidates = vec![Item("first question here"), Item("second question here")];
        let corpus = vec!["first question here".to_string()];
        let kept = select_least_similar(candidates.clone(), &corpus, 5);
        assert_eq!(kept, candidates);
    }

    #[test]
    fn select_returns_exactly_count_items() {
        let candidates = vec![
            Item("alpha beta gamma"),
            Item("delta epsilon zeta"),
            Item("eta theta iota"),
            Item("kappa lambda question"),
        ];
        let kept = select_least_similar(candidates, &[], 2);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn select_with_empty_corpus_keeps_first_in_original_order() {
        let candidates = vec![
            Item("alpha beta gamma"),
            Item("delta epsilon zeta"),
            Item("eta theta iota"),
        ];
        let kept = select_least_similar(candidates, &[], 2);
        assert_eq!(kept, vec![Item("alpha beta gamma"), Item("delta epsilon zeta")]);
    }

    #[test]
    fn select_drops_the_near_duplicate() {
        let candidates = vec![
            Item("Who won the 2024 election?"),
            Item("What is the capital of France?"),
            Item("Who won the election in 2024?"),
        ];
        let corpus = vec!["Who won the 2024 election?".to_string()];
        let kept = select_least_similar(candidates, &corpus, 2);

        assert_eq!(kept.len(), 2);
        assert!(kept.contains(&Item("What is the capital of France?")));
        // both election phrasings have identical word sets and tie at 1.0;
        // the stable sort keeps the earlier one and excludes the later
        assert!(kept.contains(&Item("Who won the 2024 election?")));
        assert!(!kept.contains(&Item("Who won the election in 2024?")));
    }

    #[test]
    fn select_is_deterministic() {
        let make = || {
            vec![
                Item("Who won the 2024 election?"),
                Item("What is the capital of France?"),
                Item("Who won the election in 2024?"),
                Item("Which planet has the most moons?"),
            ]
        };
        let corpus = vec![
            "Who won the 2024 election?".to_string(),
            "Which planet is closest to the sun?".to_string(),
        ];
        let first = select_least_similar(make(), &corpus, 2);
        let second = select_least_similar(make(), &corpus, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn filter_drops_candidates_over_threshold() {
        let candidates = vec![
            Item("Who won the 2024 election?"),
            Item("What is the capital of France?"),
        ];
        let corpus = vec![
            "Who won the election held in 2024?".to_string(),
            "Name the longest river in Asia".to_string(),
        ];
        let kept = filter_duplicates(candidates, &corpus, 0.45);
        assert_eq!(kept, vec![Item("What is the capital of France?")]);
    }

    #[test]
    fn filter_keeps_everything_for_empty_corpus() {
        let candidates = vec![Item("one question here"), Item("another question here")];
        let kept = filter_duplicates(candidates.clone(), &[], 0.45);
        assert_eq!(kept, candidates);
    }
}
