//! Tests for the chunking engine.

use std::sync::Arc;

use ragline_core::{ChunkingConfig, ConfigError};

use super::window::{pack_sentences, pair_with_previous, window_spans};
use super::*;
use crate::tokenize::{TokenizationError, Tokenizer};

fn numbered_words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

fn numbered_sentences(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Sentence {i} ends here.")).collect()
}

/// A sentence of exactly `tokens` word tokens (the final period counts as one).
fn sentence_with_tokens(label: &str, tokens: usize) -> String {
    let mut words = vec![label.to_string()];
    words.extend(std::iter::repeat("lorem".to_string()).take(tokens - 3));
    words.push("end.".to_string());
    words.join(" ")
}

fn word_indices(chunk: &str) -> Vec<usize> {
    chunk
        .split_whitespace()
        .map(|w| w.trim_start_matches('w').parse().unwrap())
        .collect()
}

// ── Word windows ────────────────────────────────────────────────────

#[test]
fn words_cover_every_word_with_disjoint_cores() {
    for budget in 2..8 {
        for overlap in 0..budget - 1 {
            for n in 1..30 {
                let chunks = chunk_by_words(&numbered_words(n), budget, overlap).unwrap();
                let step = budget - overlap;
                let mut seen = vec![0usize; n];

                for (k, chunk) in chunks.iter().enumerate() {
                    let idx = word_indices(chunk);
                    let cursor = k * step;
                    let start = if k == 0 { 0 } else { cursor.saturating_sub(overlap) };
                    let end = (cursor + budget).min(n);
                    assert_eq!(idx, (start..end).collect::<Vec<_>>(), "b={budget} o={overlap} n={n} k={k}");
                    assert!(idx.len() <= budget + overlap);

                    for core in cursor..(cursor + step).min(n) {
                        seen[core] += 1;
                    }
                }
                assert!(seen.iter().all(|&c| c == 1), "cores must tile [0, {n}) exactly once");
                assert_eq!(chunks.len(), n.div_ceil(step));
            }
        }
    }
}

#[test]
fn words_without_overlap_partition_the_text() {
    let chunks = chunk_by_words(&numbered_words(7), 3, 0).unwrap();
    assert_eq!(chunks, vec!["w0 w1 w2", "w3 w4 w5", "w6"]);
}

#[test]
fn words_overlap_prepends_previous_tail() {
    let chunks = chunk_by_words(&numbered_words(10), 4, 2).unwrap();
    assert_eq!(
        chunks,
        vec!["w0 w1 w2 w3", "w0 w1 w2 w3 w4 w5", "w2 w3 w4 w5 w6 w7", "w4 w5 w6 w7 w8 w9", "w6 w7 w8 w9"]
    );
}

#[test]
fn words_empty_text_yields_no_chunks() {
    for (budget, overlap) in [(2, 0), (5, 3), (1000, 200)] {
        assert!(chunk_by_words("", budget, overlap).unwrap().is_empty());
        assert!(chunk_by_words("  \n\t ", budget, overlap).unwrap().is_empty());
    }
}

#[test]
fn words_reject_budget_of_one() {
    let err = chunk_by_words("a b c", 1, 0).unwrap_err();
    assert!(matches!(err, ChunkError::Config(ConfigError::BudgetTooSmall { budget: 1, .. })));
}

#[test]
fn words_reject_overlap_of_budget_minus_one() {
    let err = chunk_by_words("a b c", 5, 4).unwrap_err();
    assert!(matches!(
        err,
        ChunkError::Config(ConfigError::OverlapOutOfRange { overlap: 4, budget: 5, .. })
    ));
}

#[test]
fn invalid_parameters_fail_before_tokenizing() {
    let chunker = Chunker::with_tokenizer(
        ChunkStrategy::Words { words_per_chunk: 4, overlap: 0 },
        Arc::new(BrokenTokenizer),
    )
    .unwrap();
    // Valid params reach the tokenizer...
    assert!(matches!(chunker.chunk("text"), Err(ChunkError::Tokenization(_))));
    // ...invalid ones never do.
    assert!(matches!(
        chunk_by_words_with(&BrokenTokenizer, "text", 4, 3),
        Err(ChunkError::Config(_))
    ));
}

// ── Sentence windows ────────────────────────────────────────────────

#[test]
fn sentences_three_without_overlap_on_seven() {
    let sents = numbered_sentences(7);
    let chunks = chunk_by_sentences(&sents.join(" "), 3, 0).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], sents[0..3].join(" "));
    assert_eq!(chunks[1], sents[3..6].join(" "));
    assert_eq!(chunks[2], sents[6]);
}

#[test]
fn sentences_five_overlap_two_on_twelve() {
    // Cursor runs 0, 3, 6, 9. Only the first window (cursor 0) is not back-extended.
    let sents = numbered_sentences(12);
    let chunks = chunk_by_sentences(&sents.join(" "), 5, 2).unwrap();
    assert_eq!(
        chunks,
        vec![
            sents[0..5].join(" "),
            sents[1..8].join(" "),
            sents[4..11].join(" "),
            sents[7..12].join(" "),
        ]
    );
}

#[test]
fn sentences_backextend_starts_after_cursor_one() {
    // Step of 1 isolates the cursor rule: at cursor 1 the window is not extended.
    assert_eq!(window_spans(5, 2, 1, 1), vec![(0, 2), (1, 3), (1, 4), (2, 5), (3, 5)]);
    // The word rule extends from cursor 1 on.
    assert_eq!(window_spans(5, 2, 1, 0), vec![(0, 2), (0, 3), (1, 4), (2, 5), (3, 5)]);
}

#[test]
fn sentences_validate_like_words() {
    assert!(matches!(
        chunk_by_sentences("A. B.", 1, 0),
        Err(ChunkError::Config(ConfigError::BudgetTooSmall { unit: "sentences", .. }))
    ));
    assert!(matches!(
        chunk_by_sentences("A. B.", 3, 2),
        Err(ChunkError::Config(ConfigError::OverlapOutOfRange { .. }))
    ));
    assert!(chunk_by_sentences("", 15, 3).unwrap().is_empty());
}

// ── Greedy packing ──────────────────────────────────────────────────

#[test]
fn greedy_pairs_packed_chunks() {
    let text = [
        sentence_with_tokens("Alpha", 40),
        sentence_with_tokens("Bravo", 40),
        sentence_with_tokens("Charlie", 40),
        sentence_with_tokens("Delta", 40),
    ]
    .join(" ");

    let chunks = chunk_greedy(&text, 80).unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].starts_with("Alpha") && chunks[0].contains("Bravo"));
    assert!(!chunks[0].contains("Charlie"));
    for label in ["Alpha", "Bravo", "Charlie", "Delta"] {
        assert!(chunks[1].contains(label), "second chunk should contain {label}");
    }
    assert_eq!(chunks[1].split_whitespace().count(), 160);
}

#[test]
fn greedy_never_splits_a_sentence() {
    // 40-token sentences against a 60-word budget: each sentence packs alone.
    let text = [
        sentence_with_tokens("Alpha", 40),
        sentence_with_tokens("Bravo", 40),
        sentence_with_tokens("Charlie", 40),
    ]
    .join(" ");
    let chunks = chunk_greedy(&text, 60).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].split_whitespace().count(), 40);
    assert!(chunks[2].starts_with("Bravo") && chunks[2].contains("Charlie"));
}

#[test]
fn greedy_oversized_first_sentence_stands_alone() {
    let text = format!("{} {}", sentence_with_tokens("Huge", 30), sentence_with_tokens("Small", 5));
    let chunks = chunk_greedy(&text, 10).unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| !c.is_empty()));
    assert_eq!(chunks[0].split_whitespace().count(), 30);
}

#[test]
fn pack_skips_empty_flush() {
    let groups = vec![vec!["a".to_string(); 5], vec!["b".to_string(); 2]];
    assert_eq!(pack_sentences(groups, 3), vec!["a a a a a", "b b"]);
}

#[test]
fn pair_with_previous_repeats_predecessor() {
    let chunks = vec!["one".to_string(), "two".to_string(), "three".to_string()];
    assert_eq!(pair_with_previous(&chunks), vec!["one", "one two", "two three"]);
    assert!(pair_with_previous(&[]).is_empty());
}

#[test]
fn greedy_rejects_zero_budget_and_handles_empty() {
    assert!(matches!(chunk_greedy("Text.", 0), Err(ChunkError::Config(_))));
    assert!(chunk_greedy("   ", 100).unwrap().is_empty());
}

// ── Strategy & chunker ──────────────────────────────────────────────

#[test]
fn strategy_from_config() {
    let config = ChunkingConfig {
        chunker: "sentences".into(),
        ..ChunkingConfig::default()
    };
    assert_eq!(
        ChunkStrategy::from_config(&config).unwrap(),
        ChunkStrategy::Sentences { sentences_per_chunk: 15, overlap: 3 }
    );

    let config = ChunkingConfig {
        chunker: "semantic".into(),
        ..ChunkingConfig::default()
    };
    assert!(matches!(
        ChunkStrategy::from_config(&config),
        Err(ConfigError::UnknownVariant { kind: "chunker", .. })
    ));

    let config = ChunkingConfig {
        word_overlap: 999,
        ..ChunkingConfig::default()
    };
    assert!(ChunkStrategy::from_config(&config).is_err());
}

#[test]
fn chunker_rejects_invalid_strategy() {
    assert!(Chunker::new(ChunkStrategy::Words { words_per_chunk: 2, overlap: 1 }).is_err());
    assert!(Chunker::new(ChunkStrategy::Greedy { max_words_per_chunk: 1 }).is_ok());
}

#[test]
fn chunking_is_deterministic() {
    let text = numbered_sentences(40).join(" ");
    for strategy in [
        ChunkStrategy::Words { words_per_chunk: 17, overlap: 5 },
        ChunkStrategy::Sentences { sentences_per_chunk: 4, overlap: 1 },
        ChunkStrategy::Greedy { max_words_per_chunk: 20 },
    ] {
        let chunker = Chunker::new(strategy).unwrap();
        let first = chunker.chunk(&text).unwrap();
        for _ in 0..5 {
            assert_eq!(chunker.chunk(&text).unwrap(), first, "{strategy}");
        }
    }
}

struct BrokenTokenizer;

impl Tokenizer for BrokenTokenizer {
    fn sentences(&self, _text: &str) -> Result<Vec<String>, TokenizationError> {
        Err(TokenizationError("model not loaded".into()))
    }

    fn words(&self, _text: &str) -> Result<Vec<String>, TokenizationError> {
        Err(TokenizationError("model not loaded".into()))
    }
}
