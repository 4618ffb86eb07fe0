//! Sliding-window and packing utilities shared by the chunking strategies.

use ragline_core::ConfigError;

/// Check a window budget and its overlap: `budget >= 2` and `overlap < budget - 1`.
pub(crate) fn validate_window(
    unit: &'static str,
    budget: usize,
    overlap: usize,
) -> Result<(), ConfigError> {
    if budget < 2 {
        return Err(ConfigError::BudgetTooSmall { unit, budget });
    }
    if overlap >= budget - 1 {
        return Err(ConfigError::OverlapOutOfRange { unit, overlap, budget });
    }
    Ok(())
}

/// Emitted spans of a sliding window over `n` units.
///
/// The cursor starts at 0 and advances by `budget - overlap`. Each span is
/// `[cursor, cursor + budget)` clipped to `n`; once `cursor > backextend_after`
/// the span start is pulled back by `overlap` units. Cores `[cursor, next cursor)`
/// are disjoint and cover `[0, n)`.
pub(crate) fn window_spans(
    n: usize,
    budget: usize,
    overlap: usize,
    backextend_after: usize,
) -> Vec<(usize, usize)> {
    let step = budget - overlap;
    let mut spans = Vec::with_capacity(n.div_ceil(step));
    let mut i = 0;
    while i < n {
        let end = (i + budget).min(n);
        let start = if overlap > 0 && i > backextend_after {
            i.saturating_sub(overlap)
        } else {
            i
        };
        spans.push((start, end));
        i += step;
    }
    spans
}

/// Join units `[start, end)` with single spaces.
pub(crate) fn join_span(units: &[String], (start, end): (usize, usize)) -> String {
    units[start..end].join(" ")
}

/// Pack per-sentence word groups into chunks of at most `max_words` words.
///
/// A sentence is never split: one longer than `max_words` becomes a chunk of
/// its own. Empty buffers are never flushed.
pub(crate) fn pack_sentences(sentences: Vec<Vec<String>>, max_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for words in sentences {
        if current.len() + words.len() <= max_words {
            current.extend(words);
        } else {
            if !current.is_empty() {
                chunks.push(current.join(" "));
            }
            current = words;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Concatenate every chunk with its immediate predecessor.
pub(crate) fn pair_with_previous(chunks: &[String]) -> Vec<String> {
    (0..chunks.len())
        .map(|i| chunks[i.saturating_sub(1)..=i].join(" "))
        .collect()
}
