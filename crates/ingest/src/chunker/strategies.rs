//! Chunking strategies: word windows, sentence windows and greedy sentence packing.

use tracing::debug;

use super::types::ChunkError;
use super::window::{join_span, pack_sentences, pair_with_previous, validate_window, window_spans};
use crate::tokenize::{Tokenizer, UnicodeTokenizer};

// ── Word windows ────────────────────────────────────────────────────────────

/// Split `text` into overlapping windows of `words_per_chunk` word tokens.
pub fn chunk_by_words(
    text: &str,
    words_per_chunk: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkError> {
    chunk_by_words_with(&UnicodeTokenizer, text, words_per_chunk, overlap)
}

pub fn chunk_by_words_with(
    tokenizer: &dyn Tokenizer,
    text: &str,
    words_per_chunk: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkError> {
    validate_window("words", words_per_chunk, overlap)?;

    let words = tokenizer.words(text)?;
    if words.is_empty() {
        debug!("nothing to chunk");
        return Ok(Vec::new());
    }

    // Every window after the first is back-extended.
    Ok(window_spans(words.len(), words_per_chunk, overlap, 0)
        .into_iter()
        .map(|span| join_span(&words, span))
        .collect())
}

// ── Sentence windows ────────────────────────────────────────────────────────

/// Split `text` into overlapping windows of `sentences_per_chunk` sentences.
pub fn chunk_by_sentences(
    text: &str,
    sentences_per_chunk: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkError> {
    chunk_by_sentences_with(&UnicodeTokenizer, text, sentences_per_chunk, overlap)
}

pub fn chunk_by_sentences_with(
    tokenizer: &dyn Tokenizer,
    text: &str,
    sentences_per_chunk: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkError> {
    validate_window("sentences", sentences_per_chunk, overlap)?;

    let sentences = tokenizer.sentences(text)?;
    if sentences.is_empty() {
        debug!("nothing to chunk");
        return Ok(Vec::new());
    }

    // Back-extension only once the cursor is past index 1.
    Ok(window_spans(sentences.len(), sentences_per_chunk, overlap, 1)
        .into_iter()
        .map(|span| join_span(&sentences, span))
        .collect())
}

// ── Greedy packing ──────────────────────────────────────────────────────────

/// Pack whole sentences up to `max_words_per_chunk` words, then emit each
/// packed chunk joined with its predecessor.
///
/// Every output after the first repeats the full previous chunk, so this
/// roughly doubles the indexed volume compared with the window strategies.
pub fn chunk_greedy(text: &str, max_words_per_chunk: usize) -> Result<Vec<String>, ChunkError> {
    chunk_greedy_with(&UnicodeTokenizer, text, max_words_per_chunk)
}

pub fn chunk_greedy_with(
    tokenizer: &dyn Tokenizer,
    text: &str,
    max_words_per_chunk: usize,
) -> Result<Vec<String>, ChunkError> {
    super::types::ChunkStrategy::Greedy { max_words_per_chunk }.validate()?;

    let sentences = tokenizer.sentences(text)?;
    if sentences.is_empty() {
        debug!("nothing to chunk");
        return Ok(Vec::new());
    }

    let grouped = sentences
        .iter()
        .map(|s| tokenizer.words(s))
        .collect::<Result<Vec<_>, _>>()?;

    let packed = pack_sentences(grouped, max_words_per_chunk);
    Ok(pair_with_previous(&packed))
}
