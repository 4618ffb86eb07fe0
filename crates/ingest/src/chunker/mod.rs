//! Chunking engine.
//!
//! Splits extracted text into bounded, overlapping chunks suitable for
//! embedding: sliding windows over words or sentences, or the legacy greedy
//! sentence packer with pairwise re-overlap.

mod strategies;
mod types;
mod window;

pub use strategies::{
    chunk_by_sentences, chunk_by_sentences_with, chunk_by_words, chunk_by_words_with,
    chunk_greedy, chunk_greedy_with,
};
pub use types::{ChunkError, ChunkStrategy, Chunker};

#[cfg(test)]
mod tests;
