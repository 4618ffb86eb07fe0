//! Chunk strategy configuration and the runnable chunker.

use std::fmt;
use std::sync::Arc;

use ragline_core::{ChunkingConfig, ConfigError};
use thiserror::Error;

use super::strategies::{chunk_by_sentences_with, chunk_by_words_with, chunk_greedy_with};
use crate::tokenize::{TokenizationError, Tokenizer, UnicodeTokenizer};

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tokenization(#[from] TokenizationError),
}

// ── Strategy ────────────────────────────────────────────────────────────────

/// Which chunker a run uses, with its budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Sliding window over word tokens.
    Words { words_per_chunk: usize, overlap: usize },
    /// Sliding window over sentences.
    Sentences { sentences_per_chunk: usize, overlap: usize },
    /// Sentence packing to a word budget, then pairwise re-overlap.
    Greedy { max_words_per_chunk: usize },
}

impl ChunkStrategy {
    /// Pick the configured strategy and check its parameters.
    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        let strategy = match config.chunker.as_str() {
            "words" | "word" => ChunkStrategy::Words {
                words_per_chunk: config.words_per_chunk,
                overlap: config.word_overlap,
            },
            "sentences" | "sentence" => ChunkStrategy::Sentences {
                sentences_per_chunk: config.sentences_per_chunk,
                overlap: config.sentence_overlap,
            },
            "greedy" | "legacy" => ChunkStrategy::Greedy {
                max_words_per_chunk: config.max_words_per_chunk,
            },
            other => {
                return Err(ConfigError::UnknownVariant {
                    kind: "chunker",
                    value: other.to_string(),
                })
            }
        };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ChunkStrategy::Words { words_per_chunk, overlap } => {
                super::window::validate_window("words", words_per_chunk, overlap)
            }
            ChunkStrategy::Sentences { sentences_per_chunk, overlap } => {
                super::window::validate_window("sentences", sentences_per_chunk, overlap)
            }
            ChunkStrategy::Greedy { max_words_per_chunk } => {
                if max_words_per_chunk == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "max_words_per_chunk".into(),
                        value: "0".into(),
                        reason: "must be at least 1".into(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Short label stored in index metadata.
    pub fn name(&self) -> &'static str {
        match self {
            ChunkStrategy::Words { .. } => "words",
            ChunkStrategy::Sentences { .. } => "sentences",
            ChunkStrategy::Greedy { .. } => "greedy",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkStrategy::Words { words_per_chunk, overlap } => {
                write!(f, "words({words_per_chunk}, overlap {overlap})")
            }
            ChunkStrategy::Sentences { sentences_per_chunk, overlap } => {
                write!(f, "sentences({sentences_per_chunk}, overlap {overlap})")
            }
            ChunkStrategy::Greedy { max_words_per_chunk } => {
                write!(f, "greedy({max_words_per_chunk} words)")
            }
        }
    }
}

// ── Chunker ─────────────────────────────────────────────────────────────────

/// A validated strategy bound to a tokenizer. Cheap to clone into workers.
#[derive(Clone)]
pub struct Chunker {
    strategy: ChunkStrategy,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Chunker {
    pub fn new(strategy: ChunkStrategy) -> Result<Self, ConfigError> {
        Self::with_tokenizer(strategy, Arc::new(UnicodeTokenizer))
    }

    pub fn with_tokenizer(
        strategy: ChunkStrategy,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self, ConfigError> {
        strategy.validate()?;
        Ok(Self { strategy, tokenizer })
    }

    pub fn strategy(&self) -> ChunkStrategy {
        self.strategy
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkError> {
        let tokenizer = self.tokenizer.as_ref();
        match self.strategy {
            ChunkStrategy::Words { words_per_chunk, overlap } => {
                chunk_by_words_with(tokenizer, text, words_per_chunk, overlap)
            }
            ChunkStrategy::Sentences { sentences_per_chunk, overlap } => {
                chunk_by_sentences_with(tokenizer, text, sentences_per_chunk, overlap)
            }
            ChunkStrategy::Greedy { max_words_per_chunk } => {
                chunk_greedy_with(tokenizer, text, max_words_per_chunk)
            }
        }
    }
}

impl fmt::Debug for Chunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunker")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}
