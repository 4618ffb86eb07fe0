//! Sentence and word tokenization.

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// The tokenizer backend could not be used. This is an environment problem,
/// never a property of the input text.
#[derive(Debug, Error)]
#[error("tokenizer unavailable: {0}")]
pub struct TokenizationError(pub String);

/// Splits text into sentences and word-level tokens.
///
/// Empty or whitespace-only input yields an empty sequence, not an error.
pub trait Tokenizer: Send + Sync {
    fn sentences(&self, text: &str) -> Result<Vec<String>, TokenizationError>;

    fn words(&self, text: &str) -> Result<Vec<String>, TokenizationError>;
}

/// UAX #29 segmentation. Punctuation marks come out as their own word tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeTokenizer;

impl Tokenizer for UnicodeTokenizer {
    fn sentences(&self, text: &str) -> Result<Vec<String>, TokenizationError> {
        Ok(text
            .unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn words(&self, text: &str) -> Result<Vec<String>, TokenizationError> {
        Ok(text
            .split_word_bounds()
            .filter(|w| !w.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sentences() {
        let sents = UnicodeTokenizer
            .sentences("First sentence. Second sentence! Third one?")
            .unwrap();
        assert_eq!(sents, vec!["First sentence.", "Second sentence!", "Third one?"]);
    }

    #[test]
    fn words_keep_punctuation_tokens() {
        let words = UnicodeTokenizer.words("Hello, world. It's fine.").unwrap();
        assert_eq!(words, vec!["Hello", ",", "world", ".", "It's", "fine", "."]);
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(UnicodeTokenizer.sentences("  \n\t ").unwrap().is_empty());
        assert!(UnicodeTokenizer.words("  \n\t ").unwrap().is_empty());
        assert!(UnicodeTokenizer.words("").unwrap().is_empty());
    }

    #[test]
    fn line_breaks_end_sentences() {
        let sents = UnicodeTokenizer.sentences("A heading\nBody text here.").unwrap();
        assert_eq!(sents, vec!["A heading", "Body text here."]);
    }
}
