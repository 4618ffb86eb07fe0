use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing configuration. Always raised before any I/O and never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingKey(String),

    #[error("invalid value for '{key}': {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(String),

    #[error("{unit} per chunk must be 2 or more, got {budget}")]
    BudgetTooSmall { unit: &'static str, budget: usize },

    #[error("{unit} overlap must be 0 or more and less than {unit} per chunk - 1 (overlap {overlap}, budget {budget})")]
    OverlapOutOfRange {
        unit: &'static str,
        overlap: usize,
        budget: usize,
    },

    #[error("unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
