use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::Settings;

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub ingest: IngestConfig,
    pub chunking: ChunkingConfig,
}

impl Config {
    /// Build typed config from a settings source. `embedmodel` is required.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            profile: settings.profile_label().to_string(),
            ollama: OllamaConfig::from_settings(settings),
            embedding: EmbeddingConfig::from_settings(settings)?,
            index: IndexConfig::from_settings(settings)?,
            ingest: IngestConfig::from_settings(settings)?,
            chunking: ChunkingConfig::from_settings(settings)?,
        })
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile);
        tracing::info!("  ollama:      url={}, chat_model={}", self.ollama.url, self.ollama.chat_model);
        tracing::info!(
            "  embedding:   provider={}, model={}, dims={}, key={}",
            self.embedding.provider,
            self.embedding.model,
            self.embedding.dimensions.map_or_else(|| "auto".to_string(), |d| d.to_string()),
            if self.embedding.openai_api_key.is_some() { "set" } else { "(none)" }
        );
        tracing::info!(
            "  index:       url={}, collection={}, reset={}",
            self.index.url,
            self.index.collection,
            self.index.reset_collection
        );
        tracing::info!(
            "  ingest:      source_dir={}, workers={}, on_failure={}",
            self.ingest.source_dir.display(),
            self.ingest.resolved_workers(),
            self.index.on_failure
        );
        tracing::info!("  chunking:    chunker={}", self.chunking.chunker);
    }
}

// ── Ollama (chat) ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub chat_model: String,
}

impl OllamaConfig {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            url: s.get_or("ollama_url", "http://localhost:11434"),
            chat_model: s.get_or("chat_model", "llama2"),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Model identifier passed to the embedding service (`embedmodel`).
    pub model: String,
    /// Expected vector width (`embedding_dimensions`). Unset means the width
    /// of the first response is accepted.
    pub dimensions: Option<usize>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        let provider = s.get_or("embedding_provider", "ollama").to_lowercase();
        if !matches!(provider.as_str(), "ollama" | "openai") {
            return Err(ConfigError::UnknownVariant {
                kind: "embedding provider",
                value: provider,
            });
        }
        let openai_api_key = s.get("openai_api_key");
        if provider == "openai" && openai_api_key.is_none() {
            return Err(ConfigError::MissingKey("openai_api_key".into()));
        }
        Ok(Self {
            provider,
            model: s.require("embedmodel")?,
            dimensions: s.parse_opt("embedding_dimensions")?,
            openai_api_key,
            openai_base_url: s.get("openai_base_url"),
        })
    }
}

// ── Vector index ──────────────────────────────────────────────

/// What to do with a chunk whose indexing still fails after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the whole ingestion run.
    Abort,
    /// Count the chunk as failed and continue with the next one.
    Skip,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::Skip => f.write_str("skip"),
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(ConfigError::UnknownVariant {
                kind: "index failure policy",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub url: String,
    pub collection: String,
    /// Delete an existing collection of the same name before ingesting.
    pub reset_collection: bool,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub on_failure: FailurePolicy,
}

impl IndexConfig {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            url: s.get_or("index_url", "http://localhost:8000"),
            collection: s.get_or("collection", "ragline"),
            reset_collection: s.bool_or("reset_collection", true)?,
            request_timeout_secs: s.parse_or("request_timeout_secs", 30)?,
            max_retries: s.parse_or("max_retries", 3)?,
            on_failure: match s.get("on_index_failure") {
                Some(raw) => raw.parse()?,
                None => FailurePolicy::Abort,
            },
        })
    }
}

// ── Ingestion ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub source_dir: PathBuf,
    /// Concurrent documents in flight (0 means use available parallelism).
    pub workers: usize,
}

impl IngestConfig {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            source_dir: PathBuf::from(s.get_or("source_dir", "SOURCE_DOCUMENTS")),
            workers: s.parse_or("workers", 0)?,
        })
    }

    /// Resolve worker count (0 means use available parallelism).
    pub fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.workers
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

/// Raw chunker parameters. Validation happens when the ingest crate turns
/// this into a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// "words", "sentences" or "greedy"
    pub chunker: String,
    pub words_per_chunk: usize,
    pub word_overlap: usize,
    pub sentences_per_chunk: usize,
    pub sentence_overlap: usize,
    pub max_words_per_chunk: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunker: "words".to_string(),
            words_per_chunk: 1000,
            word_overlap: 200,
            sentences_per_chunk: 15,
            sentence_overlap: 3,
            max_words_per_chunk: 100,
        }
    }
}

impl ChunkingConfig {
    pub fn from_settings(s: &Settings) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            chunker: s.get_or("chunker", &d.chunker).to_lowercase(),
            words_per_chunk: s.parse_or("words_per_chunk", d.words_per_chunk)?,
            word_overlap: s.parse_or("word_overlap", d.word_overlap)?,
            sentences_per_chunk: s.parse_or("sentences_per_chunk", d.sentences_per_chunk)?,
            sentence_overlap: s.parse_or("sentence_overlap", d.sentence_overlap)?,
            max_words_per_chunk: s.parse_or("max_words_per_chunk", d.max_words_per_chunk)?,
        })
    }
}
