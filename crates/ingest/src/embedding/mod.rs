pub mod ollama;
pub mod openai;
pub mod traits;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{Embedder, EmbeddingError, VectorWidth};

use std::sync::Arc;

use ragline_core::Config;
use reqwest::Client;

/// Build the embedder selected by `embedding_provider`.
///
/// Timeouts are applied per call by the retry wrapper.
pub fn from_config(config: &Config, client: Client) -> Arc<dyn Embedder> {
    let embedding = &config.embedding;
    match (embedding.provider.as_str(), &embedding.openai_api_key) {
        ("openai", Some(key)) => Arc::new(OpenAiEmbedder::new(
            client,
            key.clone(),
            embedding.model.clone(),
            embedding.openai_base_url.clone(),
            embedding.dimensions,
        )),
        _ => Arc::new(OllamaEmbedder::with_client(
            client,
            config.ollama.url.clone(),
            embedding.model.clone(),
            embedding.dimensions,
        )),
    }
}
