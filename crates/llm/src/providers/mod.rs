pub mod ollama;

use ragline_core::config::OllamaConfig;

pub use ollama::OllamaProvider;

/// Chat provider for the configured Ollama server and chat model.
pub fn create_provider(config: &OllamaConfig) -> OllamaProvider {
    OllamaProvider::new(config.url.clone(), config.chat_model.clone())
}
