pub mod provider;
pub mod providers;

pub use provider::{
    format_history, ChatProvider, LlmError, Message, MessageAccumulator, Role, TokenStream,
};
pub use providers::{create_provider, OllamaProvider};
