pub mod config;
pub mod error;
pub mod settings;

pub use config::{ChunkingConfig, Config, FailurePolicy};
pub use error::ConfigError;
pub use settings::{load_dotenv, Settings};
