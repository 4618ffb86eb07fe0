use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Document ingestion for retrieval-augmented generation.
///
/// Extracts text from files and URLs, chunks it, embeds every chunk and
/// stores the vectors in a Chroma collection.
#[derive(Parser, Debug)]
#[command(name = "ragline", version, about = "Chunk, embed and index documents")]
pub struct CliArgs {
    /// Settings file (default: ./ragline.toml, then ~/.config/ragline/config.toml)
    #[arg(long, global = true, env = "RAGLINE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest documents into the configured collection.
    Ingest(IngestArgs),

    /// Print the chunks one file would produce, without embedding anything.
    Chunk {
        /// File to extract and chunk
        file: PathBuf,

        /// Chunker override: words, sentences or greedy
        #[arg(long)]
        chunker: Option<String>,
    },

    /// List the collections in the vector index.
    Collections,

    /// Stream chat replies for each line read from stdin.
    Chat {
        /// Model override (defaults to `chat_model`)
        #[arg(long)]
        model: Option<String>,

        /// System prompt sent at the start of every turn
        #[arg(long, env = "RAGLINE_SYSTEM_PROMPT", default_value = "You are a helpful assistant.")]
        system_prompt: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct IngestArgs {
    /// Directory to walk (defaults to `source_dir`)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// File listing one path or URL per line
    #[arg(long)]
    pub list: Option<PathBuf>,

    /// URL to fetch and ingest (repeatable)
    #[arg(long = "url")]
    pub urls: Vec<String>,

    /// Chunker override: words, sentences or greedy
    #[arg(long)]
    pub chunker: Option<String>,

    /// Collection override
    #[arg(long)]
    pub collection: Option<String>,

    /// Keep an existing collection instead of recreating it
    #[arg(long)]
    pub keep_collection: bool,

    /// Documents prepared concurrently (0 = available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl IngestArgs {
    /// Settings keys set by flags, applied above the file and environment.
    pub fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        if let Some(chunker) = &self.chunker {
            overrides.push(("chunker", chunker.clone()));
        }
        if let Some(collection) = &self.collection {
            overrides.push(("collection", collection.clone()));
        }
        if self.keep_collection {
            overrides.push(("reset_collection", "false".to_string()));
        }
        if let Some(workers) = self.workers {
            overrides.push(("workers", workers.to_string()));
        }
        if let Some(dir) = &self.dir {
            overrides.push(("source_dir", dir.display().to_string()));
        }
        overrides
    }
}
