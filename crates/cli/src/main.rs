mod cli;
mod config;
mod terminal;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use tracing::info;

use ragline_core::config::{ChunkingConfig, IndexConfig, OllamaConfig};
use ragline_core::{Config, Settings};
use ragline_ingest::document::parse_source_list;
use ragline_ingest::{
    discover, embedding, ChromaIndex, ChunkStrategy, Chunker, DefaultExtractor, DocumentSource,
    Extractor, IngestOptions, Pipeline, VectorIndex,
};
use ragline_llm::{create_provider, format_history, ChatProvider, MessageAccumulator};

use crate::cli::{CliArgs, Command, IngestArgs};
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    ragline_core::load_dotenv();

    let args = CliArgs::parse();
    let terminal = Terminal::new();
    let config_path = args.config.as_deref();

    match args.command {
        Command::Ingest(ingest) => run_ingest(config_path, ingest, &terminal).await,
        Command::Chunk { file, chunker } => run_chunk(config_path, &file, chunker, &terminal).await,
        Command::Collections => run_collections(config_path, &terminal).await,
        Command::Chat { model, system_prompt } => {
            run_chat(config_path, model, &system_prompt, &terminal).await
        }
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Sources named on the command line, or everything under the source directory.
fn collect_sources(args: &IngestArgs, config: &Config) -> Result<Vec<DocumentSource>> {
    let mut sources = Vec::new();
    if let Some(list) = &args.list {
        let content = std::fs::read_to_string(list)
            .with_context(|| format!("failed to read source list {}", list.display()))?;
        sources.extend(parse_source_list(&content)?);
    }
    for url in &args.urls {
        sources.push(DocumentSource::parse(url)?);
    }
    if sources.is_empty() || args.dir.is_some() {
        sources.extend(discover(&config.ingest.source_dir)?);
    }
    Ok(sources)
}

async fn run_ingest(config_path: Option<&Path>, args: IngestArgs, terminal: &Terminal) -> Result<()> {
    let settings = config::load_settings(config_path, &args.overrides())?;
    let config = Config::from_settings(&settings).context("invalid configuration")?;
    config.log_summary();

    let chunker = Chunker::new(ChunkStrategy::from_config(&config.chunking)?)?;
    let sources = collect_sources(&args, &config)?;
    if sources.is_empty() {
        terminal.print_info(&format!(
            "No documents found in {}",
            config.ingest.source_dir.display()
        ))?;
        return Ok(());
    }

    let client = http_client(config.index.request_timeout_secs)?;
    let extractor: Arc<dyn Extractor> = Arc::new(DefaultExtractor::with_client(client.clone()));
    let embedder = embedding::from_config(&config, client.clone());
    let index: Arc<dyn VectorIndex> = Arc::new(ChromaIndex::new(client, &config.index.url));

    let pipeline = Pipeline::new(
        extractor,
        chunker,
        embedder,
        index,
        IngestOptions::from_config(&config),
    );
    let report = pipeline.run(sources).await?;
    terminal.print_report(&report)?;
    Ok(())
}

async fn run_chunk(
    config_path: Option<&Path>,
    file: &Path,
    chunker_override: Option<String>,
    terminal: &Terminal,
) -> Result<()> {
    let overrides: Vec<(&str, String)> = chunker_override.into_iter().map(|c| ("chunker", c)).collect();
    let settings = config::load_settings(config_path, &overrides)?;
    let chunking = ChunkingConfig::from_settings(&settings)?;
    let chunker = Chunker::new(ChunkStrategy::from_config(&chunking)?)?;

    let source = DocumentSource::from_path(file);
    let extractor = DefaultExtractor::new(Duration::from_secs(30))?;
    let doc = extractor.extract(&source).await?;
    let Some(kind) = doc.kind else {
        bail!("{}: unrecognized content type", source);
    };
    info!(source = %source, kind = %kind, pages = doc.pages.len(), chars = doc.total_chars(), "Extracted");

    let chunks = chunker.chunk(&doc.full_text())?;
    terminal.print_chunks(&source.label(), &chunker.strategy().to_string(), &chunks)?;
    Ok(())
}

async fn run_collections(config_path: Option<&Path>, terminal: &Terminal) -> Result<()> {
    let settings = config::load_settings(config_path, &[])?;
    let index_config = IndexConfig::from_settings(&settings)?;
    let client = http_client(index_config.request_timeout_secs)?;
    let index = ChromaIndex::new(client, &index_config.url);
    let names = index
        .list_collections()
        .await
        .with_context(|| format!("failed to list collections at {}", index_config.url))?;
    terminal.print_collections(&names)?;
    Ok(())
}

async fn run_chat(
    config_path: Option<&Path>,
    model: Option<String>,
    system_prompt: &str,
    terminal: &Terminal,
) -> Result<()> {
    let settings: Settings = config::load_settings(config_path, &[])?;
    let mut ollama = OllamaConfig::from_settings(&settings);
    if let Some(model) = model {
        ollama.chat_model = model;
    }
    let provider = create_provider(&ollama);
    terminal.print_banner(provider.model())?;

    let mut history: Vec<(String, String)> = Vec::new();
    let mut stdin = io::stdin().lock();

    while let Some(input) = terminal.read_input(&mut stdin)? {
        if input.is_empty() {
            continue;
        }

        let messages = format_history(&input, &history, system_prompt);
        let mut stream = match provider.stream(messages).await {
            Ok(stream) => stream,
            Err(e) => {
                terminal.print_error(&e.to_string())?;
                continue;
            }
        };

        let mut reply = MessageAccumulator::new();
        while let Some(delta) = stream.next().await {
            match delta {
                Ok(text) => {
                    reply.push(&text);
                    terminal.print_delta(&text)?;
                }
                Err(e) => {
                    terminal.end_reply()?;
                    terminal.print_error(&e.to_string())?;
                    break;
                }
            }
        }
        terminal.end_reply()?;

        if !reply.is_empty() {
            history.push((input, reply.as_str().to_string()));
        }
    }

    terminal.print_info("Goodbye.")?;
    Ok(())
}
