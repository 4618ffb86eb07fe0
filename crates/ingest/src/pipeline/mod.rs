//! Ingestion driver.
//!
//! Sources are extracted and chunked concurrently (at most `workers` at a
//! time) and handed to embedding and indexing strictly in input order.

mod report;

pub use report::{DocumentReport, DocumentStatus, IngestReport};

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use ragline_core::{Config, ConfigError, FailurePolicy};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunker::{ChunkError, Chunker};
use crate::document::{DocumentSource, Extractor};
use crate::embedding::{Embedder, EmbeddingError};
use crate::index::{cosine_space, IndexError, IndexRecord, Metadata, VectorIndex};
use crate::retry::{with_retry, RetryPolicy};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("chunking failed for {source_label}: {error}")]
    Chunk {
        source_label: String,
        #[source]
        error: ChunkError,
    },

    #[error("embedding failed for {source_label}: {error}")]
    Embedding {
        source_label: String,
        #[source]
        error: EmbeddingError,
    },

    #[error("indexing failed for {source_label}: {error}")]
    Index {
        source_label: String,
        #[source]
        error: IndexError,
    },

    #[error("could not prepare collection '{collection}': {error}")]
    Collection {
        collection: String,
        #[source]
        error: IndexError,
    },

    #[error("document worker failed: {0}")]
    Worker(String),

    #[error("could not read source directory {path}: {message}")]
    Discovery { path: String, message: String },
}

/// Run-level knobs, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub collection: String,
    pub reset_collection: bool,
    pub workers: usize,
    pub retry: RetryPolicy,
    pub on_failure: FailurePolicy,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            collection: config.index.collection.clone(),
            reset_collection: config.index.reset_collection,
            workers: config.ingest.resolved_workers(),
            retry: RetryPolicy::from_config(&config.index),
            on_failure: config.index.on_failure,
        }
    }
}

/// List every file under `dir`, sorted by path. The directory is created if missing.
pub fn discover(dir: &Path) -> Result<Vec<DocumentSource>, IngestError> {
    let discovery_error = |message: String| IngestError::Discovery {
        path: dir.display().to_string(),
        message,
    };

    std::fs::create_dir_all(dir).map_err(|e| discovery_error(e.to_string()))?;

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| discovery_error(e.to_string()))?;
        if entry.file_type().is_file() {
            sources.push(DocumentSource::Path(entry.into_path()));
        }
    }
    debug!(dir = %dir.display(), count = sources.len(), "discovered documents");
    Ok(sources)
}

/// Make `name` ready to receive records. With `reset`, an existing collection
/// is deleted first; either way it is then fetched or created with cosine distance.
pub async fn prepare_collection(
    index: &dyn VectorIndex,
    name: &str,
    reset: bool,
    retry: &RetryPolicy,
) -> Result<(), IngestError> {
    let collection_error = |error: IndexError| IngestError::Collection {
        collection: name.to_string(),
        error,
    };

    if reset {
        let existing = with_retry(retry, "list collections", || index.list_collections())
            .await
            .map_err(collection_error)?;
        if existing.contains(name) {
            info!(collection = name, "Deleting existing collection");
            with_retry(retry, "delete collection", || index.delete_collection(name))
                .await
                .map_err(collection_error)?;
        }
    }

    let metadata = cosine_space();
    with_retry(retry, "create collection", || {
        index.get_or_create_collection(name, &metadata)
    })
    .await
    .map_err(collection_error)
}

/// What the concurrent stage hands to the ordered submission stage.
enum Prepared {
    Chunks(Vec<String>),
    Empty,
    Unrecognized,
    Skipped(String),
}

/// Extract and chunk one source. Only tokenizer failures are fatal.
async fn prepare_document(
    extractor: &dyn Extractor,
    chunker: &Chunker,
    source: &DocumentSource,
) -> Result<Prepared, IngestError> {
    let doc = match extractor.extract(source).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(source = %source, error = %e, "Extraction failed, skipping document");
            return Ok(Prepared::Skipped(e.to_string()));
        }
    };

    if doc.kind.is_none() {
        warn!(source = %source, "Unrecognized content type, nothing to index");
        return Ok(Prepared::Unrecognized);
    }

    let text = doc.full_text();
    let chunker = chunker.clone();
    let chunked = tokio::task::spawn_blocking(move || chunker.chunk(&text)).await;

    let chunks = match chunked {
        Ok(Ok(chunks)) => chunks,
        Ok(Err(error)) => {
            return Err(IngestError::Chunk {
                source_label: source.label(),
                error,
            })
        }
        Err(e) => {
            warn!(source = %source, error = %e, "Chunking worker failed, skipping document");
            return Ok(Prepared::Skipped(format!("chunking worker failed: {e}")));
        }
    };

    if chunks.is_empty() {
        Ok(Prepared::Empty)
    } else {
        Ok(Prepared::Chunks(chunks))
    }
}

/// A spawned document task, aborted when dropped so an abandoned run stops
/// extracting.
struct DocumentTask<T>(JoinHandle<T>);

impl<T> Future for DocumentTask<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for DocumentTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct Pipeline {
    extractor: Arc<dyn Extractor>,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    options: IngestOptions,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        options: IngestOptions,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embedder,
            index,
            options,
        }
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Prepare the collection, then ingest every source.
    pub async fn run(&self, sources: Vec<DocumentSource>) -> Result<IngestReport, IngestError> {
        let run_start = Instant::now();
        prepare_collection(
            self.index.as_ref(),
            &self.options.collection,
            self.options.reset_collection,
            &self.options.retry,
        )
        .await?;

        info!(
            documents = sources.len(),
            workers = self.options.workers,
            chunker = %self.chunker.strategy(),
            collection = %self.options.collection,
            "Starting ingestion"
        );

        // Documents are prepared on their own tasks, ahead of the ordered embedding loop.
        let extractor = Arc::clone(&self.extractor);
        let chunker = self.chunker.clone();
        let mut prepared = stream::iter(sources)
            .map(move |source| {
                let extractor = Arc::clone(&extractor);
                let chunker = chunker.clone();
                DocumentTask(tokio::spawn(async move {
                    let started = Instant::now();
                    let outcome = prepare_document(extractor.as_ref(), &chunker, &source).await;
                    (source, started, outcome)
                }))
            })
            .buffered(self.options.workers.max(1));

        let mut report = IngestReport::default();
        while let Some(joined) = prepared.next().await {
            let (source, started, outcome) =
                joined.map_err(|e| IngestError::Worker(e.to_string()))?;
            let source_label = source.label();
            let (status, chunks) = match outcome? {
                Prepared::Chunks(chunks) => {
                    let status = self.submit(&source_label, &chunks).await?;
                    (status, chunks.len())
                }
                Prepared::Empty => (DocumentStatus::Empty, 0),
                Prepared::Unrecognized => (DocumentStatus::Unrecognized, 0),
                Prepared::Skipped(reason) => (DocumentStatus::Skipped { reason }, 0),
            };

            let elapsed = started.elapsed();
            info!(
                source = %source_label,
                status = %status,
                chunks,
                doc_ms = elapsed.as_millis() as u64,
                run_ms = run_start.elapsed().as_millis() as u64,
                "Processed document"
            );
            report.documents.push(DocumentReport {
                source: source_label,
                status,
                chunks,
                elapsed,
            });
        }

        report.elapsed = run_start.elapsed();
        info!("{report}");
        Ok(report)
    }

    /// Embed and index every chunk of one document, in order.
    async fn submit(&self, source_label: &str, chunks: &[String]) -> Result<DocumentStatus, IngestError> {
        let retry = &self.options.retry;
        let collection = self.options.collection.as_str();
        let mut failed = 0;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let embedding = match with_retry(retry, "embed", || self.embedder.embed(chunk)).await {
                Ok(embedding) => embedding,
                Err(error) => {
                    self.log_chunk_failure(source_label, chunk_index, &error);
                    if self.options.on_failure == FailurePolicy::Abort {
                        return Err(IngestError::Embedding {
                            source_label: source_label.to_string(),
                            error,
                        });
                    }
                    failed += 1;
                    continue;
                }
            };

            let record = IndexRecord {
                id: IndexRecord::chunk_id(source_label, chunk_index),
                embedding,
                document: chunk.clone(),
                metadata: self.chunk_metadata(source_label, chunk_index, chunks.len()),
            };

            if let Err(error) =
                with_retry(retry, "index", || self.index.add(collection, &record)).await
            {
                self.log_chunk_failure(source_label, chunk_index, &error);
                if self.options.on_failure == FailurePolicy::Abort {
                    return Err(IngestError::Index {
                        source_label: source_label.to_string(),
                        error,
                    });
                }
                failed += 1;
            }
        }

        Ok(match failed {
            0 => DocumentStatus::Indexed,
            failed => DocumentStatus::Partial {
                indexed: chunks.len() - failed,
                failed,
            },
        })
    }

    fn log_chunk_failure(&self, source_label: &str, chunk_index: usize, error: &dyn fmt::Display) {
        let action = match self.options.on_failure {
            FailurePolicy::Abort => "aborting run",
            FailurePolicy::Skip => "skipping chunk",
        };
        warn!(source = source_label, chunk_index, error = %error, action, "Chunk failed after retries");
    }

    fn chunk_metadata(&self, source_label: &str, chunk_index: usize, chunk_count: usize) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), source_label.into());
        metadata.insert("chunk_index".into(), chunk_index.into());
        metadata.insert("chunk_count".into(), chunk_count.into());
        metadata.insert("chunker".into(), self.chunker.strategy().name().into());
        metadata
    }
}
