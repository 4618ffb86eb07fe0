//! Vector index collaborator: where embedded chunks end up.

mod chroma;
mod memory;

pub use chroma::ChromaIndex;
pub use memory::MemoryIndex;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::Transient;

pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Index API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Index request timed out after {0:?}")]
    Timeout(Duration),
}

impl Transient for IndexError {
    fn is_transient(&self) -> bool {
        match self {
            IndexError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            IndexError::Api { status, .. } => *status == 429 || *status >= 500,
            IndexError::Timeout(_) => true,
            IndexError::CollectionNotFound(_) => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        IndexError::Timeout(after)
    }
}

/// One embedded chunk as submitted to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: Metadata,
}

impl IndexRecord {
    /// Chunk ids are `"{source}#{chunk_index}"`.
    pub fn chunk_id(source: &str, chunk_index: usize) -> String {
        format!("{source}#{chunk_index}")
    }
}

/// Collection metadata requesting cosine distance.
pub fn cosine_space() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("hnsw:space".into(), "cosine".into());
    metadata
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn list_collections(&self) -> Result<BTreeSet<String>, IndexError>;

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError>;

    async fn get_or_create_collection(&self, name: &str, metadata: &Metadata) -> Result<(), IndexError>;

    /// Store one record. A record whose id already exists in the collection
    /// replaces it, so re-ingesting a changed document overwrites its chunks.
    async fn add(&self, collection: &str, record: &IndexRecord) -> Result<(), IndexError>;
}
