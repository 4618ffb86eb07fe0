use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{IndexError, IndexRecord, Metadata, VectorIndex};

/// Chroma vector store over its REST API (`/api/v1`).
///
/// Records are upserted by collection id, so ids resolved from names are cached.
/// Upsert (not add) makes a repeated chunk id replace the stored record.
pub struct ChromaIndex {
    client: Client,
    base_url: String,
    ids: Mutex<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct CreateCollection<'a> {
    name: &'a str,
    metadata: &'a Metadata,
    get_or_create: bool,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    ids: [&'a str; 1],
    embeddings: [&'a [f32]; 1],
    documents: [&'a str; 1],
    metadatas: [&'a Metadata; 1],
}

impl<'a> From<&'a IndexRecord> for UpsertRequest<'a> {
    fn from(record: &'a IndexRecord) -> Self {
        Self {
            ids: [&record.id],
            embeddings: [&record.embedding],
            documents: [&record.document],
            metadatas: [&record.metadata],
        }
    }
}

impl ChromaIndex {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ids: Mutex::new(HashMap::new()),
        }
    }

    fn collections_url(&self) -> String {
        format!("{}/api/v1/collections", self.base_url)
    }

    fn upsert_url(&self, collection_id: &str) -> String {
        format!("{}/{}/upsert", self.collections_url(), collection_id)
    }

    fn cached_id(&self, name: &str) -> Option<String> {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn remember(&self, name: &str, id: Option<String>) {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        match id {
            Some(id) => ids.insert(name.to_string(), id),
            None => ids.remove(name),
        };
    }

    async fn collection_id(&self, name: &str) -> Result<String, IndexError> {
        if let Some(id) = self.cached_id(name) {
            return Ok(id);
        }
        let response = self
            .client
            .get(format!("{}/{}", self.collections_url(), name))
            .send()
            .await?;
        if is_missing(response.status()) {
            return Err(IndexError::CollectionNotFound(name.to_string()));
        }
        let info: CollectionInfo = check(response).await?.json().await?;
        self.remember(&info.name, Some(info.id.clone()));
        Ok(info.id)
    }
}

/// Unknown collections come back as 404.
fn is_missing(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
}

async fn check(response: Response) -> Result<Response, IndexError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(IndexError::Api { status, body })
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    async fn list_collections(&self) -> Result<BTreeSet<String>, IndexError> {
        let response = self.client.get(self.collections_url()).send().await?;
        let collections: Vec<CollectionInfo> = check(response).await?.json().await?;
        Ok(collections.into_iter().map(|c| c.name).collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        debug!(collection = name, "deleting collection");
        let response = self
            .client
            .delete(format!("{}/{}", self.collections_url(), name))
            .send()
            .await?;
        if is_missing(response.status()) {
            return Err(IndexError::CollectionNotFound(name.to_string()));
        }
        check(response).await?;
        self.remember(name, None);
        Ok(())
    }

    async fn get_or_create_collection(&self, name: &str, metadata: &Metadata) -> Result<(), IndexError> {
        let response = self
            .client
            .post(self.collections_url())
            .json(&CreateCollection {
                name,
                metadata,
                get_or_create: true,
            })
            .send()
            .await?;
        let info: CollectionInfo = check(response).await?.json().await?;
        debug!(collection = name, id = %info.id, "collection ready");
        self.remember(name, Some(info.id));
        Ok(())
    }

    async fn add(&self, collection: &str, record: &IndexRecord) -> Result<(), IndexError> {
        let id = self.collection_id(collection).await?;
        let response = self
            .client
            .post(self.upsert_url(&id))
            .json(&UpsertRequest::from(record))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_request_wraps_single_record() {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), "a.txt".into());
        metadata.insert("chunk_index".into(), 0.into());
        let record = IndexRecord {
            id: "a.txt#0".into(),
            embedding: vec![0.5, 0.25],
            document: "hello".into(),
            metadata,
        };

        let body = serde_json::to_value(UpsertRequest::from(&record)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "ids": ["a.txt#0"],
                "embeddings": [[0.5, 0.25]],
                "documents": ["hello"],
                "metadatas": [{ "chunk_index": 0, "source": "a.txt" }],
            })
        );
    }

    #[test]
    fn create_request_asks_for_get_or_create() {
        let metadata = crate::index::cosine_space();
        let body = serde_json::to_value(CreateCollection {
            name: "docs",
            metadata: &metadata,
            get_or_create: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "docs",
                "metadata": { "hnsw:space": "cosine" },
                "get_or_create": true,
            })
        );
    }

    #[test]
    fn ids_are_cached_and_forgotten() {
        let index = ChromaIndex::new(Client::new(), "http://localhost:8000/");
        assert_eq!(index.collections_url(), "http://localhost:8000/api/v1/collections");
        index.remember("docs", Some("uuid-1".into()));
        assert_eq!(index.cached_id("docs").as_deref(), Some("uuid-1"));
        index.remember("docs", None);
        assert!(index.cached_id("docs").is_none());
    }

    #[test]
    fn records_go_to_the_upsert_endpoint() {
        let index = ChromaIndex::new(Client::new(), "http://localhost:8000");
        assert_eq!(
            index.upsert_url("uuid-1"),
            "http://localhost:8000/api/v1/collections/uuid-1/upsert"
        );
    }
}
