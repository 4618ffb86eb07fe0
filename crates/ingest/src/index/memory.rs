use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{IndexError, IndexRecord, Metadata, VectorIndex};

#[derive(Debug, Default)]
struct Collection {
    metadata: Metadata,
    records: Vec<IndexRecord>,
    /// Position of each id in `records`.
    positions: HashMap<String, usize>,
}

impl Collection {
    fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    fn upsert(&mut self, record: &IndexRecord) {
        match self.positions.get(&record.id) {
            Some(&pos) => self.records[pos] = record.clone(),
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record.clone());
            }
        }
    }
}

/// Process-local index. Records keep insertion order; re-adding an id replaces it.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: Mutex<BTreeMap<String, Collection>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Collection>> {
        self.collections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records of a collection in insertion order.
    pub fn records(&self, collection: &str) -> Vec<IndexRecord> {
        self.lock()
            .get(collection)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }

    pub fn metadata(&self, collection: &str) -> Option<Metadata> {
        self.lock().get(collection).map(|c| c.metadata.clone())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn list_collections(&self) -> Result<BTreeSet<String>, IndexError> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), IndexError> {
        self.lock()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))
    }

    async fn get_or_create_collection(&self, name: &str, metadata: &Metadata) -> Result<(), IndexError> {
        self.lock()
            .entry(name.to_string())
            .or_insert_with(|| Collection::new(metadata.clone()));
        Ok(())
    }

    async fn add(&self, collection: &str, record: &IndexRecord) -> Result<(), IndexError> {
        let mut collections = self.lock();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| IndexError::CollectionNotFound(collection.to_string()))?;
        target.upsert(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_space;

    fn record(id: &str, text: &str) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            embedding: vec![1.0, 0.0],
            document: text.into(),
            metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn create_add_list_delete() {
        let index = MemoryIndex::new();
        index.get_or_create_collection("docs", &cosine_space()).await.unwrap();
        index.add("docs", &record("a#0", "first")).await.unwrap();
        index.add("docs", &record("a#1", "second")).await.unwrap();

        assert_eq!(index.list_collections().await.unwrap(), BTreeSet::from(["docs".to_string()]));
        assert_eq!(index.records("docs").len(), 2);
        assert_eq!(index.metadata("docs"), Some(cosine_space()));

        index.delete_collection("docs").await.unwrap();
        assert!(index.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_or_create_keeps_existing_records() {
        let index = MemoryIndex::new();
        index.get_or_create_collection("docs", &Metadata::new()).await.unwrap();
        index.add("docs", &record("a#0", "kept")).await.unwrap();
        index.get_or_create_collection("docs", &cosine_space()).await.unwrap();
        assert_eq!(index.records("docs").len(), 1);
        assert_eq!(index.metadata("docs"), Some(Metadata::new()));
    }

    #[tokio::test]
    async fn duplicate_id_replaces() {
        let index = MemoryIndex::new();
        index.get_or_create_collection("docs", &Metadata::new()).await.unwrap();
        index.add("docs", &record("a#0", "old")).await.unwrap();
        index.add("docs", &record("a#0", "new")).await.unwrap();
        let records = index.records("docs");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document, "new");
    }

    #[tokio::test]
    async fn replacing_keeps_insertion_order() {
        let index = MemoryIndex::new();
        index.get_or_create_collection("docs", &Metadata::new()).await.unwrap();
        for i in 0..1000 {
            index.add("docs", &record(&format!("a#{i}"), "v1")).await.unwrap();
        }
        index.add("docs", &record("a#500", "v2")).await.unwrap();
        index.add("docs", &record("b#0", "v1")).await.unwrap();

        let records = index.records("docs");
        assert_eq!(records.len(), 1001);
        assert_eq!(records[500].id, "a#500");
        assert_eq!(records[500].document, "v2");
        assert_eq!(records[1000].id, "b#0");
    }

    #[tokio::test]
    async fn recreated_collection_forgets_ids() {
        let index = MemoryIndex::new();
        index.get_or_create_collection("docs", &Metadata::new()).await.unwrap();
        index.add("docs", &record("a#0", "old")).await.unwrap();
        index.delete_collection("docs").await.unwrap();
        index.get_or_create_collection("docs", &Metadata::new()).await.unwrap();
        index.add("docs", &record("a#1", "new")).await.unwrap();
        let records = index.records("docs");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a#1");
    }

    #[tokio::test]
    async fn missing_collection_errors() {
        let index = MemoryIndex::new();
        assert!(matches!(
            index.add("nope", &record("x", "y")).await,
            Err(IndexError::CollectionNotFound(_))
        ));
        assert!(matches!(
            index.delete_collection("nope").await,
            Err(IndexError::CollectionNotFound(_))
        ));
    }
}
