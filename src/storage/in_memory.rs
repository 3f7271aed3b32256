use super::{DocumentStore, StagedDataset};
use crate::domain::Document;
use crate::error::StoreResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory document store for development/testing
#[derive(Clone)]
pub struct InMemoryStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_documents(Vec::new())
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn read_all(&self) -> StoreResult<Vec<Document>> {
        Ok(self.documents.read().await.clone())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.documents.read().await.len())
    }

    async fn clear(&self) -> StoreResult<usize> {
        let mut documents = self.documents.write().await;
        let removed = documents.len();
        documents.clear();
        debug!("Cleared {} documents", removed);
        Ok(removed)
    }

    async fn insert_many(&self, documents: Vec<Document>) -> StoreResult<usize> {
        let inserted = documents.len();
        self.documents.write().await.extend(documents);
        debug!("Inserted {} documents", inserted);
        Ok(inserted)
    }

    async fn stage(&self, documents: Vec<Document>) -> StoreResult<Box<dyn StagedDataset>> {
        debug!("Staged {} documents", documents.len());
        Ok(Box::new(InMemoryStaged {
            target: Arc::clone(&self.documents),
            documents,
        }))
    }
}

struct InMemoryStaged {
    target: Arc<RwLock<Vec<Document>>>,
    documents: Vec<Document>,
}

#[async_trait]
impl StagedDataset for InMemoryStaged {
    fn len(&self) -> usize {
        self.documents.len()
    }

    async fn swap_in(self: Box<Self>) -> StoreResult<usize> {
        let staged = *self;
        let mut live = staged.target.write().await;
        let previous = std::mem::replace(&mut *live, staged.documents);
        debug!("Swapped in {} documents, replacing {}", live.len(), previous.len());
        Ok(previous.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str) -> Document {
        json!({ "brandName": name }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn staged_set_is_invisible_until_swapped() {
        let store = InMemoryStore::with_documents(vec![doc("old")]);
        let staged = store.stage(vec![doc("a"), doc("b")]).await.unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(store.read_all().await.unwrap(), vec![doc("old")]);

        let replaced = staged.swap_in().await.unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(store.read_all().await.unwrap(), vec![doc("a"), doc("b")]);
    }

    #[tokio::test]
    async fn dropping_staged_set_leaves_dataset_untouched() {
        let store = InMemoryStore::with_documents(vec![doc("old")]);
        drop(store.stage(vec![doc("new")]).await.unwrap());
        assert_eq!(store.read_all().await.unwrap(), vec![doc("old")]);
    }

    #[tokio::test]
    async fn clear_then_insert() {
        let store = InMemoryStore::with_documents(vec![doc("x"), doc("y")]);
        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.insert_many(vec![doc("z")]).await.unwrap(), 1);
        assert_eq!(store.read_all().await.unwrap(), vec![doc("z")]);
    }
}
