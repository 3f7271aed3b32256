use crate::domain::Document;
use crate::error::StoreResult;
use async_trait::async_trait;

pub mod in_memory;
pub mod json_file;

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;

/// Document store holding the brand dataset.
///
/// The store is both the source of raw records and the sink for canonical
/// ones. `clear` + `insert_many` support the destructive replace; `stage`
/// supports the atomic one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document currently in the dataset
    async fn read_all(&self) -> StoreResult<Vec<Document>>;

    async fn count(&self) -> StoreResult<usize>;

    /// Remove every document, returning how many were removed
    async fn clear(&self) -> StoreResult<usize>;

    /// Append documents, returning how many were written
    async fn insert_many(&self, documents: Vec<Document>) -> StoreResult<usize>;

    /// Write a complete replacement set to staging without touching the live dataset.
    async fn stage(&self, documents: Vec<Document>) -> StoreResult<Box<dyn StagedDataset>>;
}

/// A fully written replacement set waiting to be swapped in.
///
/// Dropping the handle without calling `swap_in` discards the staged set, so
/// staging never outlives a failed or cancelled run.
#[async_trait]
pub trait StagedDataset: Send {
    /// Number of documents staged
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the staged set the live dataset in one step, returning how many
    /// documents it replaced.
    async fn swap_in(self: Box<Self>) -> StoreResult<usize>;
}

/// Open the store named by the configuration.
pub fn open(config: &crate::config::StoreConfig) -> std::sync::Arc<dyn DocumentStore> {
    use crate::config::StoreBackend;
    match config.backend {
        StoreBackend::Memory => std::sync::Arc::new(InMemoryStore::new()),
        StoreBackend::JsonFile => std::sync::Arc::new(JsonFileStore::new(&config.path)),
    }
}
