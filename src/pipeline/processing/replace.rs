use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::domain::{CanonicalBrand, Document};
use crate::error::{DatasetReplaceError, ReplaceStage};
use crate::storage::DocumentStore;

/// How a run's output becomes the live dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStrategy {
    /// Write the new set to staging, then swap it in as one action
    #[default]
    StagedSwap,
    /// Clear the dataset, then insert the new set. A failed insert can leave
    /// the dataset empty or partial.
    ClearThenInsert,
}

impl ReplaceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceStrategy::StagedSwap => "staged_swap",
            ReplaceStrategy::ClearThenInsert => "clear_then_insert",
        }
    }
}

/// Outcome of a successful dataset replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    pub strategy: ReplaceStrategy,
    /// Documents now in the dataset
    pub written: usize,
    /// Documents the replace discarded
    pub replaced: usize,
    pub committed_at: DateTime<Utc>,
}

/// Commits a run's canonical records as the whole dataset. No merge, no upsert:
/// whatever was there before is gone once this succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetReplacer {
    strategy: ReplaceStrategy,
}

impl DatasetReplacer {
    pub fn new(strategy: ReplaceStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ReplaceStrategy {
        self.strategy
    }

    #[instrument(skip_all, fields(strategy = self.strategy.as_str(), records = records.len()))]
    pub async fn replace_dataset(
        &self,
        store: &dyn DocumentStore,
        records: &[CanonicalBrand],
    ) -> Result<CommitResult, DatasetReplaceError> {
        let documents: Vec<Document> = records.iter().map(CanonicalBrand::to_document).collect();
        let written = documents.len();

        let replaced = match self.strategy {
            ReplaceStrategy::StagedSwap => staged_swap(store, documents).await?,
            ReplaceStrategy::ClearThenInsert => clear_then_insert(store, documents).await?,
        };

        info!(written, replaced, "Dataset replaced");
        Ok(CommitResult {
            strategy: self.strategy,
            written,
            replaced,
            committed_at: Utc::now(),
        })
    }
}

async fn staged_swap(
    store: &dyn DocumentStore,
    documents: Vec<Document>,
) -> Result<usize, DatasetReplaceError> {
    let staged = store
        .stage(documents)
        .await
        .map_err(|e| fail(ReplaceStage::Stage, e))?;
    // The staged handle is consumed by swap_in; on any early exit it is dropped and discarded
    staged
        .swap_in()
        .await
        .map_err(|e| fail(ReplaceStage::Swap, e))
}

async fn clear_then_insert(
    store: &dyn DocumentStore,
    documents: Vec<Document>,
) -> Result<usize, DatasetReplaceError> {
    let removed = store
        .clear()
        .await
        .map_err(|e| fail(ReplaceStage::Clear, e))?;
    store
        .insert_many(documents)
        .await
        .map_err(|e| fail(ReplaceStage::Insert, e))?;
    Ok(removed)
}

fn fail(stage: ReplaceStage, source: crate::error::StoreError) -> DatasetReplaceError {
    let err = DatasetReplaceError::new(stage, source);
    if stage.leaves_dataset_inconsistent() {
        error!(stage = %stage, "Dataset replace failed; dataset may be empty or partial: {}", err);
    } else {
        error!(stage = %stage, "Dataset replace failed; prior dataset kept: {}", err);
    }
    crate::observability::metrics::replace::failed(stage);
    err
}
