use anyhow::Result;
use async_trait::async_trait;
use brand_normalizer::app::NormalizeUseCase;
use brand_normalizer::config::Config;
use brand_normalizer::error::{BrandError, ReplaceStage, StoreError, StoreResult};
use brand_normalizer::pipeline::clock::FixedClock;
use brand_normalizer::pipeline::processing::replace::{DatasetReplacer, ReplaceStrategy};
use brand_normalizer::storage::{DocumentStore, InMemoryStore, JsonFileStore, StagedDataset};
use brand_normalizer::{CanonicalBrand, Document};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::tempdir;

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()))
}

fn raw_dataset() -> Vec<Document> {
    vec![
        doc(json!({
            "_id": "65a1", "__v": 0,
            "brandName": "Northwind", "yearFounded": "1850", "yearCreated": 1700,
            "headquarters": "Seattle, USA", "numberOfLocations": 42,
            "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-02-01T00:00:00Z"
        })),
        doc(json!({
            "brand": { "name": "Contoso" }, "yearFounded": 1500, "yearCreated": "1900",
            "hqAddress": "Redmond, USA", "numberOfLocations": "not-a-number"
        })),
        doc(json!({
            "brandName": "Fabrikam", "yearsFounded": "2099",
            "headquarters": "Berlin, Germany", "numberOfLocations": "seven"
        })),
    ]
}

#[tokio::test]
async fn normalize_run_over_json_file_store() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("brands.json");
    let store = Arc::new(JsonFileStore::new(&path));
    store.insert_many(raw_dataset()).await?;

    let use_case = NormalizeUseCase::with_clock(&Config::default(), store.clone(), clock());
    let output = use_case.run().await?;

    assert_eq!(output.report.read, 3);
    assert_eq!(output.report.emitted, 3);
    assert_eq!(output.report.commit.strategy, ReplaceStrategy::StagedSwap);

    let stored = store.read_all().await?;
    assert_eq!(
        stored,
        vec![
            doc(json!({
                "brandName": "Northwind", "yearFounded": 1850, "headquarters": "Seattle, USA",
                "numberOfLocations": 42,
                "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-02-01T00:00:00Z"
            })),
            doc(json!({
                "brandName": "Contoso", "yearFounded": 1900, "headquarters": "Redmond, USA",
                "numberOfLocations": 1
            })),
            doc(json!({
                "brandName": "Fabrikam", "yearFounded": 1600, "headquarters": "Berlin, Germany",
                "numberOfLocations": 1
            })),
        ]
    );

    // Only the dataset file remains; staging was renamed into place
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[tokio::test]
async fn replace_then_read_yields_exactly_the_new_records() -> Result<()> {
    for strategy in [ReplaceStrategy::StagedSwap, ReplaceStrategy::ClearThenInsert] {
        let store = InMemoryStore::with_documents(raw_dataset());
        let records: Vec<CanonicalBrand> = vec![serde_json::from_value(json!({
            "brandName": "Only", "yearFounded": 2000, "headquarters": "Here", "numberOfLocations": 2
        }))?];

        let commit = DatasetReplacer::new(strategy)
            .replace_dataset(&store, &records)
            .await?;
        assert_eq!(commit.written, 1);
        assert_eq!(commit.replaced, 3);
        assert_eq!(store.read_all().await?, vec![records[0].to_document()]);
    }
    Ok(())
}

/// Wraps an in-memory store and fails one replace step on purpose.
struct FlakyStore {
    inner: InMemoryStore,
    fail_at: ReplaceStage,
}

fn injected() -> StoreError {
    StoreError::Unavailable {
        message: "injected failure".to_string(),
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn read_all(&self) -> StoreResult<Vec<Document>> {
        self.inner.read_all().await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.inner.count().await
    }

    async fn clear(&self) -> StoreResult<usize> {
        if self.fail_at == ReplaceStage::Clear {
            return Err(injected());
        }
        self.inner.clear().await
    }

    async fn insert_many(&self, mut documents: Vec<Document>) -> StoreResult<usize> {
        if self.fail_at == ReplaceStage::Insert {
            // Write half, then fail: the partial state clear-then-insert can leave behind
            documents.truncate(documents.len() / 2);
            self.inner.insert_many(documents).await?;
            return Err(injected());
        }
        self.inner.insert_many(documents).await
    }

    async fn stage(&self, documents: Vec<Document>) -> StoreResult<Box<dyn StagedDataset>> {
        if self.fail_at == ReplaceStage::Stage {
            return Err(injected());
        }
        let staged = self.inner.stage(documents).await?;
        if self.fail_at == ReplaceStage::Swap {
            return Ok(Box::new(FailingSwap { staged }));
        }
        Ok(staged)
    }
}

struct FailingSwap {
    staged: Box<dyn StagedDataset>,
}

#[async_trait]
impl StagedDataset for FailingSwap {
    fn len(&self) -> usize {
        self.staged.len()
    }

    async fn swap_in(self: Box<Self>) -> StoreResult<usize> {
        Err(injected())
    }
}

async fn run_with_failure(
    strategy: ReplaceStrategy,
    fail_at: ReplaceStage,
) -> (BrandError, Vec<Document>) {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::with_documents(raw_dataset()),
        fail_at,
    });
    let mut config = Config::default();
    config.replace.strategy = strategy;
    let use_case = NormalizeUseCase::with_clock(&config, store.clone(), clock());

    let err = use_case.run().await.unwrap_err();
    let remaining = store.read_all().await.unwrap();
    (err, remaining)
}

fn failed_stage(err: &BrandError) -> Option<ReplaceStage> {
    match err {
        BrandError::Replace(replace) => Some(replace.stage),
        _ => None,
    }
}

#[tokio::test]
async fn staged_failures_report_stage_and_keep_prior_dataset() {
    for stage in [ReplaceStage::Stage, ReplaceStage::Swap] {
        let (err, remaining) = run_with_failure(ReplaceStrategy::StagedSwap, stage).await;
        assert_eq!(failed_stage(&err), Some(stage));
        assert_eq!(remaining, raw_dataset());
    }
}

#[tokio::test]
async fn clear_failure_is_reported_as_clear_stage() {
    let (err, remaining) =
        run_with_failure(ReplaceStrategy::ClearThenInsert, ReplaceStage::Clear).await;
    assert_eq!(failed_stage(&err), Some(ReplaceStage::Clear));
    assert_eq!(remaining, raw_dataset());
}

#[tokio::test]
async fn insert_failure_is_reported_and_can_leave_partial_dataset() {
    let (err, remaining) =
        run_with_failure(ReplaceStrategy::ClearThenInsert, ReplaceStage::Insert).await;
    assert_eq!(failed_stage(&err), Some(ReplaceStage::Insert));
    assert!(err.to_string().contains("insert stage"));
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn concurrent_runs_do_not_interleave() -> Result<()> {
    let store = Arc::new(InMemoryStore::with_documents(raw_dataset()));
    let mut config = Config::default();
    config.replace.strategy = ReplaceStrategy::ClearThenInsert;
    let use_case = Arc::new(NormalizeUseCase::with_clock(&config, store.clone(), clock()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let uc = use_case.clone();
            tokio::spawn(async move { uc.run().await })
        })
        .collect();
    for handle in handles {
        handle.await??;
    }

    assert_eq!(store.count().await?, 3);
    Ok(())
}
