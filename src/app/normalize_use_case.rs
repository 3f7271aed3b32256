use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::CanonicalBrand;
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::clock::{Clock, SystemClock};
use crate::pipeline::processing::normalize::{DefaultNormalizer, NormalizationReport, Normalizer};
use crate::pipeline::processing::replace::{CommitResult, DatasetReplacer};
use crate::storage::DocumentStore;

/// Summary of one normalization pass
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub read: usize,
    pub emitted: usize,
    pub rejected: usize,
    pub field_issues: usize,
    pub commit: CommitResult,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub report: RunReport,
    /// The records now making up the dataset
    pub brands: Vec<CanonicalBrand>,
}

/// Use case for normalizing the stored brand dataset in place
pub struct NormalizeUseCase {
    normalizer: Box<dyn Normalizer>,
    replacer: DatasetReplacer,
    store: Arc<dyn DocumentStore>,
    // One pass at a time per process: concurrent clear/insert sequences would interleave
    run_lock: Mutex<()>,
}

impl NormalizeUseCase {
    pub fn new(
        normalizer: Box<dyn Normalizer>,
        replacer: DatasetReplacer,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            normalizer,
            replacer,
            store,
            run_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            Box::new(DefaultNormalizer::new(clock, config.normalization_policy())),
            DatasetReplacer::new(config.replace.strategy),
            store,
        )
    }

    /// Normalize the current dataset without writing anything back
    pub async fn preview(&self) -> Result<NormalizationReport> {
        let raw = self.store.read_all().await?;
        let report = self.normalizer.normalize_with_report(&raw);
        log_issues(&report);
        Ok(report)
    }

    /// Read the dataset, normalize it, and replace it with the canonical records
    pub async fn run(&self) -> Result<RunOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!("normalize_run", run_id = %run_id);
        self.run_locked(run_id).instrument(span).await
    }

    async fn run_locked(&self, run_id: Uuid) -> Result<RunOutput> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();

        let raw = self.store.read_all().await?;
        info!(records = raw.len(), "Read raw dataset");

        let report = self.normalizer.normalize_with_report(&raw);
        log_issues(&report);
        metrics::normalize::batch_processed(report.read, report.brands.len(), report.rejected.len());
        if !report.rejected.is_empty() {
            warn!(
                rejected = report.rejected.len(),
                "Records left out: no usable brand name or headquarters"
            );
        }

        let commit = self
            .replacer
            .replace_dataset(self.store.as_ref(), &report.brands)
            .await?;
        metrics::replace::committed(commit.strategy.as_str(), commit.written);
        metrics::run_duration(started.elapsed().as_secs_f64());

        let run_report = RunReport {
            run_id,
            read: report.read,
            emitted: report.brands.len(),
            rejected: report.rejected.len(),
            field_issues: report.issues.len(),
            commit,
        };
        info!(
            read = run_report.read,
            emitted = run_report.emitted,
            rejected = run_report.rejected,
            field_issues = run_report.field_issues,
            "Normalization run committed"
        );

        Ok(RunOutput {
            report: run_report,
            brands: report.brands,
        })
    }
}

fn log_issues(report: &NormalizationReport) {
    for entry in &report.issues {
        metrics::normalize::field_defaulted(entry.issue.field.as_str(), entry.issue.reason());
        debug!(record = entry.record, reason = entry.issue.reason(), "{}", entry.issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::clock::FixedClock;
    use crate::storage::InMemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with_documents(vec![
            json!({ "brandName": "Acme", "yearFounded": "1850", "headquarters": "Boston", "numberOfLocations": "12" })
                .as_object().cloned().unwrap(),
            json!({ "brand": { "name": "Globex" }, "yearCreated": 1500, "yearsFounded": "1920", "hqAddress": "Cypress Creek", "numberOfLocations": "lots" })
                .as_object().cloned().unwrap(),
        ]))
    }

    fn use_case(store: Arc<InMemoryStore>) -> NormalizeUseCase {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        NormalizeUseCase::with_clock(&Config::default(), store, Arc::new(clock))
    }

    #[tokio::test]
    async fn run_replaces_dataset_with_canonical_records() {
        let store = store();
        let output = use_case(store.clone()).run().await.unwrap();

        assert_eq!(output.report.read, 2);
        assert_eq!(output.report.emitted, 2);
        assert_eq!(output.report.commit.replaced, 2);

        let docs = store.read_all().await.unwrap();
        assert_eq!(docs[0], json!({ "brandName": "Acme", "yearFounded": 1850, "headquarters": "Boston", "numberOfLocations": 12 }).as_object().cloned().unwrap());
        assert_eq!(docs[1], json!({ "brandName": "Globex", "yearFounded": 1920, "headquarters": "Cypress Creek", "numberOfLocations": 1 }).as_object().cloned().unwrap());
    }

    #[tokio::test]
    async fn preview_does_not_write() {
        let store = store();
        let before = store.read_all().await.unwrap();
        let report = use_case(store.clone()).preview().await.unwrap();
        assert_eq!(report.brands.len(), 2);
        assert_eq!(store.read_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let store = store();
        let uc = use_case(store.clone());
        let first = uc.run().await.unwrap();
        let second = uc.run().await.unwrap();
        assert_eq!(first.brands, second.brands);
        assert_eq!(second.report.field_issues, 0);
        assert_ne!(first.report.run_id, second.report.run_id);
    }
}
