//! Metrics for the brand normalizer
//!
//! Recording goes through the `metrics` facade; without an installed recorder
//! every call is a no-op. `init` installs the Prometheus recorder and keeps its
//! handle so the server can render `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::fmt;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Every metric name emitted by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    NormalizeRecordsRead,
    NormalizeRecordsEmitted,
    NormalizeRecordsRejected,
    NormalizeFieldsDefaulted,
    NormalizeBatchSize,
    ReplaceCommits,
    ReplaceDocumentsWritten,
    ReplaceFailures,
    RunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NormalizeRecordsRead => "brandnorm_normalize_records_read_total",
            MetricName::NormalizeRecordsEmitted => "brandnorm_normalize_records_emitted_total",
            MetricName::NormalizeRecordsRejected => "brandnorm_normalize_records_rejected_total",
            MetricName::NormalizeFieldsDefaulted => "brandnorm_normalize_fields_defaulted_total",
            MetricName::NormalizeBatchSize => "brandnorm_normalize_batch_size",
            MetricName::ReplaceCommits => "brandnorm_replace_commits_total",
            MetricName::ReplaceDocumentsWritten => "brandnorm_replace_documents_written_total",
            MetricName::ReplaceFailures => "brandnorm_replace_failures_total",
            MetricName::RunDuration => "brandnorm_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder. Calling it again is harmless.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format, if the recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

pub mod normalize {
    use super::MetricName;

    pub fn batch_processed(read: usize, emitted: usize, rejected: usize) {
        ::metrics::counter!(MetricName::NormalizeRecordsRead.as_str()).increment(read as u64);
        ::metrics::counter!(MetricName::NormalizeRecordsEmitted.as_str()).increment(emitted as u64);
        ::metrics::counter!(MetricName::NormalizeRecordsRejected.as_str())
            .increment(rejected as u64);
        ::metrics::histogram!(MetricName::NormalizeBatchSize.as_str()).record(read as f64);
    }

    /// A field fell back to its default or was left unresolved
    pub fn field_defaulted(field: &'static str, reason: &'static str) {
        ::metrics::counter!(
            MetricName::NormalizeFieldsDefaulted.as_str(),
            "field" => field,
            "reason" => reason
        )
        .increment(1);
    }
}

pub mod replace {
    use super::MetricName;
    use crate::error::ReplaceStage;

    pub fn committed(strategy: &'static str, written: usize) {
        ::metrics::counter!(MetricName::ReplaceCommits.as_str(), "strategy" => strategy)
            .increment(1);
        ::metrics::counter!(MetricName::ReplaceDocumentsWritten.as_str())
            .increment(written as u64);
    }

    pub fn failed(stage: ReplaceStage) {
        ::metrics::counter!(MetricName::ReplaceFailures.as_str(), "stage" => stage.as_str())
            .increment(1);
    }
}

pub fn run_duration(seconds: f64) {
    ::metrics::histogram!(MetricName::RunDuration.as_str()).record(seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_follow_prometheus_conventions() {
        let names = [
            MetricName::NormalizeRecordsRead,
            MetricName::NormalizeFieldsDefaulted,
            MetricName::ReplaceCommits,
            MetricName::ReplaceFailures,
        ];
        for name in names {
            assert!(name.as_str().starts_with("brandnorm_"));
            assert!(name.as_str().ends_with("_total"));
        }
        assert!(MetricName::RunDuration.to_string().ends_with("_seconds"));
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        normalize::batch_processed(3, 2, 1);
        normalize::field_defaulted("yearFounded", "range_violation");
        replace::committed("staged_swap", 2);
    }
}
