use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::constants::{
    BRAND_NAME, BRAND_NAME_ALIASES, DEFAULT_NUMBER_OF_LOCATIONS, DEFAULT_SENTINEL,
    DEFAULT_YEAR_FOUNDED, HEADQUARTERS, HEADQUARTERS_ALIASES, MIN_YEAR_FOUNDED,
    NUMBER_OF_LOCATIONS, NUMBER_OF_LOCATIONS_ALIASES, YEAR_FOUNDED, YEAR_FOUNDED_ALIASES,
};
use crate::domain::{CanonicalBrand, RawRecord, RecordMetadata};
use crate::pipeline::clock::{Clock, SystemClock};

pub mod coerce;
pub mod resolver;

use coerce::{coerce_int, coerce_text, Bounds, ValueKind};

/// The four fields of the canonical brand schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    BrandName,
    YearFounded,
    Headquarters,
    NumberOfLocations,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::BrandName,
        CanonicalField::YearFounded,
        CanonicalField::Headquarters,
        CanonicalField::NumberOfLocations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::BrandName => BRAND_NAME,
            CanonicalField::YearFounded => YEAR_FOUNDED,
            CanonicalField::Headquarters => HEADQUARTERS,
            CanonicalField::NumberOfLocations => NUMBER_OF_LOCATIONS,
        }
    }

    /// Source paths that may carry this field, highest priority first
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::BrandName => BRAND_NAME_ALIASES,
            CanonicalField::YearFounded => YEAR_FOUNDED_ALIASES,
            CanonicalField::Headquarters => HEADQUARTERS_ALIASES,
            CanonicalField::NumberOfLocations => NUMBER_OF_LOCATIONS_ALIASES,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when no alias yields usable text for `brandName` or `headquarters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedTextPolicy {
    /// Fill the field with the configured sentinel text
    #[default]
    Sentinel,
    /// Leave the record out of the output
    Reject,
}

impl UnresolvedTextPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedTextPolicy::Sentinel => "sentinel",
            UnresolvedTextPolicy::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationPolicy {
    pub unresolved_text: UnresolvedTextPolicy,
    pub sentinel: String,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            unresolved_text: UnresolvedTextPolicy::Sentinel,
            sentinel: DEFAULT_SENTINEL.to_string(),
        }
    }
}

/// Why a field fell back to its default (or why a record was rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldIssueKind {
    /// A candidate could not be converted to the field's type
    ConversionFailure { found: ValueKind },
    /// A candidate converted but lies outside the valid range
    RangeViolation { value: i64, bounds: Bounds },
    /// No candidate was present; the numeric default applies
    Missing,
    /// No candidate yielded usable text
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: CanonicalField,
    /// The alias that produced the issue, when one was present
    pub path: Option<&'static str>,
    pub kind: FieldIssueKind,
}

impl FieldIssue {
    /// Short label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self.kind {
            FieldIssueKind::ConversionFailure { .. } => "conversion_failure",
            FieldIssueKind::RangeViolation { .. } => "range_violation",
            FieldIssueKind::Missing => "missing",
            FieldIssueKind::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.path.unwrap_or("<none>");
        match self.kind {
            FieldIssueKind::ConversionFailure { found } => write!(
                f,
                "{}: candidate {} holds {} that is not an integer",
                self.field, source, found
            ),
            FieldIssueKind::RangeViolation { value, bounds } => write!(
                f,
                "{}: candidate {} = {} outside {}",
                self.field, source, value, bounds
            ),
            FieldIssueKind::Missing => write!(f, "{}: no candidate present", self.field),
            FieldIssueKind::Unresolved => write!(f, "{}: no usable text", self.field),
        }
    }
}

/// Result of normalizing one raw record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Accepted {
        brand: CanonicalBrand,
        issues: Vec<FieldIssue>,
    },
    Rejected {
        issues: Vec<FieldIssue>,
    },
}

impl RecordOutcome {
    pub fn brand(&self) -> Option<&CanonicalBrand> {
        match self {
            RecordOutcome::Accepted { brand, .. } => Some(brand),
            RecordOutcome::Rejected { .. } => None,
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            RecordOutcome::Accepted { issues, .. } | RecordOutcome::Rejected { issues } => issues,
        }
    }
}

/// A field issue tagged with the position of its record in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    pub record: usize,
    pub issue: FieldIssue,
}

/// Everything a normalization pass produced
#[derive(Debug, Clone, Default)]
pub struct NormalizationReport {
    pub read: usize,
    pub brands: Vec<CanonicalBrand>,
    /// Input positions of records left out under the reject policy
    pub rejected: Vec<usize>,
    pub issues: Vec<RecordIssue>,
}

/// Turns raw records into canonical brands. Implementations never fail:
/// malformed fields fall back to defaults.
pub trait Normalizer: Send + Sync {
    fn normalize_with_report(&self, records: &[RawRecord]) -> NormalizationReport;

    fn normalize(&self, records: &[RawRecord]) -> Vec<CanonicalBrand> {
        self.normalize_with_report(records).brands
    }
}

/// Alias-aware normalizer for the brand schema
pub struct DefaultNormalizer {
    clock: Arc<dyn Clock>,
    policy: NormalizationPolicy,
}

impl DefaultNormalizer {
    pub fn new(clock: Arc<dyn Clock>, policy: NormalizationPolicy) -> Self {
        Self { clock, policy }
    }

    pub fn with_system_clock(policy: NormalizationPolicy) -> Self {
        Self::new(Arc::new(SystemClock), policy)
    }

    pub fn policy(&self) -> &NormalizationPolicy {
        &self.policy
    }

    /// Valid founding years as of now: [1600, current year]
    pub fn year_bounds(&self) -> Bounds {
        Bounds::new(MIN_YEAR_FOUNDED, i64::from(self.clock.current_year()))
    }

    pub fn normalize_record(&self, record: &RawRecord) -> RecordOutcome {
        self.normalize_within(record, self.year_bounds())
    }

    fn normalize_within(&self, record: &RawRecord, years: Bounds) -> RecordOutcome {
        let mut issues = Vec::new();

        let year_founded = resolve_int(record, CanonicalField::YearFounded, years, &mut issues)
            .and_then(|year| i32::try_from(year).ok())
            .unwrap_or(DEFAULT_YEAR_FOUNDED);

        let number_of_locations = resolve_int(
            record,
            CanonicalField::NumberOfLocations,
            Bounds::at_least(DEFAULT_NUMBER_OF_LOCATIONS),
            &mut issues,
        )
        .unwrap_or(DEFAULT_NUMBER_OF_LOCATIONS);

        let brand_name = self.resolve_text(record, CanonicalField::BrandName, &mut issues);
        let headquarters = self.resolve_text(record, CanonicalField::Headquarters, &mut issues);

        match (brand_name, headquarters) {
            (Some(brand_name), Some(headquarters)) => RecordOutcome::Accepted {
                brand: CanonicalBrand {
                    brand_name,
                    year_founded,
                    headquarters,
                    number_of_locations,
                    metadata: RecordMetadata::from_raw(record),
                },
                issues,
            },
            _ => RecordOutcome::Rejected { issues },
        }
    }

    fn resolve_text(
        &self,
        record: &RawRecord,
        field: CanonicalField,
        issues: &mut Vec<FieldIssue>,
    ) -> Option<String> {
        if let Some(resolved) =
            resolver::first_valid(record, field.candidates(), |_, value| coerce_text(value))
        {
            return Some(resolved.value);
        }

        let path = resolver::first_present(record, field.candidates()).map(|r| r.path);
        issues.push(FieldIssue {
            field,
            path,
            kind: FieldIssueKind::Unresolved,
        });

        match self.policy.unresolved_text {
            UnresolvedTextPolicy::Sentinel => Some(self.policy.sentinel.clone()),
            UnresolvedTextPolicy::Reject => None,
        }
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize_with_report(&self, records: &[RawRecord]) -> NormalizationReport {
        // One bound for the whole pass so a run straddling New Year stays consistent
        let years = self.year_bounds();
        let mut report = NormalizationReport {
            read: records.len(),
            brands: Vec::with_capacity(records.len()),
            ..Default::default()
        };

        for (index, record) in records.iter().enumerate() {
            let (brand, issues) = match self.normalize_within(record, years) {
                RecordOutcome::Accepted { brand, issues } => (Some(brand), issues),
                RecordOutcome::Rejected { issues } => (None, issues),
            };
            match brand {
                Some(brand) => report.brands.push(brand),
                None => report.rejected.push(index),
            }
            report.issues.extend(
                issues
                    .into_iter()
                    .map(|issue| RecordIssue { record: index, issue }),
            );
        }

        report
    }
}

/// Take the first alias that both converts to an integer and lies within `bounds`.
/// A candidate that converts but is out of range is passed over like one that
/// does not convert.
fn resolve_int(
    record: &RawRecord,
    field: CanonicalField,
    bounds: Bounds,
    issues: &mut Vec<FieldIssue>,
) -> Option<i64> {
    let mut any_present = false;
    let resolved = resolver::first_valid(record, field.candidates(), |path, raw| {
        any_present = true;
        match coerce_int(raw) {
            Ok(value) if bounds.contains(value) => Some(value),
            Ok(value) => {
                issues.push(FieldIssue {
                    field,
                    path: Some(path),
                    kind: FieldIssueKind::RangeViolation { value, bounds },
                });
                None
            }
            Err(failure) => {
                issues.push(FieldIssue {
                    field,
                    path: Some(path),
                    kind: FieldIssueKind::ConversionFailure {
                        found: failure.found,
                    },
                });
                None
            }
        }
    });

    if resolved.is_none() && !any_present {
        issues.push(FieldIssue {
            field,
            path: None,
            kind: FieldIssueKind::Missing,
        });
    }
    resolved.map(|r| r.value)
}
