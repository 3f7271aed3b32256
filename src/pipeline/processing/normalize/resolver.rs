//! Alias resolution over raw records.
//!
//! Candidates are dotted paths (`brand.name` addresses the `name` key of the
//! nested `brand` object). A JSON `null` counts as absent.

use serde_json::Value;

use crate::domain::RawRecord;

/// A value taken from one of a field's alias candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The candidate path that supplied the value
    pub path: &'static str,
    pub value: T,
}

/// Look up a dotted path, treating `null` the same as a missing key.
pub fn lookup<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// The first candidate that is present and non-null.
pub fn first_present<'a>(
    record: &'a RawRecord,
    candidates: &'static [&'static str],
) -> Option<Resolved<&'a Value>> {
    candidates.iter().find_map(|&path| {
        lookup(record, path).map(|value| Resolved { path, value })
    })
}

/// Walk candidates in priority order and return the first one the validator accepts.
///
/// The validator sees every present candidate, so it can record why a
/// candidate was passed over before the next one is tried.
pub fn first_valid<T, F>(
    record: &RawRecord,
    candidates: &'static [&'static str],
    mut accept: F,
) -> Option<Resolved<T>>
where
    F: FnMut(&'static str, &Value) -> Option<T>,
{
    for &path in candidates {
        if let Some(raw) = lookup(record, path) {
            if let Some(value) = accept(path, raw) {
                return Some(Resolved { path, value });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn lookup_follows_nested_paths() {
        let r = record(json!({ "brand": { "name": "Nested Co" } }));
        assert_eq!(lookup(&r, "brand.name"), Some(&json!("Nested Co")));
        assert_eq!(lookup(&r, "brand.missing"), None);
        assert_eq!(lookup(&r, "brand.name.deeper"), None);
    }

    #[test]
    fn lookup_treats_null_as_absent() {
        let r = record(json!({ "brandName": null, "brand": null }));
        assert_eq!(lookup(&r, "brandName"), None);
        assert_eq!(lookup(&r, "brand.name"), None);
    }

    #[test]
    fn first_present_respects_priority() {
        let r = record(json!({ "hqAddress": "Oslo", "headquarters": "Bergen" }));
        let resolved = first_present(&r, &["headquarters", "hqAddress"]).unwrap();
        assert_eq!(resolved.path, "headquarters");
        assert_eq!(resolved.value, &json!("Bergen"));
    }

    #[test]
    fn first_present_skips_null_candidates() {
        let r = record(json!({ "headquarters": null, "hqAddress": "Oslo" }));
        let resolved = first_present(&r, &["headquarters", "hqAddress"]).unwrap();
        assert_eq!(resolved.path, "hqAddress");
    }

    #[test]
    fn first_present_reports_absence() {
        let r = record(json!({ "unrelated": 1 }));
        assert!(first_present(&r, &["headquarters", "hqAddress"]).is_none());
    }

    #[test]
    fn first_valid_falls_through_rejected_candidates() {
        let r = record(json!({ "a": 5, "b": 50, "c": 7 }));
        let mut seen = Vec::new();
        let resolved = first_valid(&r, &["a", "b", "c"], |path, v| {
            seen.push(path);
            v.as_i64().filter(|n| *n > 10)
        })
        .unwrap();
        assert_eq!(resolved, Resolved { path: "b", value: 50 });
        assert_eq!(seen, vec!["a", "b"]);
    }
}
