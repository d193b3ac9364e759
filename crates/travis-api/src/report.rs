//! Batch report model shared by every stage.
//!
//! Resolution and dispatch both produce a [`Report`]: a `meta` block with
//! counts, the per-slug payloads of successful operations in `data`, and the
//! per-slug error messages of failed ones in `failures`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Counts for a batch report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Number of resources requested.
    pub total: usize,
    /// Number of resources that succeeded.
    pub success: usize,
    /// Number of resources that failed.
    pub failure: usize,
}

/// Per-slug outcome of a batch of remote operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    pub meta: ReportMeta,
    pub data: BTreeMap<String, T>,
    pub failures: BTreeMap<String, String>,
}

impl<T> Report<T> {
    /// Empty report for a batch of `total` resources.
    pub fn new(total: usize) -> Self {
        Self {
            meta: ReportMeta {
                total,
                success: 0,
                failure: 0,
            },
            data: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Record a successful resource.
    pub fn record_success(&mut self, slug: impl Into<String>, payload: T) {
        self.data.insert(slug.into(), payload);
        self.meta.success += 1;
    }

    /// Record a failed resource.
    pub fn record_failure(&mut self, slug: impl Into<String>, message: impl Into<String>) {
        self.failures.insert(slug.into(), message.into());
        self.meta.failure += 1;
    }

    /// Number of resources recorded so far.
    pub fn completed(&self) -> usize {
        self.meta.success + self.meta.failure
    }

    /// `success + failure == total`
    pub fn is_balanced(&self) -> bool {
        self.completed() == self.meta.total
    }
}

impl<T> Default for Report<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Repository information returned by `GET /repos/{slug}`.
///
/// Only `id` and `slug` are interpreted; every other field is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub id: u64,
    pub slug: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepoInfo {
    pub fn new(id: u64, slug: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            extra: Map::new(),
        }
    }
}

/// Outcome of resolving slugs to repository ids.
pub type ResolutionReport = Report<RepoInfo>;

/// Outcome of enabling builds; `data` holds the raw response payloads.
pub type DispatchReport = Report<Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_track_records() {
        let mut report: DispatchReport = Report::new(3);
        report.record_success("math-io/erf", json!({"result": true}));
        report.record_failure("math-io/erfc", "Forbidden");
        assert_eq!(report.completed(), 2);
        assert!(!report.is_balanced());

        report.record_success("math-io/erfinv", json!({"result": true}));
        assert!(report.is_balanced());
        assert_eq!(report.meta.success, 2);
        assert_eq!(report.meta.failure, 1);
    }

    #[test]
    fn test_serialized_shape() {
        let mut report: DispatchReport = Report::new(1);
        report.record_success("math-io/erf", json!({"result": true}));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "meta": {"total": 1, "success": 1, "failure": 0},
                "data": {"math-io/erf": {"result": true}},
                "failures": {}
            })
        );
    }

    #[test]
    fn test_repo_info_keeps_unknown_fields() {
        let info: RepoInfo = serde_json::from_value(json!({
            "id": 4436474,
            "slug": "math-io/erf",
            "active": false,
            "description": "Error function."
        }))
        .unwrap();

        assert_eq!(info.id, 4436474);
        assert_eq!(info.slug, "math-io/erf");
        assert_eq!(info.extra.get("active"), Some(&json!(false)));

        let back = serde_json::to_value(&info).unwrap();
        assert_eq!(back["description"], json!("Error function."));
    }
}
