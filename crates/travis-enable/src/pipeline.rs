//! Sync → resolve → dispatch pipeline.
//!
//! The pipeline walks an explicit [`Stage`] sequence:
//!
//! ```text
//! Start ─┬─> Syncing ─┬─> Resolving ─┬─> Dispatching ─> Done
//!        └────────────┘              └────────────────> Done (nothing resolved)
//! ```
//!
//! Any stage may fail instead; the error is returned as-is and no later
//! stage runs. Per-repository failures are not errors: they are carried in
//! the report's `failures` map.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use travis_api::{DispatchReport, ReportMeta, ResolutionReport, TravisApi};

use crate::dispatch::Dispatcher;
use crate::error::{EnableError, Result};
use crate::ids::{claim_ids, IdMap};

/// Final outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnableReport {
    /// No repository could be resolved; the resolution report, unchanged.
    Unresolved(ResolutionReport),
    /// Dispatch ran; its report merged with the resolution failures.
    Enabled(DispatchReport),
}

impl EnableReport {
    pub fn meta(&self) -> &ReportMeta {
        match self {
            EnableReport::Unresolved(r) => &r.meta,
            EnableReport::Enabled(r) => &r.meta,
        }
    }

    pub fn failures(&self) -> &BTreeMap<String, String> {
        match self {
            EnableReport::Unresolved(r) => &r.failures,
            EnableReport::Enabled(r) => &r.failures,
        }
    }

    /// `success + failure == total`
    pub fn is_balanced(&self) -> bool {
        match self {
            EnableReport::Unresolved(r) => r.is_balanced(),
            EnableReport::Enabled(r) => r.is_balanced(),
        }
    }

    /// Whether every requested repository had builds enabled.
    pub fn all_enabled(&self) -> bool {
        matches!(self, EnableReport::Enabled(r) if r.meta.failure == 0)
    }

    /// Payloads of successful enable requests, if dispatch ran.
    pub fn enabled(&self) -> Option<&DispatchReport> {
        match self {
            EnableReport::Enabled(r) => Some(r),
            EnableReport::Unresolved(_) => None,
        }
    }
}

/// What the pipeline keeps of the resolution stage for the final merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolutionCarry {
    total: usize,
    failure: usize,
    failures: BTreeMap<String, String>,
}

impl ResolutionCarry {
    fn from_report(report: ResolutionReport) -> Self {
        Self {
            total: report.meta.total,
            failure: report.meta.failure,
            failures: report.failures,
        }
    }

    /// Fold resolution failures into the dispatch report.
    ///
    /// A slug that failed resolution never reaches dispatch, so the two
    /// failure sets are disjoint and the counts simply add up.
    pub(crate) fn merge_into(self, mut report: DispatchReport) -> DispatchReport {
        report.meta.total = self.total;
        report.meta.failure += self.failure;
        report.failures.extend(self.failures);
        report
    }
}

#[derive(Debug)]
enum Stage {
    Start,
    Syncing,
    Resolving,
    Dispatching {
        ids: IdMap,
        resolution: ResolutionCarry,
    },
    Done(EnableReport),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Syncing => "syncing",
            Stage::Resolving => "resolving",
            Stage::Dispatching { .. } => "dispatching",
            Stage::Done(_) => "done",
        }
    }
}

/// Orchestrates sync, resolution and dispatch for one batch of slugs.
#[derive(Clone)]
pub struct Pipeline {
    api: Arc<dyn TravisApi>,
    dispatcher: Dispatcher,
    sync: bool,
}

impl Pipeline {
    pub fn new(api: Arc<dyn TravisApi>) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&api)),
            api,
            sync: false,
        }
    }

    /// Sync the account before resolving.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Width of the dispatch window.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.dispatcher = self.dispatcher.with_concurrency(concurrency);
        self
    }

    /// Run the pipeline for `slugs`.
    ///
    /// Each call owns its own state; running twice with the same inputs and
    /// the same remote behaviour yields the same report.
    #[instrument(skip_all, fields(repos = slugs.len(), sync = self.sync))]
    pub async fn run(&self, slugs: &[String]) -> Result<EnableReport> {
        let mut stage = Stage::Start;
        loop {
            debug!(stage = stage.name(), "Entering stage");
            stage = match stage {
                Stage::Start if self.sync => Stage::Syncing,
                Stage::Start => Stage::Resolving,
                Stage::Syncing => {
                    info!("Syncing...");
                    self.api
                        .sync_account()
                        .await
                        .map_err(|e| failed("syncing", EnableError::Sync(e)))?;
                    Stage::Resolving
                }
                Stage::Resolving => self.resolve(slugs).await?,
                Stage::Dispatching { ids, resolution } => {
                    info!(count = ids.len(), "Enabling builds...");
                    let report = self
                        .dispatcher
                        .dispatch(&ids)
                        .await
                        .map_err(|e| failed("dispatching", e))?;

                    if report.meta.failure > 0 {
                        warn!(repos = ?report.failures.keys().collect::<Vec<_>>(), "Failed to enable builds");
                    }
                    if report.meta.success > 0 {
                        info!(repos = ?report.data.keys().collect::<Vec<_>>(), "Successfully enabled builds");
                    }
                    Stage::Done(EnableReport::Enabled(resolution.merge_into(report)))
                }
                Stage::Done(report) => return Ok(report),
            };
        }
    }

    async fn resolve(&self, slugs: &[String]) -> Result<Stage> {
        info!("Fetching repository information...");
        let mut report = self
            .api
            .resolve_repos(slugs)
            .await
            .map_err(|e| failed("resolving", EnableError::Resolve(e)))?;
        let ids = claim_ids(&mut report);

        if report.meta.failure > 0 {
            warn!(
                repos = ?report.failures.keys().collect::<Vec<_>>(),
                "Failed to resolve repository information"
            );
        }
        if report.meta.success == 0 {
            warn!("Could not enable builds as unable to resolve repository information");
            return Ok(Stage::Done(EnableReport::Unresolved(report)));
        }
        debug!(
            repos = ?report.data.keys().collect::<Vec<_>>(),
            "Resolved repository information"
        );

        Ok(Stage::Dispatching {
            ids,
            resolution: ResolutionCarry::from_report(report),
        })
    }
}

fn failed(stage: &str, err: EnableError) -> EnableError {
    warn!(stage, error = %err, "Pipeline failed");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use travis_api::{RepoInfo, Report};

    #[test]
    fn test_merge_law() {
        let mut resolution: ResolutionReport = Report::new(4);
        resolution.record_success("math-io/erf", RepoInfo::new(1, "math-io/erf"));
        resolution.record_success("math-io/erfc", RepoInfo::new(2, "math-io/erfc"));
        resolution.record_failure("unknown/repo", "Not found");
        resolution.record_failure("no/permissions", "Forbidden");

        let mut dispatched: DispatchReport = Report::new(2);
        dispatched.record_success("math-io/erf", json!({"result": true}));
        dispatched.record_success("math-io/erfc", json!({"result": true}));

        let merged = ResolutionCarry::from_report(resolution).merge_into(dispatched);

        assert_eq!(
            serde_json::to_value(&merged).unwrap(),
            json!({
                "meta": {"total": 4, "success": 2, "failure": 2},
                "data": {
                    "math-io/erf": {"result": true},
                    "math-io/erfc": {"result": true}
                },
                "failures": {
                    "unknown/repo": "Not found",
                    "no/permissions": "Forbidden"
                }
            })
        );
        assert!(merged.is_balanced());
    }

    #[test]
    fn test_merge_keeps_dispatch_failures() {
        let mut resolution: ResolutionReport = Report::new(2);
        resolution.record_success("math-io/erf", RepoInfo::new(1, "math-io/erf"));
        resolution.record_success("math-io/erfc", RepoInfo::new(2, "math-io/erfc"));

        let mut dispatched: DispatchReport = Report::new(2);
        dispatched.record_failure("math-io/erf", "Forbidden");
        dispatched.record_failure("math-io/erfc", "Forbidden");

        let merged = ResolutionCarry::from_report(resolution).merge_into(dispatched);
        assert_eq!(merged.meta.total, 2);
        assert_eq!(merged.meta.success, 0);
        assert_eq!(merged.meta.failure, 2);
        assert_eq!(merged.failures.len(), 2);
    }

    #[test]
    fn test_enable_report_accessors() {
        let unresolved = EnableReport::Unresolved(Report::new(0));
        assert!(unresolved.enabled().is_none());
        assert!(!unresolved.all_enabled());
        assert!(unresolved.is_balanced());

        let mut dispatched: DispatchReport = Report::new(1);
        dispatched.record_success("math-io/erf", json!({"result": true}));
        let enabled = EnableReport::Enabled(dispatched);
        assert!(enabled.all_enabled());
        assert_eq!(enabled.meta().success, 1);
        assert!(enabled.failures().is_empty());
    }
}
