//! In-memory fake of the Travis API (testing only)
//!
//! `FakeTravisApi` satisfies the [`TravisApi`] contract without any network
//! access. Outcomes are scripted up front; call counts and the peak number of
//! simultaneously outstanding hook requests are recorded for assertions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{ApiResult, TravisApi};
use crate::error::ApiError;
use crate::report::{RepoInfo, ResolutionReport};

#[derive(Debug, Clone)]
struct HookScript {
    result: ApiResult<Value>,
    latency: Option<Duration>,
}

/// Scripted Travis API.
///
/// Defaults: sync succeeds, slugs resolve against the repository table
/// registered with [`with_repo`](Self::with_repo) (unknown slugs fail with
/// `Not Found`), and every hook succeeds with `{"result": true}`.
#[derive(Debug, Default)]
pub struct FakeTravisApi {
    sync_error: Option<ApiError>,
    resolution: Option<ApiResult<ResolutionReport>>,
    repos: BTreeMap<String, u64>,
    hooks: HashMap<u64, HookScript>,
    hook_latency: Duration,

    sync_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    hook_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    hooked_ids: Mutex<Vec<u64>>,
}

impl FakeTravisApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `sync_account` fail.
    pub fn with_sync_error(mut self, error: ApiError) -> Self {
        self.sync_error = Some(error);
        self
    }

    /// Register a repository that resolves to `id`.
    pub fn with_repo(mut self, slug: &str, id: u64) -> Self {
        self.repos.insert(slug.to_string(), id);
        self
    }

    /// Return this report from `resolve_repos` regardless of the slugs.
    pub fn with_resolution(mut self, report: ResolutionReport) -> Self {
        self.resolution = Some(Ok(report));
        self
    }

    /// Make `resolve_repos` fail as a whole.
    pub fn with_resolve_error(mut self, error: ApiError) -> Self {
        self.resolution = Some(Err(error));
        self
    }

    /// Script the outcome of `enable_hook(id)`.
    pub fn with_hook(mut self, id: u64, result: ApiResult<Value>) -> Self {
        let latency = self.hooks.get(&id).and_then(|h| h.latency);
        self.hooks.insert(id, HookScript { result, latency });
        self
    }

    /// Delay the response of `enable_hook(id)`.
    pub fn with_hook_latency(mut self, id: u64, latency: Duration) -> Self {
        self.hooks
            .entry(id)
            .or_insert_with(|| HookScript {
                result: Ok(enabled_payload()),
                latency: None,
            })
            .latency = Some(latency);
        self
    }

    /// Delay every hook response that has no latency of its own.
    pub fn with_default_hook_latency(mut self, latency: Duration) -> Self {
        self.hook_latency = latency;
        self
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn hook_calls(&self) -> usize {
        self.hook_calls.load(Ordering::SeqCst)
    }

    /// Peak number of `enable_hook` calls outstanding at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Ids passed to `enable_hook`, in call order.
    pub fn hooked_ids(&self) -> Vec<u64> {
        self.hooked_ids.lock().unwrap().clone()
    }

    fn resolve_from_table(&self, slugs: &[String]) -> ResolutionReport {
        let mut report = ResolutionReport::new(slugs.len());
        for slug in slugs {
            match self.repos.get(slug) {
                Some(id) => report.record_success(slug.clone(), RepoInfo::new(*id, slug.clone())),
                None => report.record_failure(slug.clone(), "Not Found"),
            }
        }
        report
    }
}

/// Payload Travis returns when a hook was activated.
pub fn enabled_payload() -> Value {
    json!({ "result": true })
}

#[async_trait]
impl TravisApi for FakeTravisApi {
    async fn sync_account(&self) -> ApiResult<()> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        match &self.sync_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn resolve_repos(&self, slugs: &[String]) -> ApiResult<ResolutionReport> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match &self.resolution {
            Some(scripted) => scripted.clone(),
            None => Ok(self.resolve_from_table(slugs)),
        }
    }

    async fn enable_hook(&self, id: u64) -> ApiResult<Value> {
        self.hook_calls.fetch_add(1, Ordering::SeqCst);
        self.hooked_ids.lock().unwrap().push(id);

        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        let script = self.hooks.get(&id);
        let latency = script
            .and_then(|s| s.latency)
            .unwrap_or(self.hook_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match script {
            Some(s) => s.result.clone(),
            None => Ok(enabled_payload()),
        }
    }
}
