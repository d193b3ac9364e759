//! Bounded-concurrency dispatch of enable requests.
//!
//! Every id is sent to [`TravisApi::enable_hook`] from its own task in a
//! [`JoinSet`]. At most `concurrency` tasks are outstanding: the initial
//! window is filled up front and each joined task admits the next queued id.
//! Responses are folded into a [`DispatchReport`] keyed by slug, so arrival
//! order does not matter.
//!
//! A fatal response (server error or transport failure) ends the dispatch
//! immediately with an error. Requests still in flight are detached, not
//! cancelled; they observe the per-call abort signal and their responses are
//! dropped. A task that dies without a response ends the dispatch with
//! [`EnableError::Interrupted`].

use std::collections::btree_map;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use travis_api::{ApiResult, DispatchReport, TravisApi};

use crate::error::{EnableError, Result};
use crate::ids::IdMap;
use crate::options::DEFAULT_CONCURRENCY;

/// A finished request, handed back to the dispatch loop.
#[derive(Debug)]
struct Completion {
    id: u64,
    slug: String,
    result: ApiResult<Value>,
}

/// Issues enable requests for a batch of repository ids.
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn TravisApi>,
    concurrency: usize,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn TravisApi>) -> Self {
        Self {
            api,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the window width (clamped to at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Enable builds for every id in `ids`.
    ///
    /// Resolves exactly once: with the complete report after the last
    /// response, with [`EnableError::Dispatch`] on the first fatal one, or
    /// with [`EnableError::Interrupted`] if a request task dies.
    #[instrument(skip_all, fields(total = ids.len()))]
    pub async fn dispatch(&self, ids: &IdMap) -> Result<DispatchReport> {
        let total = ids.len();
        let mut report = DispatchReport::new(total);
        if total == 0 {
            debug!("No repositories to enable");
            return Ok(report);
        }

        let width = self.concurrency.min(total);
        debug!(width, "Beginning requests");

        // Fresh per call; never shared between dispatches.
        let (abort_tx, abort_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();
        let mut pending = ids.iter();

        for _ in 0..width {
            self.launch_next(&mut tasks, &mut pending, &abort_rx);
        }

        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            let completion = match joined {
                Ok(Some(completion)) => completion,
                // Only produced after an abort, which has already returned.
                Ok(None) => continue,
                Err(e) => {
                    warn!(completed, total, error = %e, "Request task ended without a response");
                    tasks.detach_all();
                    return Err(EnableError::Interrupted { completed, total });
                }
            };
            let Completion { id, slug, result } = completion;
            debug!(slug = %slug, id, "Response received");

            match result {
                Err(e) if e.is_fatal() => {
                    abort_tx.send_replace(true);
                    tasks.detach_all();
                    warn!(slug = %slug, id, error = %e, "Server error, aborting batch");
                    return Err(EnableError::Dispatch { slug, source: e });
                }
                Err(e) => {
                    debug!(slug = %slug, id, error = %e, "Failed to enable builds");
                    report.record_failure(slug, e.message());
                }
                Ok(payload) => {
                    debug!(slug = %slug, id, "Enabled builds");
                    report.record_success(slug, payload);
                }
            }

            completed += 1;
            debug!("Request {} of {} complete", completed, total);
            self.launch_next(&mut tasks, &mut pending, &abort_rx);
        }

        info!(
            success = report.meta.success,
            failure = report.meta.failure,
            "Finished all requests"
        );
        Ok(report)
    }

    /// Spawn the request for the next queued id, if any.
    fn launch_next(
        &self,
        tasks: &mut JoinSet<Option<Completion>>,
        pending: &mut btree_map::Iter<'_, u64, String>,
        abort: &watch::Receiver<bool>,
    ) {
        let Some((&id, slug)) = pending.next() else {
            return;
        };
        let api = Arc::clone(&self.api);
        let slug = slug.clone();
        let abort = abort.clone();

        tasks.spawn(async move {
            if is_aborted(&abort) {
                return None;
            }

            debug!(slug = %slug, id, "Sending enable request");
            let result = api.enable_hook(id).await;

            if is_aborted(&abort) {
                debug!(slug = %slug, id, "Discarding response after abort");
                return None;
            }
            Some(Completion { id, slug, result })
        });
    }
}

fn is_aborted(abort: &watch::Receiver<bool>) -> bool {
    *abort.borrow()
}
