//! Validated entry point: options in, pipeline out.

use std::sync::Arc;

use tracing::debug;
use travis_api::{TravisApi, TravisClient};

use crate::error::Result;
use crate::options::{normalize_slugs, EnableOptions};
use crate::pipeline::{EnableReport, Pipeline};

/// Enables builds for batches of repositories with a fixed set of options.
///
/// Options are validated when the enabler is built, slugs when
/// [`enable`](Self::enable) is called; both fail before any request is sent.
#[derive(Clone)]
pub struct Enabler {
    options: EnableOptions,
    pipeline: Pipeline,
}

impl Enabler {
    /// Build an enabler talking to the Travis API over HTTPS.
    pub fn new(options: EnableOptions) -> Result<Self> {
        options.validate()?;
        let client = TravisClient::new(options.client_config())?;
        Self::with_api(options, Arc::new(client))
    }

    /// Build an enabler over any [`TravisApi`] implementation.
    pub fn with_api(options: EnableOptions, api: Arc<dyn TravisApi>) -> Result<Self> {
        options.validate()?;
        let pipeline = Pipeline::new(api)
            .with_sync(options.sync)
            .with_concurrency(options.concurrency);
        Ok(Self { options, pipeline })
    }

    pub fn options(&self) -> &EnableOptions {
        &self.options
    }

    /// Enable builds for `slugs`.
    pub async fn enable(&self, slugs: &[String]) -> Result<EnableReport> {
        let slugs = normalize_slugs(slugs)?;
        debug!(count = slugs.len(), "Enabling builds for repositories");
        self.pipeline.run(&slugs).await
    }
}

/// One-shot helper: validate `options` and enable builds for `slugs`.
pub async fn enable(slugs: &[String], options: EnableOptions) -> Result<EnableReport> {
    Enabler::new(options)?.enable(slugs).await
}
