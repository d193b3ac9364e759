//! travis-enable: enable Travis CI builds for a batch of repositories
//!
//! Runs a three-stage pipeline against a [`TravisApi`]:
//! - optionally sync the account with GitHub
//! - resolve repository slugs to Travis repository ids
//! - enable builds for every resolved id, a bounded number at a time
//!
//! Per-repository failures are collected in the returned report; server
//! and transport errors abort the whole batch.
//!
//! ```no_run
//! # async fn run() -> travis_enable::Result<()> {
//! use travis_enable::{EnableOptions, Enabler};
//!
//! let enabler = Enabler::new(EnableOptions::new("token").with_sync(true))?;
//! let report = enabler.enable(&["math-io/erf".to_string()]).await?;
//! println!("{}", report.meta().success);
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod enabler;
pub mod error;
pub mod ids;
pub mod options;
pub mod pipeline;
pub mod telemetry;

pub use dispatch::Dispatcher;
pub use enabler::{enable, Enabler};
pub use error::{EnableError, Result};
pub use ids::{claim_ids, id_map, IdMap};
pub use options::{normalize_slugs, EnableOptions, DEFAULT_CONCURRENCY};
pub use pipeline::{EnableReport, Pipeline};
pub use telemetry::init_tracing;

pub use travis_api::{
    ApiError, DispatchReport, RepoInfo, Report, ReportMeta, ResolutionReport, TravisApi,
    TravisClient, TravisConfig,
};
