//! Travis-API: remote collaborators for travis-enable
//!
//! This crate provides the layer travis-enable talks to:
//! - the [`TravisApi`] trait (account sync, repository resolution, hook activation)
//! - [`TravisClient`], its HTTPS implementation against Travis API v2
//! - the [`Report`] model shared by resolution and dispatch
//! - an in-memory [`fakes::FakeTravisApi`] for tests
//!
//! ## Layer 0 - Remote Services

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod fakes;
pub mod report;

pub use api::{ApiResult, TravisApi};
pub use client::{hook_body, TravisClient, RESOLVE_CONCURRENCY};
pub use config::{TravisConfig, DEFAULT_HOSTNAME};
pub use error::{ApiError, FATAL_STATUS_FLOOR};
pub use report::{DispatchReport, RepoInfo, Report, ReportMeta, ResolutionReport};
