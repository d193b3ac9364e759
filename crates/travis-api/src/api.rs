//! Collaborator trait for the remote operations travis-enable depends on.
//!
//! - `sync_account`: ask Travis to re-sync the account with GitHub
//! - `resolve_repos`: map repository slugs to Travis repository ids
//! - `enable_hook`: activate the build hook of a single repository
//!
//! The trait is backend-agnostic. [`TravisClient`](crate::TravisClient) talks
//! to the real API; [`FakeTravisApi`](crate::fakes::FakeTravisApi) is a
//! scripted in-memory stand-in for tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;
use crate::report::ResolutionReport;

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Remote operations against a Travis CI endpoint.
///
/// Guarantees expected from implementations:
/// - `resolve_repos` either fails as a whole (fatal error) or returns a
///   balanced report in which every requested slug appears exactly once in
///   `data` or `failures`.
/// - `enable_hook` errors carry a status classification (see
///   [`ApiError::is_fatal`]).
#[async_trait]
pub trait TravisApi: Send + Sync {
    /// Synchronize the account with the code host. Idempotent.
    async fn sync_account(&self) -> ApiResult<()>;

    /// Resolve repository slugs to repository information.
    async fn resolve_repos(&self, slugs: &[String]) -> ApiResult<ResolutionReport>;

    /// Enable builds for a single repository id, returning the raw response payload.
    async fn enable_hook(&self, id: u64) -> ApiResult<Value>;
}
