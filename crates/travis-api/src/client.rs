//! Travis CI API v2 client
//!
//! Implements [`TravisApi`] over HTTPS with `reqwest`. Every request carries
//! the v2 media type, the access token and the configured user agent.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::api::{ApiResult, TravisApi};
use crate::config::{TravisConfig, API_V2_MEDIA_TYPE};
use crate::error::ApiError;
use crate::report::{RepoInfo, ResolutionReport};

/// Maximum number of repository lookups in flight during resolution.
pub const RESOLVE_CONCURRENCY: usize = 5;

/// Envelope of `GET /repos/{slug}`
#[derive(Debug, Deserialize)]
struct RepoEnvelope {
    repo: RepoInfo,
}

/// HTTP client for the Travis API
pub struct TravisClient {
    config: TravisConfig,
    http_client: reqwest::Client,
}

impl TravisClient {
    /// Create a new client
    pub fn new(config: TravisConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(API_V2_MEDIA_TYPE));
        let mut authorization = HeaderValue::from_str(&config.authorization())
            .map_err(|e| ApiError::Config(format!("invalid token: {}", e)))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let http_client = reqwest::Client::builder()
            .user_agent(config.useragent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(TravisClient {
            config,
            http_client,
        })
    }

    /// Configuration the client was built from
    pub fn config(&self) -> &TravisConfig {
        &self.config
    }

    /// Look up a single repository
    async fn repo_info(&self, slug: &str) -> ApiResult<RepoInfo> {
        let url = self.config.url(&format!("repos/{}", slug));
        debug!(slug, "Fetching repository information");

        let body = self.execute(self.http_client.get(&url)).await?;
        let envelope: RepoEnvelope = serde_json::from_value(body)?;
        Ok(envelope.repo)
    }

    /// Send a request and decode its JSON body, mapping non-2xx statuses to errors
    async fn execute(&self, request: RequestBuilder) -> ApiResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::status_error(
                status.as_u16(),
                error_message(status, &body),
            ));
        }

        parse_body(&body)
    }
}

#[async_trait]
impl TravisApi for TravisClient {
    async fn sync_account(&self) -> ApiResult<()> {
        info!(hostname = %self.config.hostname, "Syncing account");
        self.execute(self.http_client.post(self.config.url("users/sync")))
            .await?;
        Ok(())
    }

    async fn resolve_repos(&self, slugs: &[String]) -> ApiResult<ResolutionReport> {
        let mut report = ResolutionReport::new(slugs.len());

        let mut lookups = stream::iter(slugs.iter().cloned())
            .map(|slug| async move {
                let result = self.repo_info(&slug).await;
                (slug, result)
            })
            .buffer_unordered(RESOLVE_CONCURRENCY);

        while let Some((slug, result)) = lookups.next().await {
            match result {
                Ok(info) => {
                    debug!(slug = %slug, id = info.id, "Resolved repository");
                    report.record_success(slug, info);
                }
                Err(e) if e.is_fatal() => {
                    warn!(slug = %slug, error = %e, "Repository lookup failed fatally");
                    return Err(e);
                }
                Err(e) => {
                    debug!(slug = %slug, error = %e, "Failed to resolve repository");
                    report.record_failure(slug, e.message());
                }
            }
        }

        Ok(report)
    }

    async fn enable_hook(&self, id: u64) -> ApiResult<Value> {
        let request = self
            .http_client
            .put(self.config.url("hooks"))
            .json(&hook_body(id));
        self.execute(request).await
    }
}

/// Request body activating the hook of repository `id`
pub fn hook_body(id: u64) -> Value {
    json!({
        "hook": {
            "id": id,
            "active": true
        }
    })
}

fn parse_body(body: &str) -> ApiResult<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(body)?)
}

/// Best human-readable message for an error response.
///
/// Travis answers errors with bodies such as `{"error": "..."}`,
/// `{"error": {"message": "..."}}` or `{"file": "not found"}`; anything else
/// falls back to the raw body, then to the status reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let candidates = [
            value.get("error").and_then(|e| e.get("message")),
            value.get("error"),
            value.get("message"),
            value.get("file"),
        ];
        if let Some(message) = candidates.into_iter().flatten().find_map(Value::as_str) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_hook_body_shape() {
        assert_eq!(
            hook_body(4436474),
            json!({"hook": {"id": 4436474, "active": true}})
        );
    }

    #[test]
    fn test_error_message_prefers_error_field() {
        let msg = error_message(StatusCode::FORBIDDEN, r#"{"error": "Forbidden"}"#);
        assert_eq!(msg, "Forbidden");

        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error": {"message": "hook could not be updated"}}"#,
        );
        assert_eq!(msg, "hook could not be updated");

        let msg = error_message(StatusCode::NOT_FOUND, r#"{"file": "not found"}"#);
        assert_eq!(msg, "not found");
    }

    #[test]
    fn test_error_message_falls_back_to_body_then_reason() {
        let msg = error_message(StatusCode::BAD_GATEWAY, "upstream went away");
        assert_eq!(msg, "upstream went away");

        let msg = error_message(StatusCode::SERVICE_UNAVAILABLE, "<html>oops</html>");
        assert_eq!(msg, "Service Unavailable");

        let msg = error_message(StatusCode::NOT_FOUND, "");
        assert_eq!(msg, "Not Found");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body(r#"{"result":true}"#).unwrap(), json!({"result": true}));
        assert!(matches!(parse_body("not json"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_client_builds_from_config() {
        let client = TravisClient::new(TravisConfig::new("abc123")).unwrap();
        assert_eq!(client.config().token, "abc123");
    }

    /// Client pointed at a closed local port: every request fails before a response.
    fn unreachable_client() -> TravisClient {
        let config = TravisConfig::new("abc123")
            .with_hostname("127.0.0.1:1")
            .with_timeout(Duration::from_secs(5));
        TravisClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_host_sync_is_fatal_transport_error() {
        let err = unreachable_client().sync_account().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unreachable_host_resolve_fails_as_a_whole() {
        let api: Arc<dyn TravisApi> = Arc::new(unreachable_client());
        let slugs = vec!["math-io/erf".to_string(), "math-io/erfc".to_string()];

        let err = api.resolve_repos(&slugs).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unreachable_host_enable_hook_is_fatal() {
        let err = unreachable_client().enable_hook(4436474).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_resolve_empty_batch_makes_no_requests() {
        let report = unreachable_client().resolve_repos(&[]).await.unwrap();
        assert_eq!(report.meta.total, 0);
        assert!(report.is_balanced());
    }

    #[test]
    fn test_client_rejects_unprintable_token() {
        let result = TravisClient::new(TravisConfig::new("bad\ntoken"));
        assert!(matches!(result, Err(ApiError::Config(_))));
    }
}
