//! Connection settings for the Travis API client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API host (Travis CI for open-source repositories).
pub const DEFAULT_HOSTNAME: &str = "api.travis-ci.org";

/// Media type selecting version 2 of the Travis API.
pub const API_V2_MEDIA_TYPE: &str = "application/vnd.travis-ci.2+json";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent when none is configured.
pub fn default_useragent() -> String {
    format!("travis-enable/{}", env!("CARGO_PKG_VERSION"))
}

/// Travis API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravisConfig {
    /// Access token, sent as `Authorization: token <token>`
    pub token: String,
    /// Endpoint hostname (no scheme, no path)
    pub hostname: String,
    /// User agent string
    pub useragent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl TravisConfig {
    /// Create a config for the default endpoint
    pub fn new(token: &str) -> Self {
        TravisConfig {
            token: token.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            useragent: default_useragent(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Target a different endpoint (e.g. `api.travis-ci.com`)
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_string();
        self
    }

    /// Override the user agent
    pub fn with_useragent(mut self, useragent: &str) -> Self {
        self.useragent = useragent.to_string();
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path such as `/hooks`
    pub fn url(&self, path: &str) -> String {
        format!(
            "https://{}/{}",
            self.hostname.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("token {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TravisConfig::new("tkn");
        assert_eq!(config.hostname, DEFAULT_HOSTNAME);
        assert!(config.useragent.starts_with("travis-enable/"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.authorization(), "token tkn");
    }

    #[test]
    fn test_url_joins_host_and_path() {
        let config = TravisConfig::new("tkn").with_hostname("api.travis-ci.com");
        assert_eq!(config.url("/hooks"), "https://api.travis-ci.com/hooks");
        assert_eq!(
            config.url("repos/math-io/erf"),
            "https://api.travis-ci.com/repos/math-io/erf"
        );
    }
}
