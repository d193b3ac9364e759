//! Options accepted by the enable entry point.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use travis_api::TravisConfig;

use crate::error::{EnableError, Result};

/// Maximum number of enable requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Options for enabling builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableOptions {
    /// Travis CI access token.
    pub token: String,

    /// Endpoint hostname; `api.travis-ci.org` when unset.
    #[serde(default)]
    pub hostname: Option<String>,

    /// User agent string; `travis-enable/<version>` when unset.
    #[serde(default)]
    pub useragent: Option<String>,

    /// Sync the account with GitHub before resolving repositories.
    #[serde(default)]
    pub sync: bool,

    /// Width of the enable-request window.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl EnableOptions {
    pub fn new(token: &str) -> Self {
        EnableOptions {
            token: token.to_string(),
            hostname: None,
            useragent: None,
            sync: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    pub fn with_useragent(mut self, useragent: &str) -> Self {
        self.useragent = Some(useragent.to_string());
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Check every option, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(EnableError::InvalidOption(
                "`token` option must be a non-empty string".to_string(),
            ));
        }

        if let Some(hostname) = &self.hostname {
            if hostname.trim().is_empty() {
                return Err(EnableError::InvalidOption(
                    "`hostname` option must be a non-empty string".to_string(),
                ));
            }
            if hostname.contains("://") || hostname.contains('/') || hostname.contains(char::is_whitespace) {
                return Err(EnableError::InvalidOption(format!(
                    "`hostname` option must be a bare host name. Option: `{}`",
                    hostname
                )));
            }
        }

        if let Some(useragent) = &self.useragent {
            if useragent.trim().is_empty() {
                return Err(EnableError::InvalidOption(
                    "`useragent` option must be a non-empty string".to_string(),
                ));
            }
        }

        if self.concurrency == 0 {
            return Err(EnableError::InvalidOption(
                "`concurrency` option must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Client configuration derived from these options.
    pub fn client_config(&self) -> TravisConfig {
        let mut config = TravisConfig::new(&self.token);
        if let Some(hostname) = &self.hostname {
            config = config.with_hostname(hostname);
        }
        if let Some(useragent) = &self.useragent {
            config = config.with_useragent(useragent);
        }
        config
    }
}

/// Validate a slug list and drop repeated slugs, keeping first occurrences.
pub fn normalize_slugs(slugs: &[String]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(slugs.len());

    for slug in slugs {
        let trimmed = slug.trim();
        if trimmed.is_empty() {
            return Err(EnableError::InvalidInput(
                "repository slugs must be non-empty strings".to_string(),
            ));
        }
        if seen.insert(trimmed) {
            out.push(trimmed.to_string());
        }
    }

    Ok(out)
}
