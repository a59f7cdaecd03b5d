//! Client configuration.
//!
//! Every field has a default so a host can pass `{}` or a partial JSON
//! document and get a working client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RequestError, RequestResult};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout in milliseconds. `None` waits forever.
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            user_agent: format!("courier/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ClientConfig {
    /// Default settings with every timeout disabled.
    ///
    /// Known issue: a request against an unresponsive server blocks the
    /// calling thread indefinitely. Only use this to reproduce the behaviour
    /// of hosts that relied on it.
    pub fn without_timeouts() -> Self {
        Self {
            timeout_ms: None,
            ..Self::default()
        }
    }

    /// Replace the timeout. Durations too long to express in milliseconds
    /// saturate.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json(json: &str) -> RequestResult<Self> {
        serde_json::from_str(json).map_err(|e| RequestError::Validation(format!("bad client config: {e}")))
    }
}
