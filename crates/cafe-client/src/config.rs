//! Client configuration.

use std::time::Duration;

/// Default dashboard refresh interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the endpoint lives and how the client paces itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL of the action endpoint, e.g. `http://localhost:8080/exec`.
    pub endpoint: String,

    /// Key the public order page and newsletter form send as `secret`.
    pub public_api_key: Option<String>,

    pub request_timeout: Duration,

    /// How often dashboards re-fetch orders.
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        ClientConfig {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            public_api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn public_api_key(mut self, key: impl Into<String>) -> Self {
        self.public_api_key = Some(key.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
