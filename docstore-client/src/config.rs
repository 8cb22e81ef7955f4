//! Document store client configuration.

use crate::version::ProtocolVersion;
use std::time::Duration;

/// Default endpoint of a local store installation.
pub const DEFAULT_URL: &str = "http://127.0.0.1:9200";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Store endpoint URL(s), tried in order.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Timeout for the liveness handshake performed by `connect`.
    pub connect_timeout: Duration,
    /// Timeout for every other request.
    pub request_timeout: Duration,
    /// Whether `connect` pings endpoints before choosing one.
    pub healthcheck: bool,
    /// Protocol version to assume when the handshake is skipped.
    pub assumed_version: Option<ProtocolVersion>,
}

impl ClientConfig {
    /// Create a new configuration with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            password: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            healthcheck: true,
            assumed_version: None,
        }
    }

    /// Create configuration with multiple candidate URLs.
    pub fn cluster(urls: Vec<String>) -> Self {
        Self {
            urls,
            ..Self::default()
        }
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set connection (handshake) timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable the connect-time handshake.
    pub fn with_healthcheck(mut self, enabled: bool) -> Self {
        self.healthcheck = enabled;
        self
    }

    /// Protocol version to use when the handshake is disabled.
    pub fn with_assumed_version(mut self, version: ProtocolVersion) -> Self {
        self.assumed_version = Some(version);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.urls, vec![DEFAULT_URL.to_string()]);
        assert!(config.healthcheck);
        assert!(config.username.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_cluster_keeps_order() {
        let config = ClientConfig::cluster(vec![
            "http://a:9200".to_string(),
            "http://b:9200".to_string(),
        ])
        .with_basic_auth("elastic", "changeme")
        .with_healthcheck(false);

        assert_eq!(config.urls[0], "http://a:9200");
        assert_eq!(config.urls[1], "http://b:9200");
        assert_eq!(config.username.as_deref(), Some("elastic"));
        assert!(!config.healthcheck);
    }
}
