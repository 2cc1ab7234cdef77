//! Configuration types for the relay server and the polling client

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sigrelay_core::SdpType;
use std::net::SocketAddr;
use std::time::Duration;

/// Default relay port
pub const DEFAULT_PORT: u16 = 3000;

/// Relay server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayServerConfig {
    /// Address to bind to (e.g. "0.0.0.0:3000")
    pub bind_address: String,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", DEFAULT_PORT),
        }
    }
}

impl RelayServerConfig {
    pub fn new(bind_address: impl Into<String>) -> Self {
        Self {
            bind_address: bind_address.into(),
        }
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address.parse().map_err(|e| {
            Error::InvalidConfig(format!(
                "bind_address must be host:port, got {:?}: {}",
                self.bind_address, e
            ))
        })
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.socket_addr().map(|_| ())
    }
}

/// Polling client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingConfig {
    /// Relay base URL (e.g. "http://localhost:3000")
    pub base_url: String,

    /// Session shared by both peers
    pub session_id: String,

    /// Slot this client writes into; it polls the other one
    pub role: SdpType,

    /// Fixed delay before every poll (default: 1000ms)
    pub poll_interval_ms: u64,

    /// Per-request timeout, `None` to wait indefinitely (default: 10000ms)
    pub request_timeout_ms: Option<u64>,

    /// Give up after this many polls without a new message (default: unbounded)
    pub max_polls: Option<u32>,
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://localhost:{}", DEFAULT_PORT),
            session_id: "default".to_string(),
            role: SdpType::Offer,
            poll_interval_ms: 1000,
            request_timeout_ms: Some(10_000),
            max_polls: None,
        }
    }
}

impl SignalingConfig {
    pub fn new(base_url: impl Into<String>, session_id: impl Into<String>, role: SdpType) -> Self {
        Self {
            base_url: base_url.into(),
            session_id: session_id.into(),
            role,
            ..Default::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `base_url` is empty or not http(s)
    /// - `session_id` is empty
    /// - `poll_interval_ms` is not in range 1-60000
    /// - `request_timeout_ms` or `max_polls` is zero
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::InvalidConfig("base_url cannot be empty".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.session_id.is_empty() {
            return Err(Error::InvalidConfig("session_id cannot be empty".to_string()));
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > 60_000 {
            return Err(Error::InvalidConfig(format!(
                "poll_interval_ms must be in range 1-60000, got {}",
                self.poll_interval_ms
            )));
        }

        if self.request_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_polls == Some(0) {
            return Err(Error::InvalidConfig(
                "max_polls must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SignalingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.max_polls, None);
    }

    #[test]
    fn test_builder() {
        let config = SignalingConfig::new("http://relay:3000", "s1", SdpType::Answer)
            .with_poll_interval(Duration::from_millis(50))
            .with_request_timeout(None)
            .with_max_polls(3);
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.max_polls, Some(3));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = SignalingConfig::default()
            .with_poll_interval(Duration::MAX)
            .with_request_timeout(Some(Duration::MAX));
        assert_eq!(config.poll_interval_ms, u64::MAX);
        assert_eq!(config.request_timeout_ms, Some(u64::MAX));
        assert!(config.validate().unwrap_err().to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = SignalingConfig::default();
        config.base_url = String::new();
        assert!(config.validate().is_err());

        config.base_url = "ftp://relay".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("base_url"));
    }

    #[test]
    fn test_invalid_session_id() {
        let mut config = SignalingConfig::default();
        config.session_id = String::new();
        assert!(config.validate().unwrap_err().to_string().contains("session_id"));
    }

    #[test]
    fn test_invalid_intervals() {
        let mut config = SignalingConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().unwrap_err().to_string().contains("poll_interval_ms"));

        config.poll_interval_ms = 60_001;
        assert!(config.validate().is_err());

        config.poll_interval_ms = 1000;
        config.request_timeout_ms = Some(0);
        assert!(config.validate().unwrap_err().to_string().contains("request_timeout_ms"));

        config.request_timeout_ms = None;
        config.max_polls = Some(0);
        assert!(config.validate().unwrap_err().to_string().contains("max_polls"));
    }

    #[test]
    fn test_config_from_json() {
        let config: SignalingConfig = serde_json::from_str(
            r#"{
                "base_url": "https://relay.example.com",
                "session_id": "room-7",
                "role": "answer",
                "poll_interval_ms": 1000,
                "request_timeout_ms": null,
                "max_polls": null
            }"#,
        )
        .unwrap();
        assert_eq!(config.role, SdpType::Answer);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_server_config() {
        assert!(RelayServerConfig::default().validate().is_ok());
        assert!(RelayServerConfig::new("127.0.0.1:0").validate().is_ok());
        assert!(RelayServerConfig::new("localhost").validate().is_err());
    }
}
