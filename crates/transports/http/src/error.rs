//! HTTP transport error types

use thiserror::Error;

/// HTTP transport error types
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure: connection refused, reset, or request timeout
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Relay answered with a status the protocol does not expect
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus {
        /// Response status code
        status: u16,
        /// Response body, best effort
        body: String,
    },

    /// Connection error (client construction, bad base URL)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid client state for the requested operation
    #[error("Invalid client state: {0}")]
    InvalidState(String),

    /// Receive loop gave up after the configured number of polls
    #[error("No new message from session {session_id} after {polls} polls")]
    PollLimitReached {
        /// Session being polled
        session_id: String,
        /// Polls issued
        polls: u32,
    },

    /// Server error (bind, serve)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Codec error from the signaling core
    #[error(transparent)]
    Core(#[from] sigrelay_core::Error),
}

impl Error {
    /// Transport-level failure the caller may retry at its own discretion
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::UnexpectedStatus { .. })
    }

    /// Request exceeded the configured per-request timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Network(e) if e.is_timeout())
    }

    /// Payload from the relay could not be decoded
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_malformed())
    }
}

/// Result type for HTTP transport operations
pub type Result<T> = std::result::Result<T, Error>;
