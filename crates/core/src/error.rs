//! Error types for sigrelay-core

use thiserror::Error;

/// Result type alias for sigrelay-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sigrelay-core
#[derive(Debug, Error)]
pub enum Error {
    /// Payload could not be classified as a description, candidate or terminate
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Operation has no wire representation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for payloads the codec could not classify or parse
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedMessage(_) | Error::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MalformedMessage("no type".to_string());
        assert_eq!(err.to_string(), "Malformed message: no type");
    }

    #[test]
    fn test_is_malformed() {
        assert!(Error::MalformedMessage("x".to_string()).is_malformed());
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(Error::from(json_err).is_malformed());
        assert!(!Error::Unsupported("candidate encoding".to_string()).is_malformed());
    }
}
