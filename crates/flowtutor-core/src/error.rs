//! Error types for flowtutor.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using flowtutor's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for flowtutor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed request fields
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model provider call failed (network, auth, rate limit, bad reply)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The model provider did not answer before the invocation deadline
    #[error("Upstream timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// No extraction strategy recovered a JSON object from model output
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        /// Raw model output, kept for diagnostics.
        raw: String,
    },

    /// Parsed model output broke a domain postcondition
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a failed strict-mode attempt may be retried in lenient mode.
    ///
    /// Input errors are the caller's fault and would fail identically.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            Error::Upstream(_)
                | Error::Timeout(_)
                | Error::Parse { .. }
                | Error::InvariantViolation(_)
        )
    }

    /// Build a parse error that keeps the raw model text.
    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Error::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("instruction is empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: instruction is empty");
    }

    #[test]
    fn test_error_display_upstream() {
        let err = Error::Upstream("rate limited".to_string());
        assert_eq!(err.to_string(), "Upstream error: rate limited");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "Upstream timed out after 60s");
    }

    #[test]
    fn test_error_display_parse_hides_raw() {
        let err = Error::parse("no JSON object found", "I'm sorry, I can't do that");
        assert_eq!(err.to_string(), "Parse error: no JSON object found");
        match err {
            Error::Parse { raw, .. } => assert_eq!(raw, "I'm sorry, I can't do that"),
            _ => panic!("Expected Parse error"),
        }
    }

    #[test]
    fn test_error_display_invariant() {
        let err = Error::InvariantViolation("missing ids: c3".to_string());
        assert_eq!(err.to_string(), "Invariant violation: missing ids: c3");
    }

    #[test]
    fn test_allows_fallback() {
        assert!(Error::Upstream("x".into()).allows_fallback());
        assert!(Error::Timeout(Duration::from_secs(1)).allows_fallback());
        assert!(Error::parse("x", "y").allows_fallback());
        assert!(Error::InvariantViolation("x".into()).allows_fallback());
        assert!(!Error::InvalidInput("x".into()).allows_fallback());
        assert!(!Error::Config("x".into()).allows_fallback());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
