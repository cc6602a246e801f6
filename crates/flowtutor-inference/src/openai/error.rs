//! OpenAI-specific error classification.

use crate::backend::FailureKind;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

impl From<OpenAIErrorCode> for FailureKind {
    fn from(code: OpenAIErrorCode) -> Self {
        match code {
            OpenAIErrorCode::AuthenticationError => FailureKind::Authentication,
            OpenAIErrorCode::RateLimitExceeded => FailureKind::RateLimited,
            OpenAIErrorCode::ModelNotFound => FailureKind::ModelNotFound,
            OpenAIErrorCode::ContextLengthExceeded => FailureKind::ContextLength,
            OpenAIErrorCode::ServerError => FailureKind::Server,
            OpenAIErrorCode::Unknown => FailureKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_401() {
        let code = OpenAIErrorCode::from_response(401, "invalid_api_key");
        assert_eq!(code, OpenAIErrorCode::AuthenticationError);
    }

    #[test]
    fn test_error_code_from_429() {
        let code = OpenAIErrorCode::from_response(429, "rate_limit_exceeded");
        assert_eq!(code, OpenAIErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_error_code_from_404() {
        let code = OpenAIErrorCode::from_response(404, "model_not_found");
        assert_eq!(code, OpenAIErrorCode::ModelNotFound);
    }

    #[test]
    fn test_error_code_context_length() {
        let code = OpenAIErrorCode::from_response(400, "context_length_exceeded");
        assert_eq!(code, OpenAIErrorCode::ContextLengthExceeded);
    }

    #[test]
    fn test_error_code_from_502() {
        let code = OpenAIErrorCode::from_response(502, "bad_gateway");
        assert_eq!(code, OpenAIErrorCode::ServerError);
    }

    #[test]
    fn test_error_code_from_unknown() {
        let code = OpenAIErrorCode::from_response(418, "im_a_teapot");
        assert_eq!(code, OpenAIErrorCode::Unknown);
    }

    #[test]
    fn test_retryable() {
        assert!(OpenAIErrorCode::RateLimitExceeded.is_retryable());
        assert!(OpenAIErrorCode::ServerError.is_retryable());
        assert!(!OpenAIErrorCode::AuthenticationError.is_retryable());
        assert!(!OpenAIErrorCode::ModelNotFound.is_retryable());
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            FailureKind::from(OpenAIErrorCode::RateLimitExceeded),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::from(OpenAIErrorCode::ServerError),
            FailureKind::Server
        );
    }
}
