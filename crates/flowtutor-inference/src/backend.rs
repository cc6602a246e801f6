//! Provider-neutral chat completion contract.
//!
//! Adapters translate a [`ChatRequest`] into their wire format and translate
//! whatever comes back into a [`ProviderResponse`]. The response shape is
//! validated at the adapter boundary: downstream code only ever sees either
//! completed text or a classified failure.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Output constraint requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Provider must emit a single JSON object.
    JsonObject,
}

/// A chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub response_format: Option<ResponseFormat>,
}

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, DNS or TLS failure; no HTTP response.
    Transport,
    Authentication,
    RateLimited,
    ModelNotFound,
    ContextLength,
    Server,
    /// Response body did not match the expected completion shape.
    Malformed,
    /// Response had no choices or no message content.
    EmptyChoice,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Authentication => "authentication",
            Self::RateLimited => "rate_limited",
            Self::ModelNotFound => "model_not_found",
            Self::ContextLength => "context_length",
            Self::Server => "server",
            Self::Malformed => "malformed",
            Self::EmptyChoice => "empty_choice",
            Self::Unknown => "unknown",
        }
    }
}

/// Details of a failed provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub kind: FailureKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.kind.as_str(), status, self.message),
            None => write!(f, "{}: {}", self.kind.as_str(), self.message),
        }
    }
}

/// Outcome of a provider call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    Completed {
        /// Text of the first choice's message.
        content: String,
        /// Model that actually served the request.
        model: String,
        finish_reason: Option<String>,
    },
    Failed(ProviderFailure),
}

impl ProviderResponse {
    pub fn failed(kind: FailureKind, status: Option<u16>, message: impl Into<String>) -> Self {
        ProviderResponse::Failed(ProviderFailure {
            kind,
            status,
            message: message.into(),
        })
    }
}

/// Backend for chat-style text generation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue one completion request. Never panics on a bad reply.
    async fn complete(&self, request: &ChatRequest) -> ProviderResponse;

    /// Short provider identifier for logs (e.g. "openai").
    fn provider_name(&self) -> &str;

    /// Check if the backend is available and responding.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::system("be terse");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be terse");
    }

    #[test]
    fn test_failure_display_with_status() {
        let failure = ProviderFailure {
            kind: FailureKind::RateLimited,
            status: Some(429),
            message: "slow down".to_string(),
        };
        assert_eq!(failure.to_string(), "rate_limited (429): slow down");
    }

    #[test]
    fn test_failure_display_without_status() {
        let ProviderResponse::Failed(failure) =
            ProviderResponse::failed(FailureKind::Transport, None, "connection refused")
        else {
            panic!("Expected Failed");
        };
        assert_eq!(failure.to_string(), "transport: connection refused");
    }
}
