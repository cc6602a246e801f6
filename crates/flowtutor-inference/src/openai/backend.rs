//! OpenAI-compatible chat completion adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, trace, warn};

use flowtutor_core::defaults::{OPENAI_URL, PROVIDER_TIMEOUT_SECS};
use flowtutor_core::{Error, Result};

use super::error::OpenAIErrorCode;
use super::types::*;
use crate::backend::{
    ChatBackend, ChatRequest, FailureKind, ProviderResponse, ResponseFormat,
};

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Skip TLS verification (for self-signed certs in local environments).
    pub skip_tls_verify: bool,
    /// HTTP-Referer header for OpenRouter.ai rankings (optional).
    pub http_referer: Option<String>,
    /// X-Title header for app name on OpenRouter.ai (optional).
    pub x_title: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_URL.to_string(),
            api_key: None,
            timeout_seconds: PROVIDER_TIMEOUT_SECS,
            skip_tls_verify: false,
            http_referer: None,
            x_title: None,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from `OPENAI_*` environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    /// | `OPENAI_API_KEY` | none |
    /// | `OPENAI_TIMEOUT` | `120` |
    /// | `OPENAI_SKIP_TLS_VERIFY` | `false` |
    /// | `OPENAI_HTTP_REFERER` / `OPENAI_X_TITLE` | none |
    pub fn from_env() -> Self {
        Self::from_env_with_prefix("OPENAI")
    }

    /// Same as [`from_env`](Self::from_env) with a different variable prefix,
    /// e.g. `FALLBACK` reads `FALLBACK_BASE_URL`, `FALLBACK_API_KEY`, ...
    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let var = |name: &str| std::env::var(format!("{}_{}", prefix, name)).ok();
        Self {
            base_url: var("BASE_URL").unwrap_or_else(|| OPENAI_URL.to_string()),
            api_key: var("API_KEY"),
            timeout_seconds: var("TIMEOUT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PROVIDER_TIMEOUT_SECS),
            skip_tls_verify: var("SKIP_TLS_VERIFY")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
            http_referer: var("HTTP_REFERER"),
            x_title: var("X_TITLE"),
        }
    }
}

/// OpenAI-compatible chat backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let mut client_builder =
            Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if config.skip_tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            has_api_key = config.api_key.is_some(),
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OpenAIConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        // Add OpenRouter-specific headers if configured
        if let Some(ref referer) = self.config.http_referer {
            req = req.header("HTTP-Referer", referer);
        }

        if let Some(ref title) = self.config.x_title {
            req = req.header("X-Title", title);
        }

        req.header("Content-Type", "application/json")
    }

    /// Build a GET request with authentication.
    fn build_get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.get(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req
    }

    fn wire_request(request: &ChatRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            temperature: Some(request.temperature),
            response_format: request.response_format.map(|format| match format {
                ResponseFormat::JsonObject => ResponseFormatSpec::json_object(),
            }),
            stream: false,
        }
    }

    /// Turn a decoded completion body into the tagged response.
    fn interpret(requested_model: &str, body: ChatCompletionResponse) -> ProviderResponse {
        let model = body.model.unwrap_or_else(|| requested_model.to_string());

        let Some(choice) = body.choices.into_iter().next() else {
            return ProviderResponse::failed(
                FailureKind::EmptyChoice,
                None,
                "response contained no choices",
            );
        };
        let Some(message) = choice.message else {
            return ProviderResponse::failed(
                FailureKind::Malformed,
                None,
                "first choice has no message",
            );
        };
        match message.content {
            Some(content) => ProviderResponse::Completed {
                content,
                model,
                finish_reason: choice.finish_reason,
            },
            None => {
                let reason = message
                    .refusal
                    .map(|r| format!("model refused: {}", r))
                    .unwrap_or_else(|| "first choice has no content".to_string());
                ProviderResponse::failed(FailureKind::EmptyChoice, None, reason)
            }
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    #[instrument(skip(self, request), fields(subsystem = "inference", component = "openai", op = "complete", model = %request.model, json_mode = request.response_format.is_some()))]
    async fn complete(&self, request: &ChatRequest) -> ProviderResponse {
        let wire = Self::wire_request(request);

        let response = match self
            .build_request("/chat/completions")
            .json(&wire)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Provider request failed");
                return ProviderResponse::failed(FailureKind::Transport, None, e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body: OpenAIErrorResponse =
                response.json().await.unwrap_or(OpenAIErrorResponse {
                    error: OpenAIError {
                        message: "Unknown error".to_string(),
                        error_type: "unknown".to_string(),
                        code: None,
                    },
                });
            let error_type = body.error.code.as_deref().unwrap_or(&body.error.error_type);
            let code = OpenAIErrorCode::from_response(status.as_u16(), error_type);
            warn!(
                status = status.as_u16(),
                ?code,
                retryable = code.is_retryable(),
                "Provider returned error status"
            );
            return ProviderResponse::failed(
                code.into(),
                Some(status.as_u16()),
                body.error.message,
            );
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return ProviderResponse::failed(
                    FailureKind::Transport,
                    Some(status.as_u16()),
                    format!("Failed to read response body: {}", e),
                )
            }
        };
        trace!(body = %text, "Provider response body");

        let body: ChatCompletionResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) => {
                return ProviderResponse::failed(
                    FailureKind::Malformed,
                    Some(status.as_u16()),
                    format!("Failed to parse response: {}", e),
                )
            }
        };

        let result = Self::interpret(&request.model, body);
        if let ProviderResponse::Completed { ref content, .. } = result {
            debug!(response_len = content.len(), "Completion received");
        }
        result
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> bool {
        // For OpenAI-compatible APIs, we try a minimal models list request
        let response = self
            .build_get_request("/models")
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    info!("OpenAI health check passed");
                    true
                } else {
                    warn!("OpenAI health check failed: {}", resp.status());
                    false
                }
            }
            Err(e) => {
                warn!("OpenAI health check error: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ChatMessage;

    fn body(json: &str) -> ChatCompletionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, OPENAI_URL);
        assert_eq!(config.timeout_seconds, PROVIDER_TIMEOUT_SECS);
        assert!(!config.skip_tls_verify);
        assert!(config.api_key.is_none());
        assert!(config.http_referer.is_none());
        assert!(config.x_title.is_none());
    }

    #[test]
    fn test_backend_creation() {
        let backend = OpenAIBackend::with_defaults();
        assert!(backend.is_ok());
        assert_eq!(backend.unwrap().provider_name(), "openai");
    }

    #[test]
    fn test_wire_request_strict_sets_json_object() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.2,
            response_format: Some(ResponseFormat::JsonObject),
        };
        let wire = OpenAIBackend::wire_request(&request);
        assert_eq!(wire.response_format, Some(ResponseFormatSpec::json_object()));
        assert_eq!(wire.temperature, Some(0.2));
        assert!(!wire.stream);
    }

    #[test]
    fn test_interpret_completed() {
        let result = OpenAIBackend::interpret(
            "requested",
            body(r#"{"model": "served", "choices": [{"message": {"content": "{}"}, "finish_reason": "stop"}]}"#),
        );
        assert_eq!(
            result,
            ProviderResponse::Completed {
                content: "{}".to_string(),
                model: "served".to_string(),
                finish_reason: Some("stop".to_string()),
            }
        );
    }

    #[test]
    fn test_interpret_no_choices() {
        let result = OpenAIBackend::interpret("m", body(r#"{"choices": []}"#));
        assert!(matches!(
            result,
            ProviderResponse::Failed(ref f) if f.kind == FailureKind::EmptyChoice
        ));
    }

    #[test]
    fn test_interpret_missing_message() {
        let result = OpenAIBackend::interpret("m", body(r#"{"choices": [{"index": 0}]}"#));
        assert!(matches!(
            result,
            ProviderResponse::Failed(ref f) if f.kind == FailureKind::Malformed
        ));
    }

    #[test]
    fn test_interpret_refusal() {
        let result = OpenAIBackend::interpret(
            "m",
            body(r#"{"choices": [{"message": {"content": null, "refusal": "cannot help"}}]}"#),
        );
        match result {
            ProviderResponse::Failed(f) => assert!(f.message.contains("cannot help")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }
}
