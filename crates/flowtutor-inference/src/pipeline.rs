//! Model invocation pipeline.
//!
//! A [`ModelInvoker`] issues one chat completion under an
//! [`InvocationProfile`] and returns the raw text. A [`Stage`] adds JSON
//! extraction on top, yielding a `Result` that orchestrators inspect to decide
//! whether a further stage runs. No retries happen here.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, instrument, trace, warn};

use flowtutor_core::{Error, Result};

use crate::backend::{ChatBackend, ChatMessage, ChatRequest, ProviderResponse, ResponseFormat};
use crate::extract::extract_json;

/// How strictly the provider is asked to emit JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Structured-output model variant with `response_format = json_object`.
    Strict,
    /// Plain completion; output usually needs fence or brace extraction.
    Lenient,
}

impl InvocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model, mode and sampling settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationProfile {
    pub mode: InvocationMode,
    pub model: String,
    pub temperature: f32,
}

impl InvocationProfile {
    pub fn strict(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            mode: InvocationMode::Strict,
            model: model.into(),
            temperature,
        }
    }

    pub fn lenient(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            mode: InvocationMode::Lenient,
            model: model.into(),
            temperature,
        }
    }
}

/// System and user text sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.system.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }
}

/// Issues completions against a backend with a per-call deadline.
#[derive(Clone)]
pub struct ModelInvoker {
    backend: Arc<dyn ChatBackend>,
    timeout: Duration,
}

impl ModelInvoker {
    pub fn new(backend: Arc<dyn ChatBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn provider_name(&self) -> &str {
        self.backend.provider_name()
    }

    /// Check if the underlying provider is reachable.
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    fn build_request(prompt: &Prompt, profile: &InvocationProfile) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !prompt.system.is_empty() {
            messages.push(ChatMessage::system(prompt.system.clone()));
        }
        messages.push(ChatMessage::user(prompt.user.clone()));

        ChatRequest {
            model: profile.model.clone(),
            messages,
            temperature: profile.temperature,
            response_format: match profile.mode {
                InvocationMode::Strict => Some(ResponseFormat::JsonObject),
                InvocationMode::Lenient => None,
            },
        }
    }

    /// Run one completion and return the raw text.
    ///
    /// Provider failures map to [`Error::Upstream`]; exceeding the deadline
    /// maps to [`Error::Timeout`] and drops the in-flight request.
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "invoker", op = "invoke", provider = %self.backend.provider_name(), model = %profile.model, mode = %profile.mode, prompt_len = prompt.len()))]
    pub async fn invoke(&self, prompt: &Prompt, profile: &InvocationProfile) -> Result<String> {
        let request = Self::build_request(prompt, profile);
        trace!(system = %prompt.system, user = %prompt.user, "Prompt");

        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| {
                warn!(timeout_secs = self.timeout.as_secs(), "Model invocation timed out");
                Error::Timeout(self.timeout)
            })?;
        let duration_ms = start.elapsed().as_millis() as u64;

        match response {
            ProviderResponse::Completed {
                content,
                model,
                finish_reason,
            } => {
                debug!(
                    served_by = %model,
                    ?finish_reason,
                    response_len = content.len(),
                    duration_ms,
                    "Model invocation complete"
                );
                Ok(content)
            }
            ProviderResponse::Failed(failure) => {
                warn!(%failure, duration_ms, "Model invocation failed");
                Err(Error::Upstream(failure.to_string()))
            }
        }
    }
}

/// One invocation profile bound to an invoker, producing a parsed object.
#[derive(Clone)]
pub struct Stage {
    pub invoker: ModelInvoker,
    pub profile: InvocationProfile,
}

impl Stage {
    pub fn new(invoker: ModelInvoker, profile: InvocationProfile) -> Self {
        Self { invoker, profile }
    }

    /// Invoke the model and extract a JSON object from its output.
    pub async fn run(&self, prompt: &Prompt) -> Result<Map<String, JsonValue>> {
        let raw = self.invoker.invoke(prompt, &self.profile).await?;
        let extracted = extract_json(&raw)?;
        debug!(
            mode = %self.profile.mode,
            strategy = %extracted.strategy,
            "Stage produced JSON object"
        );
        Ok(extracted.object)
    }
}
