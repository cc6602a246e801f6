//! Scripted chat backend for deterministic testing.
//!
//! Responses are queued per model; each call pops the next one. When a
//! model's queue is empty the default response is used.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flowtutor_inference::mock::ScriptedBackend;
//!
//! let backend = ScriptedBackend::new()
//!     .with_reply("gpt-4o", r#"{"nodes": [], "edges": []}"#)
//!     .with_failure("gpt-4o-mini", 503, "unavailable");
//! assert_eq!(backend.call_count(), 0);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{ChatBackend, ChatRequest, FailureKind, ProviderResponse};

/// A recorded completion request.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub request: ChatRequest,
    pub timestamp: std::time::Instant,
}

#[derive(Debug, Default)]
struct Script {
    queues: HashMap<String, VecDeque<ProviderResponse>>,
    fallback: Option<ProviderResponse>,
}

/// Mock chat backend replaying queued responses.
#[derive(Clone)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    latency: Duration,
    name: String,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Create a mock that fails every call until scripted.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            call_log: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
            name: "mock".to_string(),
        }
    }

    /// Queue a completed reply for `model`.
    pub fn with_reply(self, model: impl Into<String>, content: impl Into<String>) -> Self {
        let model = model.into();
        let response = ProviderResponse::Completed {
            content: content.into(),
            model: model.clone(),
            finish_reason: Some("stop".to_string()),
        };
        self.push(model, response);
        self
    }

    /// Queue a provider failure for `model`.
    pub fn with_failure(self, model: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => FailureKind::Authentication,
            429 => FailureKind::RateLimited,
            404 => FailureKind::ModelNotFound,
            500..=599 => FailureKind::Server,
            _ => FailureKind::Unknown,
        };
        self.push(model.into(), ProviderResponse::failed(kind, Some(status), message));
        self
    }

    /// Response used when a model's queue is exhausted.
    pub fn with_default_reply(self, content: impl Into<String>) -> Self {
        self.script.lock().unwrap().fallback = Some(ProviderResponse::Completed {
            content: content.into(),
            model: "mock".to_string(),
            finish_reason: Some("stop".to_string()),
        });
        self
    }

    /// Simulated latency for every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a reply after construction.
    pub fn push_reply(&self, model: impl Into<String>, content: impl Into<String>) {
        let model = model.into();
        let response = ProviderResponse::Completed {
            content: content.into(),
            model: model.clone(),
            finish_reason: Some("stop".to_string()),
        };
        self.push(model, response);
    }

    fn push(&self, model: String, response: ProviderResponse) {
        self.script
            .lock()
            .unwrap()
            .queues
            .entry(model)
            .or_default()
            .push_back(response);
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Models requested, in call order.
    pub fn models_called(&self) -> Vec<String> {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.request.model.clone())
            .collect()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    fn next_response(&self, model: &str) -> ProviderResponse {
        let mut script = self.script.lock().unwrap();
        if let Some(response) = script.queues.get_mut(model).and_then(VecDeque::pop_front) {
            return response;
        }
        script.fallback.clone().unwrap_or_else(|| {
            ProviderResponse::failed(
                FailureKind::Unknown,
                None,
                format!("no scripted response for model {}", model),
            )
        })
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> ProviderResponse {
        self.call_log.lock().unwrap().push(MockCall {
            request: request.clone(),
            timestamp: std::time::Instant::now(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_response(&request.model)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> bool {
        true
    }
}
