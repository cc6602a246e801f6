//! # flowtutor-inference
//!
//! Model invocation for flowtutor.
//!
//! This crate provides:
//! - Provider-neutral chat backend trait with a tagged response type
//! - OpenAI-compatible adapter (OpenAI, OpenRouter, Ollama, vLLM, ...)
//! - Strict/lenient invocation profiles with a per-call deadline
//! - Recovery of JSON objects from raw model text
//! - Prompt builders for graph mutation and comment clustering
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::ScriptedBackend`] to downstream tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use flowtutor_inference::{InvocationProfile, ModelInvoker, OpenAIBackend, Prompt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(OpenAIBackend::from_env().unwrap());
//!     let invoker = ModelInvoker::new(backend, Duration::from_secs(60));
//!     let text = invoker
//!         .invoke(
//!             &Prompt::new("Reply with JSON.", "Say hi"),
//!             &InvocationProfile::strict("gpt-4o-2024-08-06", 0.2),
//!         )
//!         .await
//!         .unwrap();
//!     println!("{}", text);
//! }
//! ```

pub mod backend;
pub mod extract;
pub mod openai;
pub mod pipeline;
pub mod prompts;

// Scripted backend for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use backend::{
    ChatBackend, ChatMessage, ChatRequest, FailureKind, ProviderFailure, ProviderResponse,
    ResponseFormat, Role,
};
pub use extract::{extract_json, ExtractionStrategy, Extracted};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use pipeline::{InvocationMode, InvocationProfile, ModelInvoker, Prompt, Stage};
pub use prompts::{cluster_prompt, mutation_prompt};
