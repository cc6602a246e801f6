//! OpenAI-compatible chat completion backend.
//!
//! Works with any endpoint exposing `/chat/completions` in the OpenAI wire
//! format, including:
//!
//! - OpenAI cloud API
//! - Azure OpenAI
//! - OpenRouter
//! - Ollama (in OpenAI compatibility mode)
//! - vLLM, LocalAI, LM Studio
//!
//! # Example
//!
//! ```rust,no_run
//! use flowtutor_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! // From environment variables
//! let backend = OpenAIBackend::from_env().unwrap();
//!
//! // Or with custom config
//! let config = OpenAIConfig {
//!     base_url: "http://localhost:11434/v1".to_string(), // Ollama
//!     api_key: None, // Not needed for local
//!     timeout_seconds: 120,
//!     skip_tls_verify: false,
//!     http_referer: None,
//!     x_title: None,
//! };
//! let backend = OpenAIBackend::new(config).unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::OpenAIErrorCode;
pub use types::*;
