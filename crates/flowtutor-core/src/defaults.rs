//! Centralized default constants for flowtutor.
//!
//! **This module is the single source of truth** for shared default values.
//! Configuration structs read environment overrides and fall back to these.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP listen host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default CORS origin whitelist (comma-separated).
pub const ALLOWED_ORIGINS: &str = "http://localhost:3000";

/// Maximum accepted request body in bytes (graphs with many nodes are large).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// PROVIDER
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// HTTP client timeout for provider requests.
pub const PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Per-invocation deadline enforced around each model call.
pub const INVOCATION_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// MODELS
// =============================================================================

/// Structured-output capable model used for the strict mutation stage.
pub const MUTATION_STRICT_MODEL: &str = "gpt-4o-2024-08-06";

/// Smaller plain-completion model used for the lenient mutation stage.
pub const MUTATION_LENIENT_MODEL: &str = "gpt-4o-mini";

/// Model used for clustering (strict mode only).
pub const CLUSTER_MODEL: &str = "gpt-4o-2024-08-06";

/// Sampling temperature for graph mutation.
pub const MUTATION_TEMPERATURE: f32 = 0.2;

/// Sampling temperature for clustering.
pub const CLUSTER_TEMPERATURE: f32 = 0.3;

// =============================================================================
// CACHE
// =============================================================================

/// Age at which a cached clustering result is considered stale.
pub const CACHE_TTL_SECS: u64 = 60 * 60;

/// Period of the background expiry sweep.
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 30 * 60;

/// Prefix applied to every clustering cache key.
pub const CACHE_KEY_PREFIX: &str = "ft:cluster:";

// =============================================================================
// CLUSTERING
// =============================================================================

/// Maximum number of words in a theme name before a warning is raised.
pub const THEME_NAME_MAX_WORDS: usize = 2;
