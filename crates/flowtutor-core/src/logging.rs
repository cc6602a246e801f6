//! Structured logging schema and field name constants for flowtutor.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names in every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, fallback applied or invariant flagged |
//! | INFO  | Lifecycle events (startup, shutdown, sweeper), request completions |
//! | DEBUG | Decision points: cache hit/miss, extraction strategy, stage outcome |
//! | TRACE | Raw prompts and raw model output |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "inference", "cache"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "openai", "invoker", "graph_mutation", "clustering"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "complete", "invoke", "mutate", "cluster", "sweep"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Flow (diagram) identifier used as the clustering cache partition.
pub const FLOW_ID: &str = "flow_id";

/// Cache key (hashed canonical payload).
pub const CACHE_KEY: &str = "cache_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of nodes in a graph.
pub const NODE_COUNT: &str = "node_count";

/// Number of edges in a graph.
pub const EDGE_COUNT: &str = "edge_count";

/// Number of items submitted for clustering.
pub const ITEM_COUNT: &str = "item_count";

/// Number of themes produced.
pub const THEME_COUNT: &str = "theme_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Invocation mode ("strict" or "lenient").
pub const MODE: &str = "mode";

/// Pipeline stage ("strict" or "lenient").
pub const STAGE: &str = "stage";

/// Extraction strategy that recovered the JSON object.
pub const STRATEGY: &str = "strategy";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Whether a response was served from cache.
pub const CACHE_HIT: &str = "cache_hit";
