//! Environment configuration for the API server.
//!
//! Every value has a default in [`flowtutor_core::defaults`]; unparseable
//! numbers fall back to the default with a warning.

use std::str::FromStr;
use std::time::Duration;

use flowtutor_core::defaults;
use tracing::warn;

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(var = name, value = %raw, "Invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Listener and HTTP layer settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated CORS origin whitelist.
    pub allowed_origins: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            allowed_origins: defaults::ALLOWED_ORIGINS.to_string(),
            max_body_bytes: defaults::MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `3000` |
    /// | `ALLOWED_ORIGINS` | `http://localhost:3000` |
    /// | `MAX_BODY_BYTES` | 2 MiB |
    pub fn from_env() -> Self {
        Self {
            host: env_string("HOST", defaults::SERVER_HOST),
            port: env_or("PORT", defaults::SERVER_PORT),
            allowed_origins: env_string("ALLOWED_ORIGINS", defaults::ALLOWED_ORIGINS),
            max_body_bytes: env_or("MAX_BODY_BYTES", defaults::MAX_BODY_BYTES),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Response cache lifetime settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(defaults::CACHE_TTL_SECS),
            sweep_interval: Duration::from_secs(defaults::CACHE_SWEEP_INTERVAL_SECS),
        }
    }
}

impl CacheConfig {
    /// Reads `CACHE_TTL_SECS` and `CACHE_SWEEP_INTERVAL_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self {
            ttl: Duration::from_secs(env_or("CACHE_TTL_SECS", defaults::CACHE_TTL_SECS)),
            sweep_interval: Duration::from_secs(env_or(
                "CACHE_SWEEP_INTERVAL_SECS",
                defaults::CACHE_SWEEP_INTERVAL_SECS,
            )),
        };
        // tokio intervals panic on a zero period
        if config.sweep_interval.is_zero() {
            warn!("CACHE_SWEEP_INTERVAL_SECS must be positive, using default");
            config.sweep_interval = Duration::from_secs(defaults::CACHE_SWEEP_INTERVAL_SECS);
        }
        config
    }
}

/// Models and sampling for the graph mutation stages.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationConfig {
    pub strict_model: String,
    pub lenient_model: String,
    pub temperature: f32,
    pub invocation_timeout: Duration,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            strict_model: defaults::MUTATION_STRICT_MODEL.to_string(),
            lenient_model: defaults::MUTATION_LENIENT_MODEL.to_string(),
            temperature: defaults::MUTATION_TEMPERATURE,
            invocation_timeout: Duration::from_secs(defaults::INVOCATION_TIMEOUT_SECS),
        }
    }
}

impl MutationConfig {
    /// Reads `MUTATION_STRICT_MODEL`, `MUTATION_LENIENT_MODEL`,
    /// `MUTATION_TEMPERATURE` and `INVOCATION_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            strict_model: env_string("MUTATION_STRICT_MODEL", defaults::MUTATION_STRICT_MODEL),
            lenient_model: env_string("MUTATION_LENIENT_MODEL", defaults::MUTATION_LENIENT_MODEL),
            temperature: env_or("MUTATION_TEMPERATURE", defaults::MUTATION_TEMPERATURE),
            invocation_timeout: Duration::from_secs(env_or(
                "INVOCATION_TIMEOUT_SECS",
                defaults::INVOCATION_TIMEOUT_SECS,
            )),
        }
    }
}

/// Model and sampling for clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub model: String,
    pub temperature: f32,
    pub invocation_timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            model: defaults::CLUSTER_MODEL.to_string(),
            temperature: defaults::CLUSTER_TEMPERATURE,
            invocation_timeout: Duration::from_secs(defaults::INVOCATION_TIMEOUT_SECS),
        }
    }
}

impl ClusterConfig {
    /// Reads `CLUSTER_MODEL`, `CLUSTER_TEMPERATURE` and `INVOCATION_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            model: env_string("CLUSTER_MODEL", defaults::CLUSTER_MODEL),
            temperature: env_or("CLUSTER_TEMPERATURE", defaults::CLUSTER_TEMPERATURE),
            invocation_timeout: Duration::from_secs(env_or(
                "INVOCATION_TIMEOUT_SECS",
                defaults::INVOCATION_TIMEOUT_SECS,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_addr(), "0.0.0.0:3000");

        let cache = CacheConfig::default();
        assert_eq!(cache.ttl, Duration::from_secs(3600));
        assert_eq!(cache.sweep_interval, Duration::from_secs(1800));

        let mutation = MutationConfig::default();
        assert_ne!(mutation.strict_model, mutation.lenient_model);
        assert_eq!(mutation.invocation_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        std::env::set_var("FLOWTUTOR_TEST_PORT_GARBAGE", "not-a-number");
        assert_eq!(env_or("FLOWTUTOR_TEST_PORT_GARBAGE", 3000u16), 3000);
        std::env::set_var("FLOWTUTOR_TEST_PORT_GARBAGE", " 8080 ");
        assert_eq!(env_or("FLOWTUTOR_TEST_PORT_GARBAGE", 3000u16), 8080);
        std::env::remove_var("FLOWTUTOR_TEST_PORT_GARBAGE");
    }

    #[test]
    fn test_env_string_ignores_blank() {
        std::env::set_var("FLOWTUTOR_TEST_BLANK_MODEL", "   ");
        assert_eq!(env_string("FLOWTUTOR_TEST_BLANK_MODEL", "fallback"), "fallback");
        std::env::remove_var("FLOWTUTOR_TEST_BLANK_MODEL");
    }
}
