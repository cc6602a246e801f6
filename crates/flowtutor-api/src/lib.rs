//! flowtutor-api - HTTP API for AI graph mutation and comment clustering.
//!
//! Routes:
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/mutate` | [`handlers::mutate::mutate_flow`] |
//! | `POST` | `/cluster` | [`handlers::cluster::cluster_comments`] |
//! | `GET` | `/health` | [`handlers::health::health_check`] |

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::field::Empty;
use uuid::Uuid;

use flowtutor_core::{defaults, logging};

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// CORS
// =============================================================================

/// Parse a comma-separated origin whitelist.
///
/// Invalid entries are skipped with a warning; an empty list falls back to
/// [`defaults::ALLOWED_ORIGINS`].
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        return vec![HeaderValue::from_static(defaults::ALLOWED_ORIGINS)];
    }
    origins
}

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parse_allowed_origins(allowed_origins)))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            handlers::WARNINGS_HEADER,
            handlers::cluster::CACHE_HEADER,
            handlers::mutate::STAGE_HEADER,
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/mutate", post(handlers::mutate::mutate_flow))
        .route("/cluster", post(handlers::cluster::cluster_comments))
        .route("/health", get(handlers::health::health_check))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let span = tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = Empty,
                );
                if let Some(id) = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                {
                    span.record(logging::REQUEST_ID, id);
                }
                span
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(&server.allowed_origins))
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_allowed_origins_parsing() {
        let origins = parse_allowed_origins("https://flowtutor.example");
        assert_eq!(origins.len(), 1);
        assert_eq!(origins[0].to_str().unwrap(), "https://flowtutor.example");

        let origins = parse_allowed_origins(
            "https://flowtutor.example, http://localhost:3000 , https://staging.example",
        );
        assert_eq!(origins.len(), 3);
        assert_eq!(origins[1].to_str().unwrap(), "http://localhost:3000");
    }

    #[test]
    fn test_cors_empty_uses_default() {
        let origins = parse_allowed_origins(" , ");
        assert_eq!(origins, vec![HeaderValue::from_static(defaults::ALLOWED_ORIGINS)]);
    }

    #[test]
    fn test_request_id_is_uuid_v7() {
        let request = Request::new(());
        let id = MakeRequestUuidV7.make_request_id(&request).unwrap();
        let parsed = Uuid::parse_str(id.header_value().to_str().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }
}
