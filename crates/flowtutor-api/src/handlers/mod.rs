//! HTTP handlers for flowtutor-api.

pub mod cluster;
pub mod health;
pub mod mutate;

use axum::http::{HeaderName, HeaderValue};
use axum::response::Response;
use tracing::warn;

use flowtutor_core::ValidationWarning;

/// Advisory validation findings, `; `-separated.
pub const WARNINGS_HEADER: HeaderName = HeaderName::from_static("x-flowtutor-warnings");

/// Attach validation warnings to a response without altering its body.
pub(crate) fn attach_warnings(response: &mut Response, warnings: &[ValidationWarning]) {
    if warnings.is_empty() {
        return;
    }
    let joined = warnings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    match HeaderValue::from_str(&joined) {
        Ok(value) => {
            response.headers_mut().insert(WARNINGS_HEADER, value);
        }
        Err(_) => warn!(warnings = %joined, "Warnings not representable as a header value"),
    }
}
