//! `POST /cluster`: group comments into named themes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use flowtutor_core::{ClusterItem, ClusterRequest, ClusterResult};

use super::attach_warnings;
use crate::{ApiError, AppState};

pub const INVALID_COMMENTS: &str = "Valid comments array is required";
pub const CLUSTERING_FAILED: &str = "Failed to cluster comments";

/// `hit` when the themes came from the response cache, otherwise `miss`.
pub const CACHE_HEADER: HeaderName = HeaderName::from_static("x-flowtutor-cache");

#[derive(Debug, Deserialize)]
pub struct ClusterBody {
    pub comments: Option<Vec<ClusterItem>>,
    #[serde(rename = "flowId", default)]
    pub flow_id: Option<JsonValue>,
}

fn partition(flow_id: Option<JsonValue>) -> String {
    match flow_id {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s,
        Some(other) => other.to_string(),
    }
}

/// Responds with `{"themes": [...]}`.
pub async fn cluster_comments(
    State(state): State<AppState>,
    body: Result<Json<ClusterBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "Rejected cluster body");
        ApiError::bad_request(INVALID_COMMENTS)
    })?;

    let items = match body.comments {
        Some(items) if !items.is_empty() => items,
        _ => return Err(ApiError::bad_request(INVALID_COMMENTS)),
    };
    let request = ClusterRequest::new(items, partition(body.flow_id));

    let outcome = state
        .clustering
        .cluster(&request)
        .await
        .map_err(|e| ApiError::from_service(e, INVALID_COMMENTS, CLUSTERING_FAILED))?;

    // Cached payloads are shared; the response gets its own copy.
    let result: ClusterResult = outcome.result.as_ref().clone();
    let mut response = Json(result).into_response();
    response.headers_mut().insert(
        CACHE_HEADER,
        HeaderValue::from_static(if outcome.cache_hit { "hit" } else { "miss" }),
    );
    attach_warnings(&mut response, &outcome.warnings);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partition_from_flow_id() {
        assert_eq!(partition(None), "");
        assert_eq!(partition(Some(JsonValue::Null)), "");
        assert_eq!(partition(Some(json!("flow-1"))), "flow-1");
        assert_eq!(partition(Some(json!(42))), "42");
    }
}
