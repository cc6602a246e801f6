//! `POST /mutate`: rewrite a flow graph from a user instruction.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use flowtutor_core::{Graph, MutationRequest};

use super::attach_warnings;
use crate::{ApiError, AppState};

pub const MISSING_FIELDS: &str = "Flow data and user instruction are required";
pub const MUTATION_FAILED: &str = "Failed to update flow";

/// Stage that produced the graph, `strict` or `lenient`.
pub const STAGE_HEADER: HeaderName = HeaderName::from_static("x-flowtutor-stage");

#[derive(Debug, Deserialize)]
pub struct MutateBody {
    #[serde(rename = "flowData")]
    pub flow_data: Option<Graph>,
    #[serde(rename = "userInstruction")]
    pub user_instruction: Option<String>,
}

/// Responds with the mutated graph as the whole body.
pub async fn mutate_flow(
    State(state): State<AppState>,
    body: Result<Json<MutateBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(error = %rejection, "Rejected mutation body");
        ApiError::bad_request(MISSING_FIELDS)
    })?;

    let (graph, instruction) = match (body.flow_data, body.user_instruction) {
        (Some(graph), Some(instruction)) if !instruction.trim().is_empty() => (graph, instruction),
        _ => return Err(ApiError::bad_request(MISSING_FIELDS)),
    };

    let outcome = state
        .mutation
        .mutate(&MutationRequest::new(graph, instruction))
        .await
        .map_err(|e| ApiError::from_service(e, MISSING_FIELDS, MUTATION_FAILED))?;

    let mut response = Json(outcome.graph).into_response();
    response
        .headers_mut()
        .insert(STAGE_HEADER, HeaderValue::from_static(outcome.mode.as_str()));
    attach_warnings(&mut response, &outcome.warnings);
    Ok(response)
}
