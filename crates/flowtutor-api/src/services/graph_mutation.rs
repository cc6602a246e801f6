//! Graph mutation: instruction + graph in, validated replacement graph out.
//!
//! Two stages run sequentially. The strict stage asks a structured-output
//! model for JSON; if it fails with an error that allows fallback, the
//! lenient stage retries once with a plain completion model. Results are
//! never cached.

use std::time::Instant;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, field::Empty, info, instrument, trace, warn, Span};

use flowtutor_core::{
    canonicalize_graph, logging, validate_mutation, Error, Graph, MutationRequest, Result,
    ValidationWarning,
};
use flowtutor_inference::{mutation_prompt, InvocationMode, Prompt, Stage};

/// A validated mutation.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub graph: Graph,
    pub warnings: Vec<ValidationWarning>,
    /// Stage that produced the graph.
    pub mode: InvocationMode,
}

/// Orchestrates the strict and lenient mutation stages.
#[derive(Clone)]
pub struct GraphMutationService {
    strict: Stage,
    lenient: Stage,
}

impl GraphMutationService {
    pub fn new(strict: Stage, lenient: Stage) -> Self {
        Self { strict, lenient }
    }

    /// Rewrite `request.graph` according to `request.instruction`.
    #[instrument(
        skip(self, request),
        fields(
            subsystem = "api",
            component = "graph_mutation",
            op = "mutate",
            node_count = request.graph.nodes.len(),
            edge_count = request.graph.edges.len(),
            stage = Empty,
            duration_ms = Empty,
        )
    )]
    pub async fn mutate(&self, request: &MutationRequest) -> Result<MutationOutcome> {
        if request.instruction.trim().is_empty() {
            return Err(Error::InvalidInput("instruction must not be empty".into()));
        }
        trace!(canonical = %canonicalize_graph(&request.graph), "Mutation input");

        let start = Instant::now();
        let prompt = mutation_prompt(request)?;

        let outcome = match self.attempt(&self.strict, &prompt, request).await {
            Ok(outcome) => Ok(outcome),
            Err(strict_err) if strict_err.allows_fallback() => {
                warn!(
                    error = %strict_err,
                    lenient_model = %self.lenient.profile.model,
                    "Strict mutation stage failed, falling back to lenient stage"
                );
                self.attempt(&self.lenient, &prompt, request)
                    .await
                    .map_err(|lenient_err| {
                        Error::Upstream(format!(
                            "strict stage: {}; lenient stage: {}",
                            strict_err, lenient_err
                        ))
                    })
            }
            Err(strict_err) => Err(strict_err),
        };

        let span = Span::current();
        span.record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        match &outcome {
            Ok(outcome) => {
                span.record(logging::STAGE, outcome.mode.as_str());
                info!(
                    nodes_out = outcome.graph.nodes.len(),
                    edges_out = outcome.graph.edges.len(),
                    warnings = outcome.warnings.len(),
                    "Graph mutation complete"
                );
            }
            Err(e) => warn!(error = %e, "Graph mutation failed"),
        }
        outcome
    }

    async fn attempt(
        &self,
        stage: &Stage,
        prompt: &Prompt,
        request: &MutationRequest,
    ) -> Result<MutationOutcome> {
        let object = stage.run(prompt).await?;
        let graph = graph_from_output(object)?;
        let report = validate_mutation(&request.graph, &request.instruction, &graph)?;

        debug!(
            mode = %stage.profile.mode,
            removed = report.removed_node_ids.len(),
            added = report.added_node_ids.len(),
            "Mutation output validated"
        );
        for warning in &report.warnings {
            warn!(%warning, "Mutation output flagged");
        }

        Ok(MutationOutcome {
            graph,
            warnings: report.warnings,
            mode: stage.profile.mode,
        })
    }
}

/// Decode the model's object as a graph, bare or wrapped in `{"graph": ...}`.
fn graph_from_output(mut object: Map<String, JsonValue>) -> Result<Graph> {
    if !object.contains_key("nodes") {
        if let Some(JsonValue::Object(inner)) = object.remove("graph") {
            object = inner;
        }
    }
    let raw = JsonValue::Object(object);
    if !raw.get("nodes").map(JsonValue::is_array).unwrap_or(false) {
        return Err(Error::parse(
            "model output has no \"nodes\" array",
            raw.to_string(),
        ));
    }
    serde_json::from_value::<Graph>(raw.clone())
        .map_err(|e| Error::parse(format!("model output is not a valid graph: {}", e), raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_bare_graph() {
        let graph = graph_from_output(object(json!({
            "nodes": [{"id": "1", "type": "default", "position": {"x": 1, "y": 2}, "data": {}}],
            "edges": []
        })))
        .unwrap();
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn test_wrapped_graph() {
        let graph = graph_from_output(object(json!({
            "graph": {"nodes": [{"id": "1"}], "edges": []}
        })))
        .unwrap();
        assert_eq!(graph.nodes[0].id, "1");
    }

    #[test]
    fn test_missing_nodes_is_parse_error() {
        let err = graph_from_output(object(json!({"error": "cannot comply"}))).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = graph_from_output(object(json!({"nodes": [{"label": "no id"}]}))).unwrap_err();
        match err {
            Error::Parse { message, raw } => {
                assert!(message.contains("not a valid graph"));
                assert!(raw.contains("no id"));
            }
            other => panic!("Expected Parse, got {:?}", other),
        }
    }
}
