//! Data model exchanged with the flow editor and the comment board.
//!
//! Graphs follow the node/edge shape produced by the diagram editor. Fields
//! the service does not interpret are kept in a flattened `extra` map so a
//! mutation round trip leaves them untouched.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

// =============================================================================
// GRAPH
// =============================================================================

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A vertex of the flow diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique within the graph.
    pub id: String,
    /// Editor node type (e.g. "default", "input", "output").
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    /// Opaque attribute bag (label, styling, ...).
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub data: JsonValue,
    /// Editor attributes not interpreted here (width, selected, ...).
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Node {
    /// Label text from `data.label`, if present.
    pub fn label(&self) -> Option<&str> {
        self.data.get("label").and_then(JsonValue::as_str)
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Node/edge flowchart structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Set of node ids present in the graph.
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Find a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Request to rewrite a graph according to a free-text instruction.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub graph: Graph,
    /// Non-empty user instruction.
    pub instruction: String,
}

impl MutationRequest {
    pub fn new(graph: Graph, instruction: impl Into<String>) -> Self {
        Self {
            graph,
            instruction: instruction.into(),
        }
    }
}

/// Full replacement graph produced by a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub graph: Graph,
}

// =============================================================================
// CLUSTERING
// =============================================================================

/// One free-text annotation to be grouped into a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterItem {
    /// Unique id; numeric ids from the comment store are accepted and stringified.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Request to partition items into named themes.
#[derive(Debug, Clone)]
pub struct ClusterRequest {
    pub items: Vec<ClusterItem>,
    /// Caller-supplied partition (flow/session id); empty when absent.
    pub partition: String,
}

impl ClusterRequest {
    pub fn new(items: Vec<ClusterItem>, partition: impl Into<String>) -> Self {
        Self {
            items,
            partition: partition.into(),
        }
    }
}

/// A named group of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// One or two words.
    pub name: String,
    pub items: Vec<ClusterItem>,
}

/// Themes covering every input item exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub themes: Vec<Theme>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_keeps_unknown_editor_fields() {
        let raw = json!({
            "id": "1",
            "type": "input",
            "position": {"x": 10.0, "y": 20.5},
            "data": {"label": "Start"},
            "width": 150,
            "selected": false
        });

        let node: Node = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(node.node_type, "input");
        assert_eq!(node.label(), Some("Start"));
        assert_eq!(node.extra.get("width"), Some(&json!(150)));

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_node_without_data_stays_without_data() {
        let raw = json!({"id": "1", "type": "default", "position": {"x": 0.0, "y": 0.0}});

        let node: Node = serde_json::from_value(raw.clone()).unwrap();
        assert!(node.data.is_null());
        assert_eq!(node.label(), None);

        let back = serde_json::to_value(&node).unwrap();
        assert!(back.get("data").is_none());
        assert_eq!(back, raw);
    }

    #[test]
    fn test_edge_handles_are_camel_case_and_optional() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1-2",
            "source": "1",
            "target": "2",
            "sourceHandle": "a"
        }))
        .unwrap();
        assert_eq!(edge.source_handle.as_deref(), Some("a"));
        assert!(edge.target_handle.is_none());

        let back = serde_json::to_value(&edge).unwrap();
        assert_eq!(back["sourceHandle"], "a");
        assert!(back.get("targetHandle").is_none());
    }

    #[test]
    fn test_graph_defaults_missing_arrays() {
        let graph: Graph = serde_json::from_str("{}").unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_cluster_item_accepts_numeric_id() {
        let item: ClusterItem =
            serde_json::from_value(json!({"id": 42, "text": "too slow", "createdAt": "x"}))
                .unwrap();
        assert_eq!(item.id, "42");
        assert_eq!(item.tag, "");
        assert!(item.labels.is_empty());
    }

    #[test]
    fn test_cluster_item_rejects_object_id() {
        let result: std::result::Result<ClusterItem, _> =
            serde_json::from_value(json!({"id": {"nested": 1}, "text": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_node_ids() {
        let graph: Graph = serde_json::from_value(json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": []
        }))
        .unwrap();
        let ids = graph.node_ids();
        assert!(ids.contains("a") && ids.contains("b"));
        assert_eq!(graph.node("b").map(|n| n.id.as_str()), Some("b"));
    }
}
