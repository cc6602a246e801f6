//! Deterministic serialization of request payloads.
//!
//! Two requests with the same semantic content produce the same canonical
//! string regardless of the order items arrived in. The clustering canonical
//! form doubles as the item ordering shown to the model.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::defaults::CACHE_KEY_PREFIX;
use crate::models::{ClusterItem, ClusterRequest, Graph};

/// Projection of a cluster item onto the fields that affect clustering.
#[derive(Serialize)]
struct CanonicalItem<'a> {
    id: &'a str,
    text: &'a str,
    tag: &'a str,
    labels: &'a [String],
}

#[derive(Serialize)]
struct CanonicalClusterRequest<'a> {
    partition: &'a str,
    items: Vec<CanonicalItem<'a>>,
}

/// Items sorted by id ascending.
pub fn sorted_items(items: &[ClusterItem]) -> Vec<&ClusterItem> {
    let mut sorted: Vec<&ClusterItem> = items.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));
    sorted
}

/// Canonical string for a clustering request.
///
/// Struct fields serialize in declaration order, so the output is stable.
pub fn canonicalize_cluster_request(request: &ClusterRequest) -> String {
    let canonical = CanonicalClusterRequest {
        partition: &request.partition,
        items: sorted_items(&request.items)
            .into_iter()
            .map(|item| CanonicalItem {
                id: &item.id,
                text: &item.text,
                tag: &item.tag,
                labels: &item.labels,
            })
            .collect(),
    };
    // Serializing borrowed strings and string slices cannot fail.
    serde_json::to_string(&canonical).unwrap_or_default()
}

/// Canonical string for a graph, nodes and edges sorted by id.
///
/// Used for logging and debugging only; mutations are never cached.
pub fn canonicalize_graph(graph: &Graph) -> String {
    let mut sorted = graph.clone();
    sorted.nodes.sort_by(|a, b| a.id.cmp(&b.id));
    sorted.edges.sort_by(|a, b| a.id.cmp(&b.id));
    serde_json::to_string(&sorted).unwrap_or_default()
}

/// Hash a canonical string into a fixed-length cache key.
pub fn cache_key(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());
    format!("{}{}", CACHE_KEY_PREFIX, &hash[..32])
}
