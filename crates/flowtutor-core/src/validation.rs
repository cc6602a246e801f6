//! Postcondition checks on parsed model output.
//!
//! Hard violations become [`Error::InvariantViolation`] with the offending
//! ids spelled out. Soft findings are returned as [`ValidationWarning`]s for
//! the caller to log or surface; they never reject a result.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::defaults::THEME_NAME_MAX_WORDS;
use crate::error::{Error, Result};
use crate::models::{ClusterItem, Graph};

/// Advisory finding that does not reject a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Nodes disappeared although the instruction shows no removal intent.
    UnrequestedRemoval { node_ids: Vec<String> },
    /// Theme count outside the band suggested to the model.
    ThemeCountOutsideRange { count: usize, min: usize, max: usize },
    /// Theme name longer than the suggested word limit.
    LongThemeName { name: String, words: usize },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrequestedRemoval { node_ids } => write!(
                f,
                "nodes removed without a removal instruction: {}",
                node_ids.join(", ")
            ),
            Self::ThemeCountOutsideRange { count, min, max } => write!(
                f,
                "{} themes produced, expected between {} and {}",
                count, min, max
            ),
            Self::LongThemeName { name, words } => {
                write!(f, "theme name '{}' has {} words", name, words)
            }
        }
    }
}

// =============================================================================
// GRAPH MUTATION
// =============================================================================

/// Outcome of a successful mutation check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Input node ids missing from the output, sorted.
    pub removed_node_ids: Vec<String>,
    /// Output node ids absent from the input, sorted.
    pub added_node_ids: Vec<String>,
    pub warnings: Vec<ValidationWarning>,
}

/// Verb forms that ask for something to go away on their own.
const REMOVAL_WORDS: &[&str] = &[
    "remove", "removes", "removed", "removing", "removal",
    "delete", "deletes", "deleted", "deleting", "deletion",
    "drop", "drops", "dropped", "dropping",
    "erase", "erases", "erased", "erasing",
    "eliminate", "eliminates", "eliminated", "eliminating",
    "discard", "discards", "discarded", "discarding",
    "prune", "prunes", "pruned", "pruning",
];

/// Verb forms that only imply removal when applied to flow elements.
const RESTRUCTURE_WORDS: &[&str] = &[
    "merge", "merges", "merged", "merging",
    "combine", "combines", "combined", "combining",
    "consolidate", "consolidates", "consolidated", "consolidating",
    "collapse", "collapses", "collapsed", "collapsing",
    "replace", "replaces", "replaced", "replacing",
    "clear", "simplify", "simplifies", "simplified", "simplifying",
];

const ELEMENT_WORDS: &[&str] = &[
    "node", "nodes", "step", "steps", "box", "boxes", "stage", "stages",
    "block", "blocks", "branch", "branches", "decision", "decisions",
    "task", "tasks", "flow", "flowchart", "graph", "diagram", "everything",
];

const REMOVAL_PHRASES: &[&str] = &["get rid of", "clear out", "take out", "cut out"];

/// Whether the instruction plausibly asks for nodes to go away.
pub fn instruction_requests_removal(instruction: &str) -> bool {
    let lower = instruction.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect();

    let normalized = words.join(" ");
    if REMOVAL_PHRASES.iter().any(|phrase| {
        normalized == *phrase
            || normalized.starts_with(&format!("{} ", phrase))
            || normalized.contains(&format!(" {} ", phrase))
            || normalized.ends_with(&format!(" {}", phrase))
    }) {
        return true;
    }

    contains_any(&words, REMOVAL_WORDS)
        || (contains_any(&words, RESTRUCTURE_WORDS) && contains_any(&words, ELEMENT_WORDS))
}

fn contains_any<'a>(words: &[&'a str], list: &[&'a str]) -> bool {
    words.iter().any(|w| list.contains(w))
}

/// Check a mutated graph against the graph it was derived from.
///
/// Rejects duplicate node or edge ids and edges whose endpoints do not exist.
/// Node removals are reported; removals the instruction did not ask for are
/// flagged with [`ValidationWarning::UnrequestedRemoval`].
pub fn validate_mutation(input: &Graph, instruction: &str, output: &Graph) -> Result<MutationReport> {
    let mut violations = Vec::new();

    let mut output_ids = HashSet::new();
    for node in &output.nodes {
        if node.id.is_empty() {
            violations.push("node with empty id".to_string());
        } else if !output_ids.insert(node.id.as_str()) {
            violations.push(format!("duplicate node id '{}'", node.id));
        }
    }

    let mut edge_ids = HashSet::new();
    for edge in &output.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            violations.push(format!("duplicate edge id '{}'", edge.id));
        }
        if !output_ids.contains(edge.source.as_str()) {
            violations.push(format!(
                "edge '{}' references missing source node '{}'",
                edge.id, edge.source
            ));
        }
        if !output_ids.contains(edge.target.as_str()) {
            violations.push(format!(
                "edge '{}' references missing target node '{}'",
                edge.id, edge.target
            ));
        }
    }

    if !violations.is_empty() {
        return Err(Error::InvariantViolation(violations.join("; ")));
    }

    let input_ids = input.node_ids();
    let mut removed_node_ids: Vec<String> = input_ids
        .difference(&output_ids)
        .map(|id| id.to_string())
        .collect();
    removed_node_ids.sort();
    let mut added_node_ids: Vec<String> = output_ids
        .difference(&input_ids)
        .map(|id| id.to_string())
        .collect();
    added_node_ids.sort();

    let mut warnings = Vec::new();
    if !removed_node_ids.is_empty() && !instruction_requests_removal(instruction) {
        warnings.push(ValidationWarning::UnrequestedRemoval {
            node_ids: removed_node_ids.clone(),
        });
    }

    Ok(MutationReport {
        removed_node_ids,
        added_node_ids,
        warnings,
    })
}

// =============================================================================
// CLUSTERING
// =============================================================================

/// A theme as returned by the model: a name plus the ids it claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeAssignment {
    pub name: String,
    pub item_ids: Vec<String>,
}

/// Outcome of a successful clustering check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterReport {
    pub warnings: Vec<ValidationWarning>,
}

/// Theme count band suggested to the model for `item_count` items.
///
/// The upper bound never exceeds the number of items.
pub fn advisory_theme_range(item_count: usize) -> (usize, usize) {
    let (min, max) = match item_count {
        0 => (0, 0),
        1..=2 => (1, item_count),
        3..=9 => (3, 5),
        10..=20 => (5, 8),
        _ => (8, 15),
    };
    (min, max.min(item_count))
}

/// Check that the themes partition the input items exactly.
///
/// Every input id must appear in exactly one theme and no theme may claim an
/// id that was not submitted. Theme count and name length are advisory.
pub fn validate_clustering(
    items: &[ClusterItem],
    assignments: &[ThemeAssignment],
) -> Result<ClusterReport> {
    let input_ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut unknown = Vec::new();
    let mut violations = Vec::new();

    for assignment in assignments {
        if assignment.name.trim().is_empty() {
            violations.push("theme with empty name".to_string());
        }
        for id in &assignment.item_ids {
            if input_ids.contains(id.as_str()) {
                *seen.entry(id.as_str()).or_insert(0) += 1;
            } else {
                unknown.push(id.clone());
            }
        }
    }

    let mut missing: Vec<&str> = input_ids
        .iter()
        .filter(|id| !seen.contains_key(*id))
        .copied()
        .collect();
    missing.sort_unstable();
    let mut duplicated: Vec<&str> = seen
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(id, _)| *id)
        .collect();
    duplicated.sort_unstable();
    unknown.sort();
    unknown.dedup();

    if !missing.is_empty() {
        violations.push(format!("ids missing from every theme: {}", missing.join(", ")));
    }
    if !duplicated.is_empty() {
        violations.push(format!(
            "ids assigned more than once: {}",
            duplicated.join(", ")
        ));
    }
    if !unknown.is_empty() {
        violations.push(format!("ids not in the input: {}", unknown.join(", ")));
    }

    if !violations.is_empty() {
        return Err(Error::InvariantViolation(violations.join("; ")));
    }

    let mut warnings = Vec::new();
    let (min, max) = advisory_theme_range(items.len());
    let count = assignments.len();
    if count < min || count > max {
        warnings.push(ValidationWarning::ThemeCountOutsideRange { count, min, max });
    }
    for assignment in assignments {
        let words = assignment.name.split_whitespace().count();
        if words > THEME_NAME_MAX_WORDS {
            warnings.push(ValidationWarning::LongThemeName {
                name: assignment.name.clone(),
                words,
            });
        }
    }

    Ok(ClusterReport { warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(value: serde_json::Value) -> Graph {
        serde_json::from_value(value).unwrap()
    }

    fn items(ids: &[&str]) -> Vec<ClusterItem> {
        ids.iter()
            .map(|id| ClusterItem {
                id: id.to_string(),
                text: format!("comment {}", id),
                tag: String::new(),
                labels: vec![],
            })
            .collect()
    }

    fn theme(name: &str, ids: &[&str]) -> ThemeAssignment {
        ThemeAssignment {
            name: name.to_string(),
            item_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_mutation_accepts_added_nodes() {
        let input = graph(json!({"nodes": [{"id": "1"}], "edges": []}));
        let output = graph(json!({
            "nodes": [{"id": "1"}, {"id": "2"}],
            "edges": [{"id": "e1-2", "source": "1", "target": "2"}]
        }));
        let report = validate_mutation(&input, "add a step after start", &output).unwrap();
        assert_eq!(report.added_node_ids, vec!["2"]);
        assert!(report.removed_node_ids.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_mutation_rejects_dangling_edge() {
        let input = graph(json!({"nodes": [{"id": "1"}], "edges": []}));
        let output = graph(json!({
            "nodes": [{"id": "1"}],
            "edges": [{"id": "e1-9", "source": "1", "target": "9"}]
        }));
        let err = validate_mutation(&input, "connect", &output).unwrap_err();
        match err {
            Error::InvariantViolation(msg) => {
                assert!(msg.contains("e1-9"));
                assert!(msg.contains("missing target node '9'"));
            }
            other => panic!("Expected InvariantViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_mutation_rejects_duplicate_ids() {
        let input = graph(json!({"nodes": [{"id": "1"}], "edges": []}));
        let output = graph(json!({
            "nodes": [{"id": "1"}, {"id": "1"}],
            "edges": [
                {"id": "e", "source": "1", "target": "1"},
                {"id": "e", "source": "1", "target": "1"}
            ]
        }));
        let msg = validate_mutation(&input, "x", &output)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("duplicate node id '1'"));
        assert!(msg.contains("duplicate edge id 'e'"));
    }

    #[test]
    fn test_unrequested_removal_is_flagged_not_rejected() {
        let input = graph(json!({"nodes": [{"id": "1"}, {"id": "2"}], "edges": []}));
        let output = graph(json!({"nodes": [{"id": "1"}], "edges": []}));
        let report = validate_mutation(&input, "rename the first node", &output).unwrap();
        assert_eq!(report.removed_node_ids, vec!["2"]);
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::UnrequestedRemoval {
                node_ids: vec!["2".to_string()]
            }]
        );
    }

    #[test]
    fn test_requested_removal_is_not_flagged() {
        let input = graph(json!({"nodes": [{"id": "1"}, {"id": "2"}], "edges": []}));
        let output = graph(json!({"nodes": [{"id": "1"}], "edges": []}));
        let report = validate_mutation(&input, "Delete the second node", &output).unwrap();
        assert_eq!(report.removed_node_ids, vec!["2"]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_instruction_requests_removal() {
        assert!(instruction_requests_removal("please remove node B"));
        assert!(instruction_requests_removal("Delete the second node"));
        assert!(instruction_requests_removal("Merge the two review steps"));
        assert!(instruction_requests_removal("get rid of the loop"));
        assert!(instruction_requests_removal("Get rid of it"));
        assert!(instruction_requests_removal("drop the last stage"));
        assert!(instruction_requests_removal("clear out the error branch"));
        assert!(instruction_requests_removal("simplify the flow"));
        assert!(!instruction_requests_removal(
            "rename the start node to Begin"
        ));
        assert!(!instruction_requests_removal("add a decision node"));
    }

    #[test]
    fn test_instruction_removal_ignores_word_prefixes_and_styling() {
        assert!(!instruction_requests_removal("make the labels clearer"));
        assert!(!instruction_requests_removal("add a dropdown step"));
        assert!(!instruction_requests_removal("combine colors for readability"));
        assert!(!instruction_requests_removal("make the title text clear"));
        assert!(!instruction_requests_removal("the getter ridges look odd"));
    }

    #[test]
    fn test_advisory_theme_range() {
        assert_eq!(advisory_theme_range(0), (0, 0));
        assert_eq!(advisory_theme_range(2), (1, 2));
        assert_eq!(advisory_theme_range(3), (3, 3));
        assert_eq!(advisory_theme_range(5), (3, 5));
        assert_eq!(advisory_theme_range(9), (3, 5));
        assert_eq!(advisory_theme_range(10), (5, 8));
        assert_eq!(advisory_theme_range(20), (5, 8));
        assert_eq!(advisory_theme_range(21), (8, 15));
    }

    #[test]
    fn test_clustering_exact_partition_passes() {
        let input = items(&["a", "b", "c", "d", "e"]);
        let themes = vec![
            theme("Pacing", &["a", "b"]),
            theme("Clarity", &["c"]),
            theme("Examples", &["d", "e"]),
        ];
        let report = validate_clustering(&input, &themes).unwrap();
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_clustering_reports_missing_duplicate_and_unknown() {
        let input = items(&["a", "b", "c"]);
        let themes = vec![theme("One", &["a", "b"]), theme("Two", &["b", "z"])];
        let msg = validate_clustering(&input, &themes)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("ids missing from every theme: c"));
        assert!(msg.contains("ids assigned more than once: b"));
        assert!(msg.contains("ids not in the input: z"));
    }

    #[test]
    fn test_clustering_rejects_duplicate_within_theme() {
        let input = items(&["a"]);
        let themes = vec![theme("Solo", &["a", "a"])];
        assert!(matches!(
            validate_clustering(&input, &themes),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_clustering_rejects_empty_theme_name() {
        let input = items(&["a"]);
        let themes = vec![theme("  ", &["a"])];
        let msg = validate_clustering(&input, &themes)
            .unwrap_err()
            .to_string();
        assert!(msg.contains("empty name"));
    }

    #[test]
    fn test_clustering_out_of_band_count_is_advisory() {
        let input = items(&["a", "b", "c", "d", "e"]);
        let themes = vec![theme("Everything Else Entirely", &["a", "b", "c", "d", "e"])];
        let report = validate_clustering(&input, &themes).unwrap();
        assert!(report
            .warnings
            .contains(&ValidationWarning::ThemeCountOutsideRange {
                count: 1,
                min: 3,
                max: 5
            }));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, ValidationWarning::LongThemeName { words: 3, .. })));
    }
}
