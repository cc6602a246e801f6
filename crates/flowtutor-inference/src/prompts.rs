//! Prompt builders for graph mutation and comment clustering.

use serde_json::json;

use flowtutor_core::canonical::sorted_items;
use flowtutor_core::defaults::THEME_NAME_MAX_WORDS;
use flowtutor_core::{advisory_theme_range, ClusterRequest, MutationRequest, Result};

use crate::pipeline::Prompt;

const MUTATION_SYSTEM: &str = r#"You edit flowcharts for an educational diagram editor.
You receive a graph as JSON with "nodes" and "edges" plus an instruction.
Respond with a single JSON object of the form {"nodes": [...], "edges": [...]} containing the complete updated graph.

Rules:
- Keep the id, type, position and every other field of nodes you do not need to change.
- Only remove nodes when the instruction asks for it.
- New nodes and edges need ids that are unique within the graph.
- Every edge "source" and "target" must be the id of a node in your output.
- Output JSON only, no commentary."#;

/// Build the prompt asking the model to rewrite `request.graph`.
pub fn mutation_prompt(request: &MutationRequest) -> Result<Prompt> {
    let graph = serde_json::to_string_pretty(&request.graph)?;
    let user = format!(
        r#"Current graph:
{graph}

Instruction:
{instruction}

Return the full updated graph as JSON."#,
        instruction = request.instruction.trim(),
    );
    Ok(Prompt::new(MUTATION_SYSTEM, user))
}

/// Build the prompt asking the model to group `request.items` into themes.
///
/// Items are listed in id order so permutations of the same request produce
/// the same prompt. The suggested theme count comes from
/// [`advisory_theme_range`].
pub fn cluster_prompt(request: &ClusterRequest) -> Result<Prompt> {
    let items: Vec<_> = sorted_items(&request.items)
        .into_iter()
        .map(|item| {
            json!({
                "id": item.id,
                "text": item.text,
                "tag": item.tag,
                "labels": item.labels,
            })
        })
        .collect();
    let listing = serde_json::to_string_pretty(&items)?;
    let (min, max) = advisory_theme_range(request.items.len());
    let band = if min == max {
        format!("{}", min)
    } else {
        format!("{} to {}", min, max)
    };

    let system = format!(
        r#"You group student comments on a flowchart into themes.
Respond with a single JSON object of the form
{{"themes": [{{"name": "Theme Name", "item_ids": ["id", ...]}}]}}

Rules:
- Every comment id appears in exactly one theme.
- Use only ids from the input; never invent ids.
- Theme names are {max_words} words at most.
- Output JSON only, no commentary."#,
        max_words = THEME_NAME_MAX_WORDS,
    );
    let user = format!(
        r#"Group these {count} comments into {band} themes.

Comments:
{listing}"#,
        count = request.items.len(),
    );

    Ok(Prompt::new(system, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowtutor_core::{ClusterItem, Graph};

    fn item(id: &str, text: &str) -> ClusterItem {
        ClusterItem {
            id: id.to_string(),
            text: text.to_string(),
            tag: "question".to_string(),
            labels: vec![],
        }
    }

    #[test]
    fn test_mutation_prompt_embeds_graph_and_instruction() {
        let graph: Graph = serde_json::from_value(json!({
            "nodes": [{"id": "n1", "type": "default", "position": {"x": 0, "y": 0}, "data": {"label": "Start"}}],
            "edges": []
        }))
        .unwrap();
        let prompt = mutation_prompt(&MutationRequest::new(graph, "  rename Start to Begin  ")).unwrap();

        assert!(prompt.system.contains("\"nodes\""));
        assert!(prompt.user.contains("\"n1\""));
        assert!(prompt.user.contains("rename Start to Begin\n"));
    }

    #[test]
    fn test_cluster_prompt_is_order_independent() {
        let a = ClusterRequest::new(vec![item("2", "too long"), item("1", "confusing")], "f");
        let b = ClusterRequest::new(vec![item("1", "confusing"), item("2", "too long")], "f");
        assert_eq!(cluster_prompt(&a).unwrap(), cluster_prompt(&b).unwrap());
    }

    #[test]
    fn test_cluster_prompt_states_theme_band() {
        let items = (1..=5).map(|i| item(&i.to_string(), "text")).collect();
        let prompt = cluster_prompt(&ClusterRequest::new(items, "")).unwrap();
        assert!(prompt.user.contains("5 comments into 3 to 5 themes"));
        assert!(prompt.system.contains("2 words at most"));
    }

    #[test]
    fn test_cluster_prompt_single_item() {
        let prompt = cluster_prompt(&ClusterRequest::new(vec![item("a", "x")], "")).unwrap();
        assert!(prompt.user.contains("1 comments into 1 themes"));
    }
}
