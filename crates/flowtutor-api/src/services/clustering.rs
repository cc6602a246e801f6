//! Comment clustering: items in, named themes covering every item once out.
//!
//! Requests are canonicalized and looked up in the response cache. On a miss
//! a single strict-mode invocation runs; there is no lenient fallback, the
//! caller retries. Only validated results are cached.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, field::Empty, info, instrument, warn, Span};

use flowtutor_core::{
    cache_key, canonicalize_cluster_request, logging, validate_clustering, ClusterItem,
    ClusterRequest, ClusterResult, Error, Result, Theme, ThemeAssignment, ValidationWarning,
};
use flowtutor_inference::{cluster_prompt, Stage};

use super::response_cache::ResponseCache;

/// Keys accepted for a theme's list of item ids.
const ID_LIST_KEYS: &[&str] = &["item_ids", "itemIds", "commentIds", "comment_ids", "ids"];
/// Keys accepted for a theme's list of items.
const ITEM_LIST_KEYS: &[&str] = &["items", "comments"];
/// Keys accepted for a theme's name.
const NAME_KEYS: &[&str] = &["name", "theme", "title"];

/// A clustering answer, fresh or cached.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    pub result: Arc<ClusterResult>,
    pub cache_hit: bool,
    /// Advisory findings; empty on cache hits.
    pub warnings: Vec<ValidationWarning>,
}

/// Orchestrates cache lookup, invocation and validation for clustering.
#[derive(Clone)]
pub struct ClusteringService {
    stage: Stage,
    cache: ResponseCache<ClusterResult>,
}

impl ClusteringService {
    pub fn new(stage: Stage, cache: ResponseCache<ClusterResult>) -> Self {
        Self { stage, cache }
    }

    pub fn cache(&self) -> &ResponseCache<ClusterResult> {
        &self.cache
    }

    /// Partition `request.items` into themes.
    #[instrument(
        skip(self, request),
        fields(
            subsystem = "api",
            component = "clustering",
            op = "cluster",
            item_count = request.items.len(),
            flow_id = %request.partition,
            cache_key = Empty,
            cache_hit = Empty,
            theme_count = Empty,
            duration_ms = Empty,
        )
    )]
    pub async fn cluster(&self, request: &ClusterRequest) -> Result<ClusterOutcome> {
        check_items(&request.items)?;

        let span = Span::current();
        let start = Instant::now();
        let key = cache_key(&canonicalize_cluster_request(request));
        span.record(logging::CACHE_KEY, key.as_str());

        if let Some(entry) = self.cache.get(&key).await {
            span.record(logging::CACHE_HIT, true);
            span.record(logging::THEME_COUNT, entry.payload.themes.len());
            info!("Clustering served from cache");
            return Ok(ClusterOutcome {
                result: entry.payload,
                cache_hit: true,
                warnings: Vec::new(),
            });
        }
        span.record(logging::CACHE_HIT, false);

        let prompt = cluster_prompt(request)?;
        let object = self.stage.run(&prompt).await?;
        let assignments = assignments_from_output(&object)?;
        let report = validate_clustering(&request.items, &assignments)?;
        for warning in &report.warnings {
            warn!(%warning, "Clustering output flagged");
        }

        let result = hydrate(&request.items, assignments);
        span.record(logging::THEME_COUNT, result.themes.len());
        let result = self.cache.put(key, result).await;

        span.record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        info!("Clustering complete");
        Ok(ClusterOutcome {
            result,
            cache_hit: false,
            warnings: report.warnings,
        })
    }
}

fn check_items(items: &[ClusterItem]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::InvalidInput("no items to cluster".into()));
    }
    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = items
        .iter()
        .filter(|item| !seen.insert(item.id.as_str()))
        .map(|item| item.id.as_str())
        .collect();
    if !duplicates.is_empty() {
        duplicates.sort_unstable();
        duplicates.dedup();
        return Err(Error::InvalidInput(format!(
            "duplicate item ids: {}",
            duplicates.join(", ")
        )));
    }
    Ok(())
}

fn id_of(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Object(map) => map.get("id").and_then(id_of),
        _ => None,
    }
}

fn first_of<'a>(theme: &'a Map<String, JsonValue>, keys: &[&str]) -> Option<&'a JsonValue> {
    keys.iter().find_map(|key| theme.get(*key))
}

/// Read `{"themes": [{"name", "item_ids"}]}` from model output.
///
/// Themes with no items are dropped.
fn assignments_from_output(object: &Map<String, JsonValue>) -> Result<Vec<ThemeAssignment>> {
    let raw = || JsonValue::Object(object.clone()).to_string();
    let themes = object
        .get("themes")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| Error::parse("model output has no \"themes\" array", raw()))?;

    let mut assignments = Vec::with_capacity(themes.len());
    for (index, theme) in themes.iter().enumerate() {
        let theme = theme
            .as_object()
            .ok_or_else(|| Error::parse(format!("theme {} is not an object", index), raw()))?;
        let name = first_of(theme, NAME_KEYS)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let entries = first_of(theme, ID_LIST_KEYS)
            .or_else(|| first_of(theme, ITEM_LIST_KEYS))
            .and_then(JsonValue::as_array)
            .ok_or_else(|| {
                Error::parse(format!("theme {} ({:?}) lists no item ids", index, name), raw())
            })?;
        let item_ids = entries
            .iter()
            .map(|entry| {
                id_of(entry).ok_or_else(|| {
                    Error::parse(
                        format!("theme {} ({:?}) has an item without an id", index, name),
                        raw(),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if item_ids.is_empty() {
            debug!(theme = %name, "Dropping empty theme");
            continue;
        }
        assignments.push(ThemeAssignment { name, item_ids });
    }
    Ok(assignments)
}

/// Replace ids with the submitted items so the model never supplies item text.
fn hydrate(items: &[ClusterItem], assignments: Vec<ThemeAssignment>) -> ClusterResult {
    let by_id: HashMap<&str, &ClusterItem> = items.iter().map(|i| (i.id.as_str(), i)).collect();
    let themes = assignments
        .into_iter()
        .map(|assignment| Theme {
            name: assignment.name,
            items: assignment
                .item_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|item| (*item).clone()))
                .collect(),
        })
        .collect();
    ClusterResult { themes }
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

    fn item(id: &str) -> ClusterItem {
        ClusterItem {
            id: id.to_string(),
            text: format!("comment {}", id),
            tag: "note".to_string(),
            labels: vec!["l".to_string()],
        }
    }

    #[test]
    fn test_item_ids_and_aliases() {
        let assignments = assignments_from_output(&object(json!({
            "themes": [
                {"name": "Clarity", "item_ids": ["1", 2]},
                {"name": "Pacing", "itemIds": ["3"]},
                {"name": "Layout", "commentIds": ["4"]},
                {"title": "Misc", "items": [{"id": "5", "text": "ignored"}, "6"]}
            ]
        })))
        .unwrap();

        let ids: Vec<Vec<String>> = assignments.iter().map(|a| a.item_ids.clone()).collect();
        assert_eq!(
            ids,
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string()],
                vec!["4".to_string()],
                vec!["5".to_string(), "6".to_string()],
            ]
        );
        assert_eq!(assignments[3].name, "Misc");
    }

    #[test]
    fn test_empty_themes_dropped() {
        let assignments = assignments_from_output(&object(json!({
            "themes": [{"name": "Empty", "item_ids": []}, {"name": "Full", "item_ids": ["1"]}]
        })))
        .unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].name, "Full");
    }

    #[test]
    fn test_missing_themes_is_parse_error() {
        let err = assignments_from_output(&object(json!({"groups": []}))).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_theme_without_ids_is_parse_error() {
        let err = assignments_from_output(&object(json!({"themes": [{"name": "X"}]}))).unwrap_err();
        assert!(matches!(err, Error::Parse { ref message, .. } if message.contains("no item ids")));
    }

    #[test]
    fn test_hydrate_uses_submitted_items() {
        let items = vec![item("1"), item("2")];
        let result = hydrate(
            &items,
            vec![ThemeAssignment {
                name: "All".to_string(),
                item_ids: vec!["2".to_string(), "1".to_string()],
            }],
        );
        assert_eq!(result.themes[0].items, vec![item("2"), item("1")]);
    }

    #[test]
    fn test_check_items() {
        assert!(matches!(check_items(&[]), Err(Error::InvalidInput(_))));
        assert!(check_items(&[item("1"), item("2")]).is_ok());
        let err = check_items(&[item("1"), item("2"), item("1")]).unwrap_err();
        assert!(err.to_string().contains("duplicate item ids: 1"));
    }
}
