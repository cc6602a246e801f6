//! Recovery of a JSON object from raw model output.
//!
//! Models in structured-output mode normally return bare JSON. Plain
//! completion models wrap it in markdown fences or prose. Strategies are
//! tried in a fixed order and the first that yields a JSON object wins:
//!
//! 1. parse the whole text
//! 2. parse the interior of a fenced block (```` ```json ... ``` ````)
//! 3. parse the span from the first `{` to the last `}`

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, trace};

use flowtutor_core::{Error, Result};

/// Strategy that recovered the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    Direct,
    FencedBlock,
    BraceSpan,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::FencedBlock => write!(f, "fenced_block"),
            Self::BraceSpan => write!(f, "brace_span"),
        }
    }
}

/// A JSON object recovered from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub object: Map<String, JsonValue>,
    pub strategy: ExtractionStrategy,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        // Lazy interior so the first closing fence ends the block.
        Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fence regex is valid")
    })
}

fn parse_object(candidate: &str) -> Option<Map<String, JsonValue>> {
    match serde_json::from_str::<JsonValue>(candidate.trim()) {
        Ok(JsonValue::Object(object)) => Some(object),
        _ => None,
    }
}

fn fenced_block(raw: &str) -> Option<Map<String, JsonValue>> {
    fence_regex()
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .find_map(|interior| parse_object(interior.as_str()))
}

fn brace_span(raw: &str) -> Option<Map<String, JsonValue>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&raw[start..=end])
}

/// Recover a JSON object from raw model text.
///
/// Fails with [`Error::Parse`] carrying the raw text when every strategy
/// fails.
pub fn extract_json(raw: &str) -> Result<Extracted> {
    trace!(raw = %raw, "Extracting JSON from model output");

    let attempts: [(ExtractionStrategy, fn(&str) -> Option<Map<String, JsonValue>>); 3] = [
        (ExtractionStrategy::Direct, parse_object),
        (ExtractionStrategy::FencedBlock, fenced_block),
        (ExtractionStrategy::BraceSpan, brace_span),
    ];

    for (strategy, attempt) in attempts {
        if let Some(object) = attempt(raw) {
            debug!(%strategy, "Recovered JSON object from model output");
            return Ok(Extracted { object, strategy });
        }
    }

    Err(Error::parse(
        format!(
            "no JSON object found in model output ({} bytes)",
            raw.len()
        ),
        raw,
    ))
}
