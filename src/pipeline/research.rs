//! Research stage: seed topic in, candidate subtopics out.
//!
//! Asks the generation service for newsworthy subtopics with web search
//! enabled, then recovers up to [`MAX_RESEARCH_ITEMS`] entries from whatever
//! shape comes back: a JSON array when the model followed instructions, a
//! prose numbered list when it did not. A gateway failure yields an empty
//! candidate set and the run continues.

use crate::extract::{extract_json_array, first_url, parse_numbered_list};
use crate::generate::{GenerationClient, GenerationRequest};
use crate::pipeline::{
    PipelineState, ResearchItem, Stage, StageError, StagePatch, MAX_RESEARCH_ITEMS,
};
use chrono::{Datelike, Utc};
use serde_json::Value;

const RESEARCH_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/research.md"
));

pub(crate) struct Research;

impl Stage for Research {
    fn name(&self) -> &'static str {
        "research"
    }

    fn run(
        &self,
        state: &PipelineState,
        client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError> {
        let prompt = RESEARCH_PROMPT
            .replace("{topic}", &state.topic)
            .replace("{year}", &Utc::now().year().to_string())
            .replace("{max_items}", &MAX_RESEARCH_ITEMS.to_string());

        let generation = client
            .generate(&GenerationRequest::new(prompt, true))
            .map_err(|error| StageError {
                stage: self.name(),
                error,
            })?;

        let items = parse_research_items(&generation.text);
        tracing::info!(count = items.len(), "research candidates recovered");
        Ok(StagePatch {
            research_items: Some(items),
            ..StagePatch::default()
        })
    }
}

/// Recover up to five research items from response text.
fn parse_research_items(text: &str) -> Vec<ResearchItem> {
    let sliced = extract_json_array(text);
    if let Ok(values) = serde_json::from_str::<Vec<Value>>(sliced) {
        let items: Vec<ResearchItem> = values
            .iter()
            .filter_map(entry_to_item)
            .take(MAX_RESEARCH_ITEMS)
            .collect();
        if !items.is_empty() {
            return items;
        }
    }

    parse_numbered_list(text)
        .into_iter()
        .map(|entry| ResearchItem {
            title: entry.title,
            details: entry.details,
            source_url: entry.url,
        })
        .take(MAX_RESEARCH_ITEMS)
        .collect()
}

/// Map one JSON entry to a research item, tolerating loose field names.
///
/// The source field is URL-scrubbed rather than trusted: whatever the model
/// put there, only an embedded `http(s)` URL survives.
fn entry_to_item(value: &Value) -> Option<ResearchItem> {
    if let Some(title) = value.as_str() {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        return Some(ResearchItem {
            title: title.to_string(),
            details: String::new(),
            source_url: None,
        });
    }

    let object = value.as_object()?;
    let title = ["title", "topic", "headline"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|title| !title.is_empty())?
        .to_string();
    let details = ["details", "summary", "description"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or("")
        .trim()
        .to_string();
    let source_url = ["source", "url", "source_url", "link"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .and_then(first_url);

    Some(ResearchItem {
        title,
        details,
        source_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json_array() {
        let text = "```json\n[\n  {\"title\": \"A\", \"details\": \"d\", \"source\": \"https://a.example/x\"},\n  {\"title\": \"B\", \"summary\": \"s\"}\n]\n```";
        let items = parse_research_items(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_url.as_deref(), Some("https://a.example/x"));
        assert_eq!(items[1].details, "s");
    }

    #[test]
    fn test_parse_caps_at_five() {
        let entries: Vec<String> = (0..8)
            .map(|i| format!("{{\"title\": \"Item {i}\"}}"))
            .collect();
        let text = format!("[{}]", entries.join(","));
        assert_eq!(parse_research_items(&text).len(), MAX_RESEARCH_ITEMS);
    }

    #[test]
    fn test_parse_string_entries() {
        let items = parse_research_items(r#"["first topic", "", "second topic"]"#);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "first topic");
    }

    #[test]
    fn test_parse_falls_back_to_numbered_list() {
        let text = "Here's what I found:\n1. \"Topic A\" - details here\n2. \"Topic B\" - more details https://b.example/y";
        let items = parse_research_items(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].source_url.as_deref(), Some("https://b.example/y"));
    }

    #[test]
    fn test_parse_garbage_yields_empty() {
        assert!(parse_research_items("complete nonsense").is_empty());
    }

    #[test]
    fn test_source_field_is_url_scrubbed() {
        let text = r#"[{"title": "A", "source": "see https://a.example/story for more"}]"#;
        let items = parse_research_items(text);
        assert_eq!(
            items[0].source_url.as_deref(),
            Some("https://a.example/story")
        );
    }
}
