//! Draft stage: one article body plus source list per selected item.
//!
//! Items are drafted sequentially and independently: one item's failure
//! yields a placeholder entry and never discards its siblings. Drafts and
//! source lists are appended together per item, so the two sequences stay
//! equal-length under every failure mode.

use crate::extract::{dedupe_preserve_order, extract_json_object, host_of};
use crate::generate::{GenerationClient, GenerationRequest};
use crate::pipeline::{PipelineState, ResearchItem, Stage, StageError, StagePatch};
use serde::Deserialize;
use serde_json::Value;

const DRAFT_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/draft.md"
));

pub(crate) struct Draft;

/// Expected response shape; `sources` stays dynamic because models return
/// anything from a string to an array of objects there.
#[derive(Debug, Deserialize)]
struct ParsedDraft {
    #[serde(default)]
    draft: String,
    #[serde(default)]
    sources: Value,
}

impl Stage for Draft {
    fn name(&self) -> &'static str {
        "draft"
    }

    fn run(
        &self,
        state: &PipelineState,
        client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError> {
        let mut drafts = Vec::with_capacity(state.selected_items.len());
        let mut draft_sources = Vec::with_capacity(state.selected_items.len());

        for item in &state.selected_items {
            let (body, sources) = draft_one(&state.topic, item, client);
            drafts.push(body);
            draft_sources.push(sources);
        }

        tracing::info!(count = drafts.len(), "drafts produced");
        Ok(StagePatch {
            drafts: Some((drafts, draft_sources)),
            ..StagePatch::default()
        })
    }
}

/// Draft a single item. Infallible: every failure mode maps to a usable
/// (body, sources) pair.
fn draft_one(
    topic: &str,
    item: &ResearchItem,
    client: &dyn GenerationClient,
) -> (String, Vec<String>) {
    let own_host = item.source_url.as_deref().and_then(host_of);
    let prompt = DRAFT_PROMPT
        .replace("{topic}", topic)
        .replace("{title}", &item.title)
        .replace("{details}", &item.details)
        .replace(
            "{avoid_domain}",
            own_host.as_deref().unwrap_or("the original source site"),
        );

    let generation = match client.generate(&GenerationRequest::new(prompt, true)) {
        Ok(generation) => generation,
        Err(error) => {
            tracing::warn!(item = %item.title, error = %error, "draft generation failed");
            let body = format!(
                "Draft unavailable for \"{}\": the generation service did not answer.",
                item.title
            );
            return (body, own_source_list(item));
        }
    };

    let sliced = extract_json_object(&generation.text);
    match serde_json::from_str::<ParsedDraft>(sliced) {
        Ok(parsed) if !parsed.draft.trim().is_empty() => {
            let sources = combine_sources(
                item,
                own_host.as_deref(),
                normalize_sources(&parsed.sources),
                &generation.citations,
            );
            (parsed.draft.trim().to_string(), sources)
        }
        _ => {
            tracing::debug!(item = %item.title, "draft response not JSON; using raw text");
            (generation.text.trim().to_string(), own_source_list(item))
        }
    }
}

/// Coerce the parsed `sources` value into a list of strings.
///
/// A bare string wraps into a one-element list; anything that is not a
/// sequence coerces to empty; non-string elements are dropped.
fn normalize_sources(value: &Value) -> Vec<String> {
    match value {
        Value::String(url) if !url.trim().is_empty() => vec![url.trim().to_string()],
        Value::Array(values) => values
            .iter()
            .filter_map(Value::as_str)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Item's own URL first, model-listed sources next, then citations from
/// hosts other than the item's own, deduped preserving order.
fn combine_sources(
    item: &ResearchItem,
    own_host: Option<&str>,
    listed: Vec<String>,
    citations: &[String],
) -> Vec<String> {
    let mut combined = Vec::new();
    if let Some(own) = &item.source_url {
        combined.push(own.clone());
    }
    combined.extend(listed);
    for cited in citations {
        let foreign = match (own_host, host_of(cited)) {
            (Some(own), Some(host)) => own != host,
            _ => true,
        };
        if foreign {
            combined.push(cited.clone());
        }
    }
    dedupe_preserve_order(combined)
}

fn own_source_list(item: &ResearchItem) -> Vec<String> {
    item.source_url.clone().into_iter().collect()
}
