//! SEO enrichment stage: annotate each post with search metadata.
//!
//! Enrichment is strictly additive: on any failure the post keeps its base
//! fields and simply goes out unannotated.

use crate::extract::{extract_json_object, truncate_chars};
use crate::generate::{GenerationClient, GenerationRequest};
use crate::pipeline::{PipelineState, Post, Stage, StageError, StagePatch};
use serde::Deserialize;

const SEO_PROMPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/seo.md"));

/// Post excerpt length included in the prompt.
const EXCERPT_CHARS: usize = 400;

pub(crate) struct SeoEnrich;

#[derive(Debug, Deserialize)]
struct ParsedSeo {
    #[serde(default)]
    seo_title: String,
    #[serde(default)]
    seo_description: String,
}

impl Stage for SeoEnrich {
    fn name(&self) -> &'static str {
        "seo_enrich"
    }

    fn run(
        &self,
        state: &PipelineState,
        client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError> {
        let mut posts = state.posts.clone();
        let mut annotated = 0usize;
        for post in &mut posts {
            if enrich_one(post, client) {
                annotated += 1;
            }
        }

        tracing::info!(annotated, total = posts.len(), "seo enrichment finished");
        Ok(StagePatch {
            posts: Some(posts),
            ..StagePatch::default()
        })
    }
}

/// Annotate a single post in place. Returns whether anything was added.
fn enrich_one(post: &mut Post, client: &dyn GenerationClient) -> bool {
    let prompt = SEO_PROMPT
        .replace("{topic}", &post.topic)
        .replace("{excerpt}", truncate_chars(&post.final_content, EXCERPT_CHARS));

    let generation = match client.generate(&GenerationRequest::new(prompt, false)) {
        Ok(generation) => generation,
        Err(error) => {
            tracing::warn!(topic = %post.topic, error = %error, "seo generation failed; post left unannotated");
            return false;
        }
    };

    let sliced = extract_json_object(&generation.text);
    let parsed: ParsedSeo = match serde_json::from_str(sliced) {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::debug!(topic = %post.topic, "seo response not JSON; post left unannotated");
            return false;
        }
    };

    let mut added = false;
    if !parsed.seo_title.trim().is_empty() {
        post.seo_title = Some(parsed.seo_title.trim().to_string());
        added = true;
    }
    if !parsed.seo_description.trim().is_empty() {
        post.seo_description = Some(parsed.seo_description.trim().to_string());
        added = true;
    }
    added
}
