//! Publish stage: reconcile the parallel sequences into posts.
//!
//! Truncating reconciliation is the contract: the post count is the minimum
//! of the four input lengths, so a partial upstream failure drops the
//! misaligned tail instead of raising. The dropped tail is logged, not
//! surfaced as an error.

use crate::generate::GenerationClient;
use crate::pipeline::{PipelineState, Post, Stage, StageError, StagePatch};

pub(crate) struct Publish;

impl Stage for Publish {
    fn name(&self) -> &'static str {
        "publish"
    }

    fn run(
        &self,
        state: &PipelineState,
        _client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError> {
        let n = state
            .selected_items
            .len()
            .min(state.drafts.len())
            .min(state.finals.len())
            .min(state.draft_sources.len());

        let longest = state
            .selected_items
            .len()
            .max(state.drafts.len())
            .max(state.finals.len())
            .max(state.draft_sources.len());
        if longest > n {
            tracing::warn!(
                reconciled = n,
                dropped = longest - n,
                "upstream sequences disagree on length; truncating to shortest"
            );
        }

        let posts = (0..n)
            .map(|i| Post {
                topic: state.selected_items[i].title.clone(),
                title: state.finals[i].title.clone(),
                draft: state.drafts[i].clone(),
                final_content: state.finals[i].content.clone(),
                sources: state.draft_sources[i].clone(),
                seo_title: None,
                seo_description: None,
            })
            .collect();

        tracing::info!(count = n, "posts assembled");
        Ok(StagePatch {
            posts: Some(posts),
            ..StagePatch::default()
        })
    }
}
