//! Pipeline state, stages, and the runner.
//!
//! One run owns one [`PipelineState`], threaded through six stages in fixed
//! order: research, topic selection, drafting, editing, publishing, SEO
//! enrichment. Each stage reads the state and returns a [`StagePatch`] that
//! the runner merges; fields a stage does not touch are left alone.
//!
//! No stage failure aborts a run. A stage that cannot produce output returns
//! a [`StageError`]; the runner logs it and continues with an empty patch, so
//! downstream stages see empty input and degrade in turn. An empty `posts`
//! array is a valid outcome, not an error.

mod draft;
mod edit;
mod publish;
mod research;
mod select;
mod seo;


use crate::generate::{GenerationClient, GenerationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Most research candidates kept from the research stage.
pub const MAX_RESEARCH_ITEMS: usize = 5;

/// Most items the selection stage forwards to drafting.
pub const MAX_SELECTED_ITEMS: usize = 3;

/// One candidate subtopic recovered by the research stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResearchItem {
    pub title: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A polished article produced by the edit stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalPost {
    pub title: String,
    pub content: String,
}

/// The externally visible artifact: one finished post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub topic: String,
    pub title: String,
    pub draft: String,
    #[serde(rename = "final")]
    pub final_content: String,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
}

/// Mutable record threaded through the stages of one run.
///
/// Owned exclusively by the runner for the run's lifetime and discarded once
/// the response payload is emitted.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub topic: String,
    pub research_items: Vec<ResearchItem>,
    pub selected_items: Vec<ResearchItem>,
    pub drafts: Vec<String>,
    /// Index-aligned with `drafts`; inner lists are deduped, first-seen order.
    pub draft_sources: Vec<Vec<String>>,
    pub finals: Vec<FinalPost>,
    pub posts: Vec<Post>,
}

impl PipelineState {
    pub fn new(topic: String) -> Self {
        Self {
            topic,
            ..Self::default()
        }
    }

    /// Merge a stage's partial output; untouched fields stay as they are.
    fn apply(&mut self, patch: StagePatch) {
        if let Some(items) = patch.research_items {
            self.research_items = items;
        }
        if let Some(items) = patch.selected_items {
            self.selected_items = items;
        }
        if let Some((drafts, sources)) = patch.drafts {
            self.drafts = drafts;
            self.draft_sources = sources;
        }
        if let Some(finals) = patch.finals {
            self.finals = finals;
        }
        if let Some(posts) = patch.posts {
            self.posts = posts;
        }
    }

    pub fn into_response(self) -> RunResponse {
        RunResponse { posts: self.posts }
    }
}

/// Externally visible payload: the posts array, nothing else.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub posts: Vec<Post>,
}

/// Draft bodies paired with their per-item source lists.
pub type DraftBatch = (Vec<String>, Vec<Vec<String>>);

/// Partial state produced by one stage.
///
/// Drafts and their source lists travel as a pair so the two sequences can
/// never go out of step.
#[derive(Debug, Default)]
pub struct StagePatch {
    pub research_items: Option<Vec<ResearchItem>>,
    pub selected_items: Option<Vec<ResearchItem>>,
    pub drafts: Option<DraftBatch>,
    pub finals: Option<Vec<FinalPost>>,
    pub posts: Option<Vec<Post>>,
}

/// A stage-level failure: the whole stage degraded to empty output.
///
/// Per-item failures never surface here; stages fold those into placeholder
/// entries so sibling items survive.
#[derive(Debug)]
pub struct StageError {
    pub stage: &'static str,
    pub error: GenerationError,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for StageError {}

/// One unit of pipeline work.
pub(crate) trait Stage {
    fn name(&self) -> &'static str;

    fn run(
        &self,
        state: &PipelineState,
        client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError>;
}

/// Executes the fixed stage sequence against an injected generation client.
pub struct PipelineRunner<'a> {
    client: &'a dyn GenerationClient,
    verbose: bool,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(client: &'a dyn GenerationClient) -> Self {
        Self {
            client,
            verbose: false,
        }
    }

    /// Emit a stage transcript on stderr while running.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run all stages for `topic` and return the accumulated state.
    ///
    /// Never fails: stage errors are logged and the run continues with the
    /// state accumulated so far.
    pub fn run(&self, topic: String) -> PipelineState {
        let mut state = PipelineState::new(topic);
        let stages: [&dyn Stage; 6] = [
            &research::Research,
            &select::TopicSelect,
            &draft::Draft,
            &edit::Edit,
            &publish::Publish,
            &seo::SeoEnrich,
        ];

        for stage in stages {
            let start = Instant::now();
            match stage.run(&state, self.client) {
                Ok(patch) => {
                    state.apply(patch);
                    tracing::info!(
                        stage = stage.name(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "stage complete"
                    );
                    if self.verbose {
                        eprintln!(
                            "  {}: done in {} ms",
                            stage.name(),
                            start.elapsed().as_millis()
                        );
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        stage = err.stage,
                        error = %err.error,
                        "stage degraded to empty output"
                    );
                    if self.verbose {
                        eprintln!("  {}: failed ({}), continuing", err.stage, err.error);
                    }
                }
            }
        }

        state
    }
}
