//! Edit stage: polish each draft into a titled final post.
//!
//! Every draft yields exactly one final entry regardless of failure mode, so
//! `finals` and `drafts` stay equal-length.

use crate::extract::{extract_json_object, truncate_chars};
use crate::generate::{GenerationClient, GenerationRequest};
use crate::pipeline::{FinalPost, PipelineState, Stage, StageError, StagePatch};
use serde::Deserialize;

const EDIT_PROMPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/edit.md"));

/// Title length when deriving one from raw response text.
const FALLBACK_TITLE_CHARS: usize = 80;

const FALLBACK_TITLE: &str = "Untitled post";

pub(crate) struct Edit;

#[derive(Debug, Deserialize)]
struct ParsedFinal {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl Stage for Edit {
    fn name(&self) -> &'static str {
        "edit"
    }

    fn run(
        &self,
        state: &PipelineState,
        client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError> {
        let mut finals = Vec::with_capacity(state.drafts.len());
        for draft in &state.drafts {
            finals.push(edit_one(draft, client));
        }

        tracing::info!(count = finals.len(), "finals produced");
        Ok(StagePatch {
            finals: Some(finals),
            ..StagePatch::default()
        })
    }
}

/// Polish a single draft. Infallible: parse failures fall back to the raw
/// response, gateway failures keep the draft unchanged.
fn edit_one(draft: &str, client: &dyn GenerationClient) -> FinalPost {
    let prompt = EDIT_PROMPT.replace("{draft}", draft);
    let generation = match client.generate(&GenerationRequest::new(prompt, false)) {
        Ok(generation) => generation,
        Err(error) => {
            tracing::warn!(error = %error, "edit generation failed; keeping draft as final");
            return FinalPost {
                title: FALLBACK_TITLE.to_string(),
                content: draft.to_string(),
            };
        }
    };

    let sliced = extract_json_object(&generation.text);
    match serde_json::from_str::<ParsedFinal>(sliced) {
        Ok(parsed) if !parsed.content.trim().is_empty() => {
            let title = if parsed.title.trim().is_empty() {
                title_from_text(&generation.text)
            } else {
                parsed.title.trim().to_string()
            };
            FinalPost {
                title,
                content: parsed.content.trim().to_string(),
            }
        }
        _ => {
            tracing::debug!("edit response not JSON; using raw text as final");
            FinalPost {
                title: title_from_text(&generation.text),
                content: generation.text.trim().to_string(),
            }
        }
    }
}

/// Derive a title from the first non-empty line, truncated.
fn title_from_text(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(FALLBACK_TITLE);
    truncate_chars(line, FALLBACK_TITLE_CHARS).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{Generation, GenerationError};
    use std::cell::RefCell;

    struct OneShot(RefCell<Option<Result<Generation, GenerationError>>>);

    impl GenerationClient for OneShot {
        fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Generation, GenerationError> {
            self.0.borrow_mut().take().expect("single call expected")
        }
    }

    fn client_with(text: &str) -> OneShot {
        OneShot(RefCell::new(Some(Ok(Generation {
            text: text.to_string(),
            citations: Vec::new(),
        }))))
    }

    #[test]
    fn test_edit_parses_json_response() {
        let client = client_with(r#"{"title": "Big News", "content": "Polished body."}"#);
        let post = edit_one("rough draft", &client);
        assert_eq!(post.title, "Big News");
        assert_eq!(post.content, "Polished body.");
    }

    #[test]
    fn test_edit_parse_failure_uses_first_line_title() {
        let client = client_with("A Fine Headline\n\nThe rest of the prose.");
        let post = edit_one("rough draft", &client);
        assert_eq!(post.title, "A Fine Headline");
        assert!(post.content.contains("The rest of the prose."));
    }

    #[test]
    fn test_edit_gateway_failure_keeps_draft() {
        let client = OneShot(RefCell::new(Some(Err(GenerationError::Transport(
            "down".to_string(),
        )))));
        let post = edit_one("rough draft", &client);
        assert_eq!(post.title, FALLBACK_TITLE);
        assert_eq!(post.content, "rough draft");
    }

    #[test]
    fn test_title_from_text_truncates() {
        let long = "x".repeat(200);
        assert_eq!(title_from_text(&long).len(), FALLBACK_TITLE_CHARS);
    }
}
