//! Topic selection stage: narrow research candidates to three.
//!
//! The prompt enumerates candidates and asks for two engaging picks plus one
//! odd one, by 1-based index. The response is scanned for in-range digit
//! tokens; the first three distinct hits win, in order of appearance, so the
//! "positive picks first" intent survives. Anything less recoverable falls
//! back to the leading candidates in original order.

use crate::extract::truncate_chars;
use crate::generate::{GenerationClient, GenerationRequest};
use crate::pipeline::{
    PipelineState, ResearchItem, Stage, StageError, StagePatch, MAX_SELECTED_ITEMS,
};
use regex::Regex;

const SELECT_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/select.md"
));

/// Detail preview length in the candidate listing.
const DETAIL_PREVIEW_CHARS: usize = 120;

pub(crate) struct TopicSelect;

impl Stage for TopicSelect {
    fn name(&self) -> &'static str {
        "topic_select"
    }

    fn run(
        &self,
        state: &PipelineState,
        client: &dyn GenerationClient,
    ) -> Result<StagePatch, StageError> {
        if state.research_items.is_empty() {
            return Ok(StagePatch {
                selected_items: Some(Vec::new()),
                ..StagePatch::default()
            });
        }

        let candidates = state
            .research_items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "{}. {}: {}",
                    i + 1,
                    item.title,
                    truncate_chars(&item.details, DETAIL_PREVIEW_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = SELECT_PROMPT.replace("{candidates}", &candidates);

        let generation = client
            .generate(&GenerationRequest::new(prompt, false))
            .map_err(|error| StageError {
                stage: self.name(),
                error,
            })?;

        let selected = select_items(&generation.text, &state.research_items);
        tracing::info!(count = selected.len(), "topics selected");
        Ok(StagePatch {
            selected_items: Some(selected),
            ..StagePatch::default()
        })
    }
}

/// Pick items by the 1-based indices found in the response text.
///
/// Indices are taken in order of appearance, not numeric order; the first
/// three distinct in-range hits win. When fewer than three valid indices are
/// recovered the selection falls back to the leading items.
fn select_items(response: &str, items: &[ResearchItem]) -> Vec<ResearchItem> {
    let digits = Regex::new(r"\d+").unwrap();
    let mut picked: Vec<usize> = Vec::new();
    for hit in digits.find_iter(response) {
        let Ok(index) = hit.as_str().parse::<usize>() else {
            continue;
        };
        if (1..=items.len()).contains(&index) && !picked.contains(&(index - 1)) {
            picked.push(index - 1);
        }
        if picked.len() == MAX_SELECTED_ITEMS {
            break;
        }
    }

    let want = items.len().min(MAX_SELECTED_ITEMS);
    if picked.len() < want {
        tracing::debug!(
            recovered = picked.len(),
            "selection response unusable; falling back to leading items"
        );
        return items.iter().take(want).cloned().collect();
    }
    picked.into_iter().map(|i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<ResearchItem> {
        (1..=n)
            .map(|i| ResearchItem {
                title: format!("Item {i}"),
                details: String::new(),
                source_url: None,
            })
            .collect()
    }

    #[test]
    fn test_select_in_order_of_appearance() {
        let picked = select_items("I'd go with 2, 4, and 1.", &items(5));
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 2", "Item 4", "Item 1"]);
    }

    #[test]
    fn test_select_ignores_out_of_range_and_duplicates() {
        let picked = select_items("9, 2, 2, 0, 3, 1", &items(5));
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 2", "Item 3", "Item 1"]);
    }

    #[test]
    fn test_select_fallback_without_digits() {
        let picked = select_items("these all look great to me!", &items(5));
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 1", "Item 2", "Item 3"]);
    }

    #[test]
    fn test_select_fallback_with_too_few_digits() {
        let picked = select_items("just take 4", &items(5));
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 1", "Item 2", "Item 3"]);
    }

    #[test]
    fn test_select_short_candidate_list() {
        let picked = select_items("2, 1", &items(2));
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 2", "Item 1"]);
    }

    #[test]
    fn test_select_huge_number_token_skipped() {
        let picked = select_items("99999999999999999999999 then 3, 1, 2", &items(5));
        let titles: Vec<&str> = picked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 3", "Item 1", "Item 2"]);
    }
}
