//! Structured-data recovery from generated text.
//!
//! LM output for a "respond with JSON only" prompt arrives in several shapes:
//! clean JSON, JSON inside markdown code fences, JSON with surrounding prose,
//! or a prose numbered list when the model ignored the format entirely. The
//! extractors here normalize all of those without ever failing: each function
//! has a deterministic best-effort result and an explicit empty/default output
//! on total failure, so callers branch on ordinary values instead of errors.

use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// One entry recovered from a prose numbered list.
///
/// Produced by [`parse_numbered_list`] when a research response could not be
/// parsed as JSON. `url` is the first link embedded in the entry, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedItem {
    pub title: String,
    pub details: String,
    pub url: Option<String>,
}

/// Extract the JSON array portion of `text`.
///
/// Strips markdown code fences when present, then slices from the first `[`
/// to the last `]`. Falls back to the trimmed input when no array brackets
/// are found, so a failed downstream parse can trigger the caller's own
/// fallback. Idempotent: re-extracting an extracted result is a no-op.
pub fn extract_json_array(text: &str) -> &str {
    extract_delimited(text, '[', ']')
}

/// Extract the JSON object portion of `text`.
///
/// Same strategy as [`extract_json_array`] using `{` / `}`.
pub fn extract_json_object(text: &str) -> &str {
    extract_delimited(text, '{', '}')
}

fn extract_delimited(text: &str, open: char, close: char) -> &str {
    let text = strip_code_fences(text);
    match (text.find(open), text.rfind(close)) {
        (Some(start), Some(end)) if start <= end => text[start..=end].trim(),
        _ => text,
    }
}

/// Strip leading/trailing markdown code fences, returning the inner text.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    text
}

/// Parse a prose numbered list (`1.` / `2)` markers) into items.
///
/// Each block following a marker yields a title (quoted or bolded text when
/// present, otherwise the first line with decoration stripped), the first
/// embedded URL, and the decoration-stripped remainder as details. Blocks
/// with no recoverable title are skipped. Returns an empty vec when the text
/// contains no numbered markers at all.
pub fn parse_numbered_list(text: &str) -> Vec<NumberedItem> {
    let marker = Regex::new(r"(?m)^\s{0,3}\d{1,3}[.)]\s+").unwrap();
    let bounds: Vec<(usize, usize)> = marker
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut items = Vec::new();
    for (i, (_, body_start)) in bounds.iter().enumerate() {
        let end = bounds
            .get(i + 1)
            .map(|(next_start, _)| *next_start)
            .unwrap_or(text.len());
        let block = &text[*body_start..end];
        if let Some(item) = parse_list_block(block) {
            items.push(item);
        }
    }
    items
}

fn parse_list_block(block: &str) -> Option<NumberedItem> {
    let url = first_url(block);

    let emphasized = Regex::new(r#""([^"\n]+)"|\*\*([^*\n]+)\*\*"#).unwrap();
    let title = emphasized
        .captures(block)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .or_else(|| {
            block
                .lines()
                .map(strip_decoration)
                .find(|line| !line.is_empty())
        })?;

    if title.is_empty() {
        return None;
    }

    let mut details = block
        .lines()
        .map(strip_decoration)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let quoted_title = format!("\"{title}\"");
    if let Some(rest) = details
        .strip_prefix(&quoted_title)
        .or_else(|| details.strip_prefix(&title))
    {
        details = rest
            .trim_start()
            .trim_start_matches(&[':', '-'][..])
            .trim()
            .to_string();
    }

    Some(NumberedItem {
        title,
        details,
        url,
    })
}

/// Strip markdown decoration from a single line.
fn strip_decoration(line: &str) -> String {
    line.replace("**", "")
        .replace('`', "")
        .trim()
        .trim_start_matches('#')
        .trim_start_matches('-')
        .trim()
        .to_string()
}

/// Remove exact duplicate URLs, keeping first occurrence order.
pub fn dedupe_preserve_order(mut urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.retain(|url| seen.insert(url.clone()));
    urls
}

/// First `http(s)` URL embedded in `text`, with trailing punctuation trimmed.
pub fn first_url(text: &str) -> Option<String> {
    let re = Regex::new(r#"https?://[^\s"'<>\)\]]+"#).unwrap();
    re.find(text)
        .map(|m| m.as_str().trim_end_matches(&['.', ',', ';', ':'][..]).to_string())
}

/// Lowercase host component of `url`, if it parses as an absolute URL.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Char-boundary-safe prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
