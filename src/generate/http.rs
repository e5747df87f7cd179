//! HTTP client for OpenAI-style response endpoints.
//!
//! Sends `POST {endpoint}/responses` with the prompt as `input` and, when
//! search is requested, a `web_search_preview` tool entry. The response
//! payload is treated as semi-trusted JSON: output text segments are
//! concatenated and `url_citation` annotations become the citation list.

use super::{Generation, GenerationClient, GenerationError, GenerationRequest};
use crate::extract::dedupe_preserve_order;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

pub struct HttpClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ResponsesBody<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl HttpClient {
    pub fn new(endpoint: String, model: String, api_key: String, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            endpoint,
            model,
            api_key,
        }
    }
}

impl GenerationClient for HttpClient {
    fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let url = format!("{}/responses", self.endpoint.trim_end_matches('/'));
        let tools = if request.use_search {
            vec![Tool {
                kind: "web_search_preview",
            }]
        } else {
            Vec::new()
        };
        let body = ResponsesBody {
            model: &self.model,
            input: &request.prompt,
            tools,
        };

        let start = Instant::now();
        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|err| match err {
                ureq::Error::StatusCode(status) => GenerationError::Http { status },
                other => GenerationError::Transport(other.to_string()),
            })?;
        let payload: Value = response
            .body_mut()
            .read_json()
            .map_err(|err| GenerationError::Malformed(err.to_string()))?;

        let generation = parse_responses_payload(&payload)?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = request.prompt.len(),
            response_bytes = generation.text.len(),
            citations = generation.citations.len(),
            "generation complete"
        );
        Ok(generation)
    }
}

/// Pull output text and citation URLs out of a responses payload.
///
/// Text comes from any `output[].content[]` entry of type `output_text`;
/// citations from their `url_citation` annotations, deduped in order. A
/// payload with no text at all is malformed; missing annotations are not.
fn parse_responses_payload(payload: &Value) -> Result<Generation, GenerationError> {
    let mut text = String::new();
    let mut citations = Vec::new();

    let output = payload.get("output").and_then(Value::as_array);
    for item in output.into_iter().flatten() {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        let content = item.get("content").and_then(Value::as_array);
        for part in content.into_iter().flatten() {
            if part.get("type").and_then(Value::as_str) != Some("output_text") {
                continue;
            }
            if let Some(segment) = part.get("text").and_then(Value::as_str) {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(segment);
            }
            let annotations = part.get("annotations").and_then(Value::as_array);
            for annotation in annotations.into_iter().flatten() {
                if annotation.get("type").and_then(Value::as_str) != Some("url_citation") {
                    continue;
                }
                if let Some(cited) = annotation.get("url").and_then(Value::as_str) {
                    citations.push(cited.to_string());
                }
            }
        }
    }

    // Some gateways flatten the convenience field instead of the output list.
    if text.trim().is_empty() {
        if let Some(direct) = payload.get("output_text").and_then(Value::as_str) {
            text = direct.to_string();
        }
    }

    if text.trim().is_empty() {
        return Err(GenerationError::Malformed(
            "response carries no output text".to_string(),
        ));
    }

    Ok(Generation {
        text: text.trim().to_string(),
        citations: dedupe_preserve_order(citations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_message_with_citations() {
        let payload = json!({
            "output": [
                {"type": "web_search_call", "status": "completed"},
                {
                    "type": "message",
                    "content": [
                        {
                            "type": "output_text",
                            "text": "Grounded answer.",
                            "annotations": [
                                {"type": "url_citation", "url": "https://a.example/one"},
                                {"type": "url_citation", "url": "https://b.example/two"},
                                {"type": "url_citation", "url": "https://a.example/one"}
                            ]
                        }
                    ]
                }
            ]
        });

        let generation = parse_responses_payload(&payload).unwrap();
        assert_eq!(generation.text, "Grounded answer.");
        assert_eq!(
            generation.citations,
            vec!["https://a.example/one", "https://b.example/two"]
        );
    }

    #[test]
    fn test_parse_concatenates_segments() {
        let payload = json!({
            "output": [
                {
                    "type": "message",
                    "content": [
                        {"type": "output_text", "text": "first"},
                        {"type": "reasoning", "text": "ignored"},
                        {"type": "output_text", "text": "second"}
                    ]
                }
            ]
        });

        let generation = parse_responses_payload(&payload).unwrap();
        assert_eq!(generation.text, "first\nsecond");
        assert!(generation.citations.is_empty());
    }

    #[test]
    fn test_parse_output_text_fallback() {
        let payload = json!({"output_text": "direct answer"});
        let generation = parse_responses_payload(&payload).unwrap();
        assert_eq!(generation.text, "direct answer");
    }

    #[test]
    fn test_parse_empty_payload_is_malformed() {
        let payload = json!({"output": []});
        assert!(matches!(
            parse_responses_payload(&payload),
            Err(GenerationError::Malformed(_))
        ));
    }
}
