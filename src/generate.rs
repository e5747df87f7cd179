//! Generation-service gateway.
//!
//! The pipeline consumes exactly one capability from its environment: send a
//! prompt, get text back, optionally with citation URLs when web search was
//! requested. The capability is a trait so the runner receives it as an
//! explicit dependency and tests substitute a scripted double.
//!
//! Two real clients exist:
//!
//! - [`http::HttpClient`] talks to an OpenAI-style responses endpoint and
//!   surfaces `url_citation` annotations as citations.
//! - [`command::CommandClient`] invokes a user-configured local command with
//!   the prompt on stdin (any tool that reads text and writes text), keeping
//!   provider choice, cost, and privacy in the user's hands.

pub mod command;
pub mod http;

use std::fmt;

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Ask the service to ground the response with web search.
    pub use_search: bool,
}

impl GenerationRequest {
    pub fn new(prompt: String, use_search: bool) -> Self {
        Self { prompt, use_search }
    }
}

/// Text returned by the generation service, with any citation URLs.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub text: String,
    pub citations: Vec<String>,
}

/// Why a generation call failed.
///
/// Every variant means the same thing to the pipeline: the calling stage
/// falls back and the run continues. The distinctions exist for logs.
#[derive(Debug, Clone)]
pub enum GenerationError {
    /// The service answered with a non-success HTTP status.
    Http { status: u16 },
    /// The request never completed (connect, DNS, timeout, body I/O).
    Transport(String),
    /// The service answered but the response shape was unusable.
    Malformed(String),
    /// The configured local command failed or produced unusable output.
    Command(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Http { status } => {
                write!(f, "generation service returned HTTP {status}")
            }
            GenerationError::Transport(message) => {
                write!(f, "generation request failed: {message}")
            }
            GenerationError::Malformed(message) => {
                write!(f, "generation response unusable: {message}")
            }
            GenerationError::Command(message) => write!(f, "LM command failed: {message}"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Capability to generate text from a prompt.
pub trait GenerationClient {
    fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}
