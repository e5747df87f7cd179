//! Local LM command client.
//!
//! Invokes a user-configured command with the prompt on stdin and takes
//! stdout as the generated text. Any tool that accepts text input and
//! produces text output works (`llm`, `ollama run`, custom scripts).
//! Command output carries no citations; draft sources then contain only
//! each item's own research URL.

use super::{Generation, GenerationClient, GenerationError, GenerationRequest};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

pub struct CommandClient {
    argv: Vec<String>,
}

impl CommandClient {
    /// Parse a shell-style command line into a client.
    pub fn new(command: &str) -> Result<Self, GenerationError> {
        let argv = shell_words::split(command)
            .map_err(|err| GenerationError::Command(format!("parse LM command: {err}")))?;
        if argv.is_empty() {
            return Err(GenerationError::Command("LM command is empty".to_string()));
        }
        Ok(Self { argv })
    }
}

impl GenerationClient for CommandClient {
    fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let start = Instant::now();
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| GenerationError::Command(format!("spawn {}: {err}", self.argv[0])))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.prompt.as_bytes())
                .map_err(|err| GenerationError::Command(format!("write prompt: {err}")))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|err| GenerationError::Command(format!("wait for LM command: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Command(format!(
                "command failed with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|_| GenerationError::Command("command output is not UTF-8".to_string()))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_bytes = request.prompt.len(),
            response_bytes = text.len(),
            "lm command complete"
        );

        Ok(Generation {
            text: text.trim().to_string(),
            citations: Vec::new(),
        })
    }
}
