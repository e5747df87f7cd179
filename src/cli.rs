//! CLI argument parsing for the post generation workflow.
//!
//! The CLI is intentionally thin: it validates input, wires the generation
//! client, and serializes the payload, so the pipeline core stays reusable
//! behind any boundary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "postgen",
    version,
    about = "LM-driven article generation pipeline",
    after_help = "Examples:\n  postgen init\n  postgen run --topic \"dune part three\"\n  postgen run --topic \"dune part three\" --lm \"ollama run llama3\" --pretty",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Init(InitArgs),
}

/// Run command inputs for a single pipeline invocation.
#[derive(Parser, Debug)]
#[command(about = "Generate a batch of posts for a topic")]
pub struct RunArgs {
    /// Seed topic to research (non-empty, at most 200 characters)
    #[arg(long, value_name = "TOPIC")]
    pub topic: String,

    /// Config file path (default: ~/.config/postgen/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LM command reading a prompt on stdin and writing text on stdout
    #[arg(long, value_name = "CMD")]
    pub lm: Option<String>,

    /// Model name for the HTTP client
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Endpoint base URL for the HTTP client
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Pretty-print the JSON payload
    #[arg(long)]
    pub pretty: bool,

    /// Emit a stage transcript on stderr
    #[arg(long)]
    pub verbose: bool,
}

/// Init command inputs for writing the default config.
#[derive(Parser, Debug)]
#[command(about = "Write the default config file")]
pub struct InitArgs {
    /// Destination path (default: ~/.config/postgen/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}
