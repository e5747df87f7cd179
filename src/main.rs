//! Entry point: CLI dispatch and the thin request boundary.
//!
//! The boundary validates the topic, builds the generation client from the
//! layered config, invokes the pipeline runner, and serializes the posts
//! payload to stdout. Input validation failures exit with code 2;
//! environment and config failures with code 1. An empty posts array is a
//! success, not an error.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;
use std::process::ExitCode;
use std::time::Duration;

mod cli;
mod config;
mod extract;
mod generate;
mod pipeline;

use cli::{Command, InitArgs, RootArgs, RunArgs};
use generate::command::CommandClient;
use generate::http::HttpClient;
use generate::GenerationClient;
use pipeline::PipelineRunner;

/// Longest topic accepted by the boundary.
const MAX_TOPIC_CHARS: usize = 200;

fn main() -> ExitCode {
    init_tracing();
    let args = RootArgs::parse();

    let outcome = match args.command {
        Command::Run(args) => cmd_run(args),
        Command::Init(args) => cmd_init(args),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    let topic = args.topic.trim().to_string();
    if topic.is_empty() {
        eprintln!("error: topic is required and must be non-empty");
        return Ok(ExitCode::from(2));
    }
    if topic.chars().count() > MAX_TOPIC_CHARS {
        eprintln!("error: topic too long (max {MAX_TOPIC_CHARS} characters)");
        return Ok(ExitCode::from(2));
    }

    let client = build_client(&args)?;

    tracing::info!(topic = %topic, "pipeline run starting");
    if args.verbose {
        eprintln!("generating posts for topic: {topic}");
    }

    let state = PipelineRunner::new(client.as_ref())
        .verbose(args.verbose)
        .run(topic);
    let response = state.into_response();
    tracing::info!(posts = response.posts.len(), "pipeline run finished");

    let payload = if args.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .context("serialize posts payload")?;
    println!("{payload}");

    Ok(ExitCode::SUCCESS)
}

/// Build the generation client from config and CLI overrides.
///
/// A configured LM command wins; otherwise the HTTP client is used with the
/// API key read from the environment.
fn build_client(args: &RunArgs) -> Result<Box<dyn GenerationClient>> {
    let mut config = config::load_config_optional(args.config.as_deref())?;
    config::validate_config(&config)?;
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }

    if let Some(command) = config::resolve_lm_command(args.lm.as_deref(), &config) {
        let client = CommandClient::new(&command).map_err(|err| anyhow!("{err}"))?;
        return Ok(Box::new(client));
    }

    let api_key = std::env::var(&config.api_key_env).with_context(|| {
        format!(
            "read API key from ${} (export it, or configure lm_command)",
            config.api_key_env
        )
    })?;
    Ok(Box::new(HttpClient::new(
        config.endpoint.clone(),
        config.model.clone(),
        api_key,
        Duration::from_secs(config.timeout_seconds),
    )))
}

fn cmd_init(args: InitArgs) -> Result<ExitCode> {
    let path = match args.config {
        Some(path) => path,
        None => config::user_config_path()?,
    };
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&path, config::config_stub())
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(ExitCode::SUCCESS)
}
