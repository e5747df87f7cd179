//! Layered configuration for the generation gateway.
//!
//! Settings resolve in priority order:
//!
//! 1. CLI flags (`--lm`, `--model`, `--endpoint`)
//! 2. Config file (`~/.config/postgen/config.json`, or `--config PATH`)
//! 3. `POSTGEN_LM_COMMAND` environment variable
//!
//! A configured LM command selects the local command client; otherwise the
//! HTTP client is used with the API key read from the environment variable
//! named by `api_key_env`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Env var consulted for the LM command when neither flag nor config set one.
pub const LM_COMMAND_ENV: &str = "POSTGEN_LM_COMMAND";

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PostgenConfig {
    pub schema_version: u32,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Local LM command; when set, the HTTP client is bypassed entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_command: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

pub fn default_config() -> PostgenConfig {
    PostgenConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        endpoint: default_endpoint(),
        model: default_model(),
        api_key_env: default_api_key_env(),
        lm_command: None,
        timeout_seconds: default_timeout_seconds(),
    }
}

pub fn config_stub() -> String {
    serde_json::to_string_pretty(&default_config()).expect("serialize config stub")
}

/// Default user config path (`~/.config/postgen/config.json`).
pub fn user_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow!("cannot determine user config dir"))?;
    Ok(base.join("postgen").join("config.json"))
}

pub fn load_config(path: &Path) -> Result<PostgenConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PostgenConfig =
        serde_json::from_slice(&bytes).context("parse postgen config JSON")?;
    Ok(config)
}

/// Load the config from an explicit path, the user config path, or defaults.
///
/// An explicit path must exist; a missing file at the default location just
/// means defaults.
pub fn load_config_optional(explicit: Option<&Path>) -> Result<PostgenConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let path = user_config_path()?;
    if path.is_file() {
        return load_config(&path);
    }
    Ok(default_config())
}

pub fn validate_config(config: &PostgenConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {})",
            config.schema_version,
            CONFIG_SCHEMA_VERSION
        ));
    }
    if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
        return Err(anyhow!(
            "endpoint must be an http(s) URL (got {:?})",
            config.endpoint
        ));
    }
    if config.model.trim().is_empty() {
        return Err(anyhow!("model must not be empty"));
    }
    if config.api_key_env.trim().is_empty() {
        return Err(anyhow!("api_key_env must not be empty"));
    }
    if config.timeout_seconds == 0 || config.timeout_seconds > 600 {
        return Err(anyhow!(
            "timeout_seconds must be in 1..=600 (got {})",
            config.timeout_seconds
        ));
    }
    Ok(())
}

/// Resolve the LM command: CLI flag, then config file, then environment.
pub fn resolve_lm_command(flag: Option<&str>, config: &PostgenConfig) -> Option<String> {
    if let Some(command) = flag {
        return Some(command.to_string());
    }
    if let Some(command) = &config.lm_command {
        return Some(command.clone());
    }
    env::var(LM_COMMAND_ENV).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        validate_config(&default_config()).unwrap();
    }

    #[test]
    fn test_load_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, config_stub()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.schema_version, CONFIG_SCHEMA_VERSION);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_config_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"schema_version": 1, "banana": true}"#).unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_schema_version() {
        let mut config = default_config();
        config.schema_version = 99;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = default_config();
        config.endpoint = "ftp://example.com".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = default_config();
        config.timeout_seconds = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_resolve_lm_command_prefers_flag() {
        let mut config = default_config();
        config.lm_command = Some("from-config".to_string());
        assert_eq!(
            resolve_lm_command(Some("from-flag"), &config).as_deref(),
            Some("from-flag")
        );
        assert_eq!(
            resolve_lm_command(None, &config).as_deref(),
            Some("from-config")
        );
    }
}
