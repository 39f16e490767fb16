//! Configuration loaded from `topicbook.toml`.
//!
//! Every field has a default, so the file is optional. `ANTHROPIC_API_KEY`
//! overrides the file's API key, `ENRICHMENT_API_KEY` the secondary key and
//! `OUTPUTS_DIR` the output directory; command-line flags are applied on top
//! by the binary.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::generator::RetryConfig;

pub const CONFIG_FILE: &str = "topicbook.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TopicbookConfig {
    /// Anthropic API key.
    pub api_key: String,

    /// Model identifier sent to the API and recorded with every outcome.
    pub model: String,

    /// Completion token limit per explanation.
    pub max_tokens: u32,

    /// Request timeout for one generation call, in seconds.
    pub timeout_secs: u64,

    /// Retries for rate-limited calls.
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,

    /// Directory receiving artifacts and, by default, both tracking files.
    pub output_dir: PathBuf,

    /// Results snapshot file name, relative to `output_dir`.
    pub results_file: PathBuf,

    /// Processing history file name, relative to `output_dir`.
    pub history_file: PathBuf,

    pub topics_file: PathBuf,

    /// Directory holding `main_system_prompt.txt` and `main_user_prompt.txt`,
    /// plus the critic and code-generation prompts when enrichment is on.
    pub prompts_dir: PathBuf,

    /// Key for the critique and code-example pass. Empty disables it.
    pub enrichment_api_key: String,

    pub enrichment_model: String,

    pub enrichment_max_tokens: u32,

    /// Request timeout for one enrichment call, in seconds.
    pub enrichment_timeout_secs: u64,
}

impl Default for TopicbookConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 8192,
            timeout_secs: 900,
            max_retries: 3,
            base_delay_ms: 1000,
            output_dir: PathBuf::from("outputs"),
            results_file: PathBuf::from("results.json"),
            history_file: PathBuf::from("processing.log"),
            topics_file: PathBuf::from("topics.txt"),
            prompts_dir: PathBuf::from("prompts"),
            enrichment_api_key: String::new(),
            enrichment_model: "claude-haiku-4-5".to_string(),
            enrichment_max_tokens: 4096,
            enrichment_timeout_secs: 120,
        }
    }
}

impl TopicbookConfig {
    /// Loads `topicbook.toml` from the working directory, then applies the environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(Path::new(CONFIG_FILE))?;
        config.apply_env(
            std::env::var("ANTHROPIC_API_KEY").ok(),
            std::env::var("ENRICHMENT_API_KEY").ok(),
            std::env::var("OUTPUTS_DIR").ok(),
        );
        Ok(config)
    }

    /// Parses the file at `path`, falling back to defaults if it does not exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("invalid config in {}", path.display()))
    }

    fn apply_env(&mut self, api_key: Option<String>, enrichment_key: Option<String>, outputs_dir: Option<String>) {
        if let Some(key) = api_key
            && !key.is_empty()
        {
            self.api_key = key;
        }
        if let Some(key) = enrichment_key
            && !key.is_empty()
        {
            self.enrichment_api_key = key;
        }
        if let Some(dir) = outputs_dir
            && !dir.is_empty()
        {
            self.output_dir = PathBuf::from(dir);
        }
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file)
    }

    pub fn history_path(&self) -> PathBuf {
        self.output_dir.join(&self.history_file)
    }

    pub fn enrichment_enabled(&self) -> bool {
        !self.enrichment_api_key.is_empty()
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
        }
    }
}
