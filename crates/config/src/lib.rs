//! Configuration loading, validation, and management for Scoutline.
//!
//! Loads configuration from `~/.scoutline/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use scoutline_core::settings::Settings;
use scoutline_core::tool::SearchEngine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.scoutline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat-completions endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Initial session settings
    #[serde(default)]
    pub settings: Settings,

    /// Search backend configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Orchestration limits
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

fn default_provider_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider_url", &self.provider_url)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("settings", &self.settings)
            .field("search", &self.search)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub engine: SearchEngine,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brave_api_key: Option<String>,

    /// Base URL of a SearXNG instance with the JSON format enabled
    #[serde(default = "default_searxng_url")]
    pub searxng_url: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_searxng_url() -> String {
    "http://localhost:8080".into()
}
fn default_max_results() -> usize {
    8
}
fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: SearchEngine::default(),
            brave_api_key: None,
            searxng_url: default_searxng_url(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("engine", &self.engine)
            .field("brave_api_key", &redact(&self.brave_api_key))
            .field("searxng_url", &self.searxng_url)
            .field("max_results", &self.max_results)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Limits applied by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Identical consecutive tool calls allowed before the loop guard fires
    #[serde(default = "default_loop_threshold")]
    pub loop_threshold: u32,

    /// Tool rounds allowed within one user exchange
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    #[serde(default = "default_chunk_size")]
    pub deep_read_chunk_size: usize,

    #[serde(default = "default_max_chunks")]
    pub deep_read_max_chunks: usize,

    #[serde(default = "default_max_chars")]
    pub deep_read_max_chars: usize,

    /// Character budget for one summarization batch and for the final summary
    #[serde(default = "default_summary_budget")]
    pub summary_budget_chars: usize,

    #[serde(default = "default_max_summary_rounds")]
    pub max_summary_rounds: u32,

    /// Advisory timeout handed to the transport for summarization calls
    #[serde(default = "default_summary_timeout")]
    pub summary_timeout_secs: u64,

    /// Ask the model which results to deep-read after every search
    #[serde(default)]
    pub auto_suggest_reads: bool,
}

fn default_loop_threshold() -> u32 {
    3
}
fn default_max_tool_rounds() -> u32 {
    10
}
fn default_chunk_size() -> usize {
    2000
}
fn default_max_chunks() -> usize {
    5
}
fn default_max_chars() -> usize {
    20_000
}
fn default_summary_budget() -> usize {
    12_000
}
fn default_max_summary_rounds() -> u32 {
    4
}
fn default_summary_timeout() -> u64 {
    120
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            loop_threshold: default_loop_threshold(),
            max_tool_rounds: default_max_tool_rounds(),
            deep_read_chunk_size: default_chunk_size(),
            deep_read_max_chunks: default_max_chunks(),
            deep_read_max_chars: default_max_chars(),
            summary_budget_chars: default_summary_budget(),
            max_summary_rounds: default_max_summary_rounds(),
            summary_timeout_secs: default_summary_timeout(),
            auto_suggest_reads: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.scoutline/config.toml).
    ///
    /// Also checks environment variables:
    /// - `SCOUTLINE_API_KEY`, then `OPENROUTER_API_KEY`, then `OPENAI_API_KEY`
    /// - `SCOUTLINE_MODEL`, `SCOUTLINE_PROVIDER_URL`
    /// - `BRAVE_API_KEY`, `SCOUTLINE_SEARCH_ENGINE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup("SCOUTLINE_API_KEY")
                .or_else(|| lookup("OPENROUTER_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(model) = lookup("SCOUTLINE_MODEL") {
            self.default_model = model;
        }

        if let Some(url) = lookup("SCOUTLINE_PROVIDER_URL") {
            self.provider_url = url;
        }

        if self.search.brave_api_key.is_none() {
            self.search.brave_api_key = lookup("BRAVE_API_KEY");
        }

        if let Some(engine) = lookup("SCOUTLINE_SEARCH_ENGINE") {
            self.search.engine = engine.parse().map_err(ConfigError::ValidationError)?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".scoutline")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let o = &self.orchestrator;
        if o.loop_threshold == 0 {
            return Err(ConfigError::ValidationError("loop_threshold must be > 0".into()));
        }
        if o.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError("max_tool_rounds must be > 0".into()));
        }
        if o.deep_read_chunk_size == 0 || o.deep_read_max_chunks == 0 {
            return Err(ConfigError::ValidationError(
                "deep_read_chunk_size and deep_read_max_chunks must be > 0".into(),
            ));
        }
        if o.summary_budget_chars == 0 || o.max_summary_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "summary_budget_chars and max_summary_rounds must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider_url: default_provider_url(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            settings: Settings::default(),
            search: SearchConfig::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError {
        path: PathBuf,
        reason: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
