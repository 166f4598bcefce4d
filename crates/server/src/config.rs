//! # Application Configuration
//!
//! This module defines the configuration structure for the `stockmeta-server`
//! and provides the logic for loading it from a YAML file and environment
//! variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use stockmeta::providers::ai::openai::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_OPENAI_API_URL, DEFAULT_OPENAI_MODEL,
};
use stockmeta::AnalysisConfig;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The vision model the server talks to.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Limits, fallbacks and rules of the metadata pipeline.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            provider: ProviderConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    9090
}

/// Configuration for the AI provider instance.
#[derive(Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider ("openai" or "local").
    #[serde(default = "default_provider_kind")]
    pub provider: String,
    /// The API URL. Optional for OpenAI, required for local providers.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key. Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider_kind(),
            api_url: None,
            api_key: None,
            model_name: default_model_name(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl ProviderConfig {
    /// The configured URL, or the public OpenAI endpoint for `openai`.
    pub fn resolved_api_url(&self) -> Option<String> {
        match &self.api_url {
            Some(url) if !url.trim().is_empty() => Some(url.clone()),
            _ if self.provider == "openai" => Some(DEFAULT_OPENAI_API_URL.to_string()),
            _ => None,
        }
    }
}

fn default_provider_kind() -> String {
    "openai".to_string()
}

fn default_model_name() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_max_output_tokens() -> u32 {
    DEFAULT_MAX_OUTPUT_TOKENS
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Invalid substitution pattern: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Without an override, `config.yml` next to the crate manifest is used when
///   it exists. An explicit path that does not exist is an error.
/// - `${VAR}` placeholders in the file are replaced from the environment.
/// - Top-level keys like `port` are overridden by `PORT`.
/// - Nested keys are overridden by `STOCKMETA_...` variables
///   (e.g., `STOCKMETA_ANALYSIS__NORMALIZER__TITLE_MAX_LEN`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    match config_path_override {
        Some(path) => {
            let content = read_and_substitute(path)?.ok_or_else(|| {
                ConfigError::NotFound(format!("Config file not found at '{path}'."))
            })?;
            info!("Loading configuration from '{path}'.");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None => {
            let default_path = format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"));
            match read_and_substitute(&default_path)? {
                Some(content) => {
                    info!("Loading configuration from '{default_path}'.");
                    builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
                }
                None => info!("'{default_path}' not found. Using defaults and environment."),
            }
        }
    }

    let settings = builder
        // Top-level keys like PORT.
        .add_source(Environment::default())
        // Prefixed variables for nested overrides.
        .add_source(
            Environment::with_prefix("STOCKMETA")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    let key_missing = config
        .provider
        .api_key
        .as_deref()
        .is_none_or(|key| key.trim().is_empty());
    if key_missing {
        config.provider.api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
    }

    Ok(config)
}
