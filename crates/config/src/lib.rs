//! Configuration loading, validation, and management for toolrun.
//!
//! Loads configuration from `~/.toolrun/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.toolrun/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the engine endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Engine endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name sent to the engine
    #[serde(default = "default_model")]
    pub model: String,

    /// Execution loop configuration
    #[serde(default)]
    pub run: RunConfig,

    /// Ephemeral session resource configuration
    #[serde(default)]
    pub ephemeral: EphemeralConfig,

    /// Built-in tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("run", &self.run)
            .field("ephemeral", &self.ephemeral)
            .field("tools", &self.tools)
            .finish()
    }
}

/// Execution loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Iteration budget per run. Clamped to the loop's hard ceiling.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Tools enabled for runs. Empty means all registered tools.
    #[serde(default)]
    pub enabled_tools: Vec<String>,
}

fn default_max_iterations() -> u32 {
    5
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            enabled_tools: Vec::new(),
        }
    }
}

/// Ephemeral session resource settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralConfig {
    /// Template database copied for each session.
    #[serde(default = "default_template_db")]
    pub template_db: PathBuf,

    /// Directory session working copies live under.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Minutes a released session's resources are retained.
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: u64,
}

fn default_template_db() -> PathBuf {
    AppConfig::config_dir().join("template.db")
}
fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("sessions")
}
fn default_retention_minutes() -> u64 {
    30
}

impl Default for EphemeralConfig {
    fn default() -> Self {
        Self {
            template_db: default_template_db(),
            data_dir: default_data_dir(),
            retention_minutes: default_retention_minutes(),
        }
    }
}

/// Built-in tool settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    /// Directory of corpus documents indexed for retrieval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Environment overrides, highest priority:
    /// - `TOOLRUN_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `TOOLRUN_MODEL`
    /// - `TOOLRUN_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("TOOLRUN_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("TOOLRUN_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("TOOLRUN_BASE_URL") {
            config.base_url = url;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".toolrun")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "run.max_iterations must be at least 1".into(),
            ));
        }

        if self.ephemeral.retention_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "ephemeral.retention_minutes must be at least 1".into(),
            ));
        }

        if self.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            run: RunConfig::default(),
            ephemeral: EphemeralConfig::default(),
            tools: ToolsConfig::default(),
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
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
