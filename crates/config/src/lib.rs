//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` (defaults when absent),
//! reads a `.env` file from the working directory, then applies environment
//! variable overrides. The model API credential comes from `GROQ_API_KEY`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the model API credential.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Generic fallback for the credential.
pub const FALLBACK_API_KEY_VAR: &str = "PARLEY_API_KEY";

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model API key (normally supplied through the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model API endpoint and generation parameters
    #[serde(default)]
    pub provider: ProviderConfig,

    /// History trimming settings
    #[serde(default)]
    pub trim: TrimConfig,

    /// System prompt template and reply language
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Conversation state storage
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
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
            .field("provider", &self.provider)
            .field("trim", &self.trim)
            .field("prompt", &self.prompt)
            .field("checkpoint", &self.checkpoint)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name used in logs and for the default base URL
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Override the OpenAI-compatible base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider_name() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama3-8b-8192".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Which end of the history to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimStrategy {
    /// Keep the oldest messages.
    First,
    /// Keep the newest messages.
    #[default]
    Last,
}

/// Role a trimmed window must start or end on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryRole {
    /// No constraint.
    #[default]
    Any,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Token budget for the history sent to the model
    #[serde(default = "default_trim_max_tokens")]
    pub max_tokens: usize,

    /// `last` keeps the newest messages, `first` keeps the oldest
    #[serde(default)]
    pub strategy: TrimStrategy,

    /// Keep a leading system message regardless of budget
    #[serde(default = "default_true")]
    pub include_system: bool,

    /// Allow the boundary message to be cut to fit
    #[serde(default)]
    pub allow_partial: bool,

    /// `last` strategy: role the kept window must start on
    #[serde(default = "default_start_on")]
    pub start_on: BoundaryRole,

    /// `first` strategy: role the kept window must end on
    #[serde(default)]
    pub end_on: BoundaryRole,
}

fn default_trim_max_tokens() -> usize {
    768
}
fn default_start_on() -> BoundaryRole {
    BoundaryRole::User
}
fn default_true() -> bool {
    true
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_trim_max_tokens(),
            strategy: TrimStrategy::Last,
            include_system: true,
            allow_partial: false,
            start_on: default_start_on(),
            end_on: BoundaryRole::Any,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// System prompt; `{language}` is replaced with the reply language
    #[serde(default = "default_system_template")]
    pub system_template: String,

    #[serde(default = "default_language")]
    pub default_language: String,
}

/// The stock system prompt.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are a helpful assistant that provides clear and concise answers. \
Respond to all questions to the best of your ability in {language}. \
If you're unsure about something, be honest about it.";

fn default_system_template() -> String {
    DEFAULT_SYSTEM_TEMPLATE.into()
}
fn default_language() -> String {
    "English".into()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_template: default_system_template(),
            default_language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Threads kept in memory before the least recently active is evicted (0 = unbounded)
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_max_threads() -> usize {
    1_000
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml).
    ///
    /// A `.env` file in the working directory is read first. Environment
    /// variables then override file values:
    /// - `GROQ_API_KEY` (falls back to `PARLEY_API_KEY`)
    /// - `PARLEY_MODEL`, `PARLEY_BASE_URL`
    /// - `PARLEY_HOST`, `PARLEY_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
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

    /// Apply overrides from an environment lookup.
    ///
    /// Values that are set but blank are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(API_KEY_VAR).or_else(|| get(FALLBACK_API_KEY_VAR)) {
            self.api_key = Some(key);
        }
        if let Some(model) = get("PARLEY_MODEL") {
            self.provider.model = model;
        }
        if let Some(url) = get("PARLEY_BASE_URL") {
            self.provider.base_url = Some(url);
        }
        if let Some(host) = get("PARLEY_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = get("PARLEY_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PARLEY_PORT is not a valid port: {port}"))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "provider.max_tokens must be > 0".into(),
            ));
        }

        if self.trim.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "trim.max_tokens must be > 0".into(),
            ));
        }

        if !self.prompt.system_template.contains("{language}") {
            return Err(ConfigError::ValidationError(
                "prompt.system_template must contain a {language} placeholder".into(),
            ));
        }

        Ok(())
    }

    /// The model API key, or a configuration error when it is missing.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey { var: API_KEY_VAR }),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            trim: TrimConfig::default(),
            prompt: PromptConfig::default(),
            checkpoint: CheckpointConfig::default(),
            gateway: GatewayConfig::default(),
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

    #[error("{var} not found in environment variables")]
    MissingApiKey { var: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.name, "groq");
        assert_eq!(config.provider.model, "llama3-8b-8192");
        assert_eq!(config.provider.max_tokens, 2048);
        assert_eq!(config.trim.max_tokens, 768);
        assert_eq!(config.trim.start_on, BoundaryRole::User);
        assert_eq!(config.trim.end_on, BoundaryRole::Any);
        assert_eq!(config.prompt.default_language, "English");
        assert_eq!(config.checkpoint.max_threads, 1_000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.model, config.provider.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.provider.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_strategy_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[trim]\nstrategy = \"middle\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn system_is_not_a_boundary_role() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[trim]\nstart_on = \"system\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn trim_roles_parse_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[trim]
strategy = "first"
start_on = "any"
end_on = "assistant"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.trim.strategy, TrimStrategy::First);
        assert_eq!(config.trim.start_on, BoundaryRole::Any);
        assert_eq!(config.trim.end_on, BoundaryRole::Assistant);
    }

    #[test]
    fn template_without_language_rejected() {
        let mut config = AppConfig::default();
        config.prompt.system_template = "Be nice.".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider.name, "groq");
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[provider]
model = "llama-3.1-8b-instant"

[trim]
max_tokens = 1024
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider.model, "llama-3.1-8b-instant");
        assert_eq!(config.trim.max_tokens, 1024);
        assert_eq!(config.trim.strategy, TrimStrategy::Last);
        assert_eq!(config.gateway.port, 8501);
    }

    #[test]
    fn malformed_config_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let config = AppConfig::default();
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { var: "GROQ_API_KEY" }));
        assert_eq!(err.to_string(), "GROQ_API_KEY not found in environment variables");
    }

    #[test]
    fn env_supplies_api_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GROQ_API_KEY", "gsk-test")])).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "gsk-test");
    }

    #[test]
    fn blank_env_key_is_ignored() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("GROQ_API_KEY", "  "), ("PARLEY_API_KEY", "fallback")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn env_overrides_model_and_port() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("PARLEY_MODEL", "mixtral-8x7b-32768"), ("PARLEY_PORT", "9000")]))
            .unwrap();
        assert_eq!(config.provider.model, "mixtral-8x7b-32768");
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("PARLEY_PORT", "eighty")])).is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("gsk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("gsk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
