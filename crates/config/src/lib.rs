//! Configuration loading, validation, and management for Pagewise.
//!
//! Loads configuration from `~/.pagewise/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.pagewise/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider settings (endpoint, models, timeouts)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Intent classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Conversation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Catalog / user-data store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Chat behavior settings
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key. Can also come from `PAGEWISE_API_KEY` or `OPENAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat model.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Optional second OpenAI-compatible endpoint tried when the primary
    /// fails. Uses the primary API key unless `fallback_api_key` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_base_url: Option<String>,

    /// API key for the fallback endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_api_key: Option<String>,

    /// Per-request timeout in seconds. Every provider call is bounded.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sampling temperature for chat requests.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_temperature() -> f32 {
    0.0
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            fallback_base_url: None,
            fallback_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("fallback_base_url", &self.fallback_base_url)
            .field("fallback_api_key", &redact(&self.fallback_api_key))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("classifier", &self.classifier)
            .field("memory", &self.memory)
            .field("store", &self.store)
            .field("chat", &self.chat)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Minimum cosine similarity for an intent candidate to be reported.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

fn default_score_threshold() -> f32 {
    0.75
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Transcript backend: "file" or "in_memory".
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Directory for transcript files (file backend only).
    /// Defaults to `~/.pagewise/transcripts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

fn default_memory_backend() -> String {
    "file".into()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Catalog backend: "sqlite" or "in_memory".
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path. Defaults to `~/.pagewise/pagewise.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How many suggestions to return per reply.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Default book count for a monthly reading plan.
    #[serde(default = "default_monthly_plan_books")]
    pub monthly_plan_books: u32,

    /// Default book count for an annual reading plan.
    #[serde(default = "default_annual_plan_books")]
    pub annual_plan_books: u32,

    /// Minimum normalized similarity for fuzzy name resolution.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f32,

    /// Maximum history turns included in prompts.
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

fn default_suggestion_limit() -> usize {
    5
}
fn default_monthly_plan_books() -> u32 {
    5
}
fn default_annual_plan_books() -> u32 {
    40
}
fn default_fuzzy_threshold() -> f32 {
    0.8
}
fn default_history_cap() -> usize {
    20
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: default_suggestion_limit(),
            monthly_plan_books: default_monthly_plan_books(),
            annual_plan_books: default_annual_plan_books(),
            fuzzy_threshold: default_fuzzy_threshold(),
            history_cap: default_history_cap(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.pagewise/config.toml).
    ///
    /// Also checks environment variables:
    /// - `PAGEWISE_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    /// - `PAGEWISE_MODEL` overrides the chat model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("PAGEWISE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("PAGEWISE_MODEL") {
            config.provider.chat_model = model;
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
        dirs_home().join(".pagewise")
    }

    /// Resolved transcript directory.
    pub fn transcript_dir(&self) -> PathBuf {
        self.memory
            .directory
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("transcripts"))
    }

    /// Resolved SQLite database path.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("pagewise.db"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.classifier.score_threshold) {
            return Err(ConfigError::ValidationError(
                "classifier.score_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.chat.fuzzy_threshold) {
            return Err(ConfigError::ValidationError(
                "chat.fuzzy_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.provider.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.request_timeout_secs must be > 0".into(),
            ));
        }

        match self.memory.backend.as_str() {
            "file" | "in_memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown memory backend: {other}"
                )))
            }
        }

        match self.store.backend.as_str() {
            "sqlite" | "in_memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store backend: {other}"
                )))
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            classifier: ClassifierConfig::default(),
            memory: MemoryConfig::default(),
            store: StoreConfig::default(),
            chat: ChatConfig::default(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.chat_model, "gpt-4o-mini");
        assert_eq!(config.chat.monthly_plan_books, 5);
        assert_eq!(config.chat.annual_plan_books, 40);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.base_url, config.provider.base_url);
        assert_eq!(
            parsed.classifier.score_threshold,
            config.classifier.score_threshold
        );
    }

    #[test]
    fn fallback_endpoint_roundtrips() {
        let mut config = AppConfig::default();
        config.provider.fallback_base_url = Some("http://localhost:8080/v1".into());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.provider.fallback_base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert!(parsed.provider.fallback_api_key.is_none());
    }

    #[test]
    fn invalid_threshold_rejected() {
        let config = AppConfig {
            classifier: ClassifierConfig {
                score_threshold: 1.5,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected() {
        let config = AppConfig {
            store: StoreConfig {
                backend: "mongodb".into(),
                path: None,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.store.backend, "sqlite");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[provider]\nchat_model = \"gpt-4o\"\n\n[chat]\nsuggestion_limit = 3\n"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider.chat_model, "gpt-4o");
        assert_eq!(config.chat.suggestion_limit, 3);
        // untouched sections keep defaults
        assert_eq!(config.provider.base_url, default_base_url());
        assert_eq!(config.memory.backend, "file");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            provider: ProviderConfig {
                api_key: Some("sk-secret".into()),
                ..ProviderConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4o-mini"));
        assert!(toml_str.contains("text-embedding-3-small"));
    }
}
