//! Configuration loading, validation, and management for Folio.
//!
//! Loads configuration from `~/.folio/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.folio/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider used for both embeddings and generation unless overridden
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Where the profile document lives
    #[serde(default)]
    pub profile: ProfileConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generative model settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Template composer settings
    #[serde(default)]
    pub templates: TemplateConfig,

    /// Conversation window settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_true() -> bool {
    true
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
            .field("default_provider", &self.default_provider)
            .field("profile", &self.profile)
            .field("embedding", &self.embedding)
            .field("generation", &self.generation)
            .field("retrieval", &self.retrieval)
            .field("templates", &self.templates)
            .field("conversation", &self.conversation)
            .field("gateway", &self.gateway)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Per-provider connection settings.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Path to the profile JSON document
    #[serde(default = "default_profile_path")]
    pub path: String,
}

fn default_profile_path() -> String {
    "profile.json".into()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            path: default_profile_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name; falls back to `default_provider`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: default_embedding_model(),
        }
    }
}

/// Which generation strategy answers grounded queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStrategy {
    /// Streamed LLM completion, templates as fallback
    Llm,
    /// Template composer only (no generative model)
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_strategy")]
    pub strategy: GenerationStrategy,

    /// Provider name; falls back to `default_provider`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f32,

    #[serde(default = "default_presence_penalty")]
    pub presence_penalty: f32,

    /// Maximum silence between two streamed chunks before giving up
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many prior conversation messages are replayed to the model
    #[serde(default = "default_history_messages")]
    pub history_messages: usize,
}

fn default_strategy() -> GenerationStrategy {
    GenerationStrategy::Llm
}
fn default_generation_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_top_p() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    256
}
fn default_frequency_penalty() -> f32 {
    0.5
}
fn default_presence_penalty() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_history_messages() -> usize {
    6
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            provider: None,
            model: default_generation_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            frequency_penalty: default_frequency_penalty(),
            presence_penalty: default_presence_penalty(),
            timeout_secs: default_timeout_secs(),
            history_messages: default_history_messages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of top-ranked documents used as grounding context
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Category documents scoring below this are ignored by templates
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Decorate template answers with starters and personal touches
    #[serde(default = "default_true")]
    pub personal_touches: bool,
}

fn default_min_score() -> f32 {
    0.1
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            personal_touches: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Turns retained in the conversation window (user + assistant each count)
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_turns() -> usize {
    8
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS; empty means same-origin only
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    4318
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.folio/config.toml).
    ///
    /// Also checks environment variables:
    /// - `FOLIO_API_KEY` (highest priority), `OPENAI_API_KEY`, `OPENROUTER_API_KEY`
    /// - `FOLIO_PROVIDER`, `FOLIO_MODEL`, `FOLIO_EMBEDDING_MODEL`, `FOLIO_PROFILE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
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

    /// Apply environment overrides through `lookup` (env var name → value).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("FOLIO_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }
        if let Some(provider) = lookup("FOLIO_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("FOLIO_MODEL") {
            self.generation.model = model;
        }
        if let Some(model) = lookup("FOLIO_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(path) = lookup("FOLIO_PROFILE") {
            self.profile.path = path;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".folio")
    }

    /// Resolve the profile path; relative paths are taken from the config dir
    /// when they do not exist in the working directory.
    pub fn profile_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.profile.path);
        if path.is_absolute() || path.exists() {
            path
        } else {
            Self::config_dir().join(path)
        }
    }

    /// Provider used for embeddings.
    pub fn embedding_provider(&self) -> &str {
        self.embedding
            .provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }

    /// Provider used for generation.
    pub fn generation_provider(&self) -> &str {
        self.generation
            .provider
            .as_deref()
            .unwrap_or(&self.default_provider)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if g.top_p <= 0.0 || g.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "generation.top_p must be in (0.0, 1.0]".into(),
            ));
        }
        for (name, value) in [
            ("frequency_penalty", g.frequency_penalty),
            ("presence_penalty", g.presence_penalty),
        ] {
            if !(-2.0..=2.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "generation.{name} must be between -2.0 and 2.0"
                )));
            }
        }
        if g.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation.max_tokens must be > 0".into(),
            ));
        }
        if g.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generation.timeout_secs must be > 0".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be > 0".into(),
            ));
        }
        if self.conversation.max_turns < 2 || self.conversation.max_turns % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "conversation.max_turns must be an even number >= 2".into(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.templates.min_score) {
            return Err(ConfigError::ValidationError(
                "templates.min_score must be between -1.0 and 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// A copy with every API key replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let mask = |key: &mut Option<String>| {
            if key.is_some() {
                *key = Some("***".into());
            }
        };
        mask(&mut config.api_key);
        for provider in config.providers.values_mut() {
            mask(&mut provider.api_key);
        }
        config
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            profile: ProfileConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
            templates: TemplateConfig::default(),
            conversation: ConversationConfig::default(),
            gateway: GatewayConfig::default(),
            providers: HashMap::new(),
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
