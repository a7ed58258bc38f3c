//! Provider router — selects the correct model provider based on config.
//!
//! Handles provider creation and lookup for the embedding and generation roles.

use crate::openai_compat::OpenAiCompatProvider;
use folio_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes model requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// Look up `name`, falling back to the default provider.
    pub fn get_or_default(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.get(name).or_else(|| self.default())
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// Every `[providers.*]` table is registered, and the default, embedding and
/// generation providers are created from well-known base URLs when they are
/// not configured explicitly.
pub fn build_from_config(config: &folio_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    let implicit = [
        config.default_provider.as_str(),
        config.embedding_provider(),
        config.generation_provider(),
    ];
    for name in implicit {
        if router.get(name).is_some() {
            continue;
        }
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(name);
        tracing::debug!(provider = name, base_url = %base_url, "Registering implicit provider");
        router.register(
            name.to_string(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    router
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "lmstudio" => "http://localhost:1234/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_config::{AppConfig, ProviderConfig};

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openrouter");
        let provider = Arc::new(OpenAiCompatProvider::openrouter("sk-test"));
        router.register("openrouter", provider);

        assert!(router.get("openrouter").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert!(router.get_or_default("nonexistent").is_some());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        assert!(router.default().is_some());
        assert_eq!(router.list(), vec!["openai"]);
    }

    #[test]
    fn build_registers_role_providers() {
        let mut config = AppConfig::default();
        config.embedding.provider = Some("ollama".into());
        config.generation.provider = Some("openrouter".into());
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["ollama", "openai", "openrouter"]);
    }

    #[test]
    fn explicit_provider_table_wins() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-explicit".into()),
                api_url: Some("http://proxy.local/v1".into()),
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.get("openai").unwrap().name(), "openai");
        assert_eq!(router.list().len(), 1);
    }
}
