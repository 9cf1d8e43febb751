//! Provider router: selects the correct LLM provider based on config.

use deskmind_config::{AppConfig, ProviderKind};
use deskmind_core::error::ProviderError;
use deskmind_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
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

    /// The default provider, or `NotConfigured` when it was never registered.
    pub fn primary(&self) -> Result<Arc<dyn Provider>, ProviderError> {
        self.default().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "no provider registered as '{}'",
                self.default_provider
            ))
        })
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Name under which a provider kind is registered.
pub fn kind_name(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Ollama => "ollama",
        ProviderKind::OpenAiCompat => "openai_compat",
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderRouter, ProviderError> {
    let settings = &config.provider;
    let timeout = Duration::from_secs(settings.request_timeout_secs);
    let name = kind_name(settings.kind);

    let provider: Arc<dyn Provider> = match settings.kind {
        ProviderKind::Ollama => Arc::new(OllamaProvider::new(&settings.base_url, timeout)?),
        ProviderKind::OpenAiCompat => Arc::new(OpenAiCompatProvider::new(
            name,
            &settings.base_url,
            settings.api_key.clone(),
            timeout,
        )?),
    };

    let mut router = ProviderRouter::new(name);
    router.register(name, provider);
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("ollama");
        router.register("ollama", Arc::new(OllamaProvider::local().unwrap()));

        assert!(router.get("ollama").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert_eq!(router.list(), ["ollama"]);
    }

    #[test]
    fn missing_default_is_not_configured() {
        let router = ProviderRouter::new("ollama");
        assert!(matches!(
            router.primary(),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config).unwrap();
        assert_eq!(router.primary().unwrap().name(), "ollama");
    }

    #[test]
    fn build_openai_compat_from_config() {
        let mut config = AppConfig::default();
        config.provider.kind = ProviderKind::OpenAiCompat;
        config.provider.base_url = "http://localhost:1234/v1".into();

        let router = build_from_config(&config).unwrap();
        assert_eq!(router.primary().unwrap().name(), "openai_compat");
    }
}
