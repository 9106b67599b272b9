use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod providers;
pub use providers::{
    ChatConfig, ChatMessage, ChatRequest, LLMProviderTrait, MessageRole, OpenAIProvider, ProviderError,
    ProviderResponse, ProviderType, TokenUsage, ToolCallRequest, ToolDefinition,
};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Configuration for the command-interpretation model
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct LLMConfig {
    pub provider: ProviderType,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(skip)]
    #[ts(skip)]
    pub api_key: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::OpenAI,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 1500,
            endpoint: None,
            api_key: None,
        }
    }
}

impl LLMConfig {
    /// Read `NAVI_LLM_PROVIDER`, `NAVI_LLM_MODEL`, `NAVI_LLM_ENDPOINT` and `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match non_empty("NAVI_LLM_PROVIDER") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!("{err}; falling back to {}", defaults.provider);
                defaults.provider
            }),
            None => defaults.provider,
        };

        Self {
            provider,
            model: non_empty("NAVI_LLM_MODEL").unwrap_or(defaults.model),
            endpoint: non_empty("NAVI_LLM_ENDPOINT"),
            api_key: non_empty("OPENAI_API_KEY"),
            ..defaults
        }
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tool_choice: Some("auto".to_string()),
        }
    }

    pub fn build_provider(&self) -> Arc<dyn LLMProviderTrait> {
        let provider = match (self.provider, self.endpoint.as_deref()) {
            (ProviderType::Ollama, endpoint) => {
                OpenAIProvider::ollama(endpoint.unwrap_or(DEFAULT_OLLAMA_URL))
            }
            (ProviderType::OpenAI, Some(endpoint)) => {
                OpenAIProvider::with_endpoint(self.api_key.clone(), endpoint)
            }
            (ProviderType::OpenAI, None) => OpenAIProvider::new(self.api_key.clone()),
        };
        Arc::new(provider)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> LLMConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LLMConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_openai_gpt35() {
        let config = config_from(&[]);
        assert_eq!(config.provider, ProviderType::OpenAI);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert!(config.api_key.is_none());
        assert_eq!(config.chat_config().tool_choice.as_deref(), Some("auto"));
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = config_from(&[
            ("NAVI_LLM_PROVIDER", "ollama"),
            ("NAVI_LLM_MODEL", "llama3.1"),
            ("NAVI_LLM_ENDPOINT", "http://gpu-box:11434"),
            ("OPENAI_API_KEY", "  "),
        ]);
        assert_eq!(config.provider, ProviderType::Ollama);
        assert_eq!(config.model, "llama3.1");
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert!(config.api_key.is_none());

        let provider = config.build_provider();
        assert_eq!(provider.provider_type(), ProviderType::Ollama);
        assert!(provider.is_configured());
    }

    #[test]
    fn unknown_provider_falls_back() {
        let config = config_from(&[("NAVI_LLM_PROVIDER", "mystery"), ("OPENAI_API_KEY", "sk")]);
        assert_eq!(config.provider, ProviderType::OpenAI);
        assert!(config.build_provider().is_configured());
    }
}
