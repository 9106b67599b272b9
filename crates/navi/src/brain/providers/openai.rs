//! OpenAI chat-completions provider (also serves OpenAI-compatible Ollama)

use async_trait::async_trait;
use reqwest::Client;

use super::provider_trait::{
    ChatMessage, ChatRequest, LLMProviderTrait, MessageRole, ProviderError, ProviderResponse,
    ProviderType, TokenUsage, ToolCallRequest, ToolDefinition,
};

pub const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI API provider
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    provider_type: ProviderType,
}

impl OpenAIProvider {
    /// Create a provider against the public OpenAI endpoint
    pub fn new(api_key: Option<String>) -> Self {
        if api_key.is_some() {
            tracing::info!("OpenAI provider initialized with API key");
        } else {
            tracing::warn!("OpenAI provider created without API key - OPENAI_API_KEY env var not found");
        }

        Self {
            client: Client::new(),
            api_key,
            endpoint: OPENAI_CHAT_ENDPOINT.to_string(),
            provider_type: ProviderType::OpenAI,
        }
    }

    /// Create with a custom endpoint (e.g., for Azure OpenAI or local proxies)
    pub fn with_endpoint(api_key: Option<String>, endpoint: impl Into<String>) -> Self {
        let mut provider = Self::new(api_key);
        provider.endpoint = endpoint.into();
        provider
    }

    /// Ollama's OpenAI-compatible endpoint; no key required
    pub fn ollama(base_url: &str) -> Self {
        tracing::info!("LLM provider initialized with Ollama (local, no API key required)");
        Self {
            client: Client::new(),
            api_key: None,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            provider_type: ProviderType::Ollama,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn requires_auth(&self) -> bool {
        !matches!(self.provider_type, ProviderType::Ollama)
    }

    /// Convert our ChatMessage to OpenAI API format
    fn message_to_openai(&self, msg: &ChatMessage) -> serde_json::Value {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        serde_json::json!({
            "role": role,
            "content": msg.content
        })
    }

    /// Convert ToolDefinition to OpenAI tool format
    fn tool_to_openai(&self, tool: &ToolDefinition) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters
            }
        })
    }

    fn build_payload(&self, request: &ChatRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| self.message_to_openai(m))
            .collect();

        let mut payload = serde_json::json!({
            "model": request.config.model,
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
            "messages": messages
        });

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let openai_tools: Vec<serde_json::Value> =
                    tools.iter().map(|t| self.tool_to_openai(t)).collect();
                payload["tools"] = serde_json::json!(openai_tools);

                payload["tool_choice"] = match request.config.tool_choice.as_deref() {
                    None | Some("auto") => serde_json::json!("auto"),
                    Some("required") => serde_json::json!("required"),
                    Some("none") => serde_json::json!("none"),
                    Some(specific) => {
                        serde_json::json!({"type": "function", "function": {"name": specific}})
                    }
                };
            }
        }

        payload
    }

    /// Parse OpenAI response into ProviderResponse
    fn parse_response(&self, json: &serde_json::Value) -> Result<ProviderResponse, ProviderError> {
        let message = json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| ProviderError::ParseError("response has no choices".to_string()))?;

        let usage = json.get("usage").and_then(|u| {
            Some(TokenUsage {
                input_tokens: u["prompt_tokens"].as_u64()? as u32,
                output_tokens: u["completion_tokens"].as_u64()? as u32,
                total_tokens: u["total_tokens"].as_u64()? as u32,
            })
        });

        let content = message["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            let calls: Vec<ToolCallRequest> = tool_calls
                .iter()
                .filter_map(|tc| {
                    let name = tc["function"]["name"].as_str()?.to_string();
                    let id = tc["id"].as_str().unwrap_or_default().to_string();
                    let arguments = match &tc["function"]["arguments"] {
                        serde_json::Value::String(raw) => raw.clone(),
                        serde_json::Value::Null => "{}".to_string(),
                        other => other.to_string(),
                    };
                    Some(ToolCallRequest {
                        id,
                        name,
                        arguments,
                    })
                })
                .collect();

            if !calls.is_empty() {
                return Ok(ProviderResponse::ToolCalls {
                    calls,
                    content,
                    usage,
                });
            }
        }

        Ok(ProviderResponse::Text { content, usage })
    }
}

#[async_trait]
impl LLMProviderTrait for OpenAIProvider {
    fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    fn name(&self) -> &'static str {
        match self.provider_type {
            ProviderType::OpenAI => "OpenAI",
            ProviderType::Ollama => "Ollama",
        }
    }

    fn is_configured(&self) -> bool {
        !self.requires_auth() || self.api_key.is_some()
    }

    fn default_model(&self) -> &str {
        match self.provider_type {
            ProviderType::OpenAI => "gpt-3.5-turbo",
            ProviderType::Ollama => "llama3.1",
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<ProviderResponse, ProviderError> {
        let auth_header = self.api_key.as_ref().map(|k| format!("Bearer {}", k));
        if auth_header.is_none() && self.requires_auth() {
            return Err(ProviderError::AuthError(
                "No OpenAI API key configured".to_string(),
            ));
        }

        let payload = self.build_payload(&request);

        tracing::debug!(
            "[{}] Sending request: model={}, messages={}, tools={}",
            self.name(),
            request.config.model,
            request.messages.len(),
            request.tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );

        let builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        let builder = match auth_header {
            Some(auth) => builder.header("Authorization", auth),
            None => builder,
        };

        let response = builder
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("[{}] API error ({}): {}", self.name(), status, body);

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let parsed = self.parse_response(&json)?;
        if let Some(usage) = parsed.usage() {
            tracing::debug!(
                "[{}] tokens: input={}, output={}, total={}",
                self.name(),
                usage.input_tokens,
                usage.output_tokens,
                usage.total_tokens
            );
        }
        Ok(parsed)
    }
}
