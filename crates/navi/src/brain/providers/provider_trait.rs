//! Provider trait and common types for function-calling LLM backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    /// Ollama local LLM (OpenAI-compatible)
    Ollama,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "ollama" => Ok(ProviderType::Ollama),
            _ => Err(format!("Unknown provider type: {}", s)),
        }
    }
}

/// Error type for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthError(String),
}

impl ProviderError {
    /// HTTP status reported by the provider, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::ApiError { status, .. } => Some(*status),
            ProviderError::RateLimited => Some(429),
            ProviderError::AuthError(_) => Some(401),
            ProviderError::RequestFailed(_) | ProviderError::ParseError(_) => None,
        }
    }
}

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A tool call requested by the LLM.
///
/// `arguments` holds the raw argument string exactly as the model produced
/// it; decoding is left to the caller so malformed JSON can be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Tool definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Configuration for a chat request
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Force tool usage: "auto", "required", "none", or specific tool name
    pub tool_choice: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            max_tokens: 1500,
            tool_choice: None,
        }
    }
}

/// A complete chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Option<Vec<ToolDefinition>>,
    pub config: ChatConfig,
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    /// Text response from the LLM
    Text {
        content: String,
        usage: Option<TokenUsage>,
    },
    /// LLM wants to call tools
    ToolCalls {
        calls: Vec<ToolCallRequest>,
        /// Any text the model sent alongside the calls
        content: String,
        usage: Option<TokenUsage>,
    },
}

impl ProviderResponse {
    /// Free-text part of the reply (empty when the model sent none)
    pub fn text(&self) -> &str {
        match self {
            ProviderResponse::Text { content, .. } => content,
            ProviderResponse::ToolCalls { content, .. } => content,
        }
    }

    /// Get the tool calls if this is a tool call response
    pub fn tool_calls(&self) -> Option<&[ToolCallRequest]> {
        match self {
            ProviderResponse::Text { .. } => None,
            ProviderResponse::ToolCalls { calls, .. } => Some(calls),
        }
    }

    /// Get token usage if available
    pub fn usage(&self) -> Option<&TokenUsage> {
        match self {
            ProviderResponse::Text { usage, .. } => usage.as_ref(),
            ProviderResponse::ToolCalls { usage, .. } => usage.as_ref(),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LLMProviderTrait: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> ProviderType;

    /// Get the provider name for logging/display
    fn name(&self) -> &'static str;

    /// Check if this provider is properly configured and ready
    fn is_configured(&self) -> bool;

    /// Get the default model for this provider
    fn default_model(&self) -> &str;

    /// Send a chat request and get a response
    async fn chat(&self, request: ChatRequest) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_type_round_trips_through_strings() {
        assert_eq!("OpenAI".parse::<ProviderType>(), Ok(ProviderType::OpenAI));
        assert_eq!("ollama".parse::<ProviderType>(), Ok(ProviderType::Ollama));
        assert!("anthropic".parse::<ProviderType>().is_err());
        assert_eq!(ProviderType::Ollama.to_string(), "ollama");
    }

    #[test]
    fn provider_error_reports_status() {
        let err = ProviderError::ApiError {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(ProviderError::RateLimited.status(), Some(429));
        assert_eq!(ProviderError::RequestFailed("dns".into()).status(), None);
    }

    #[test]
    fn response_text_is_available_for_both_shapes() {
        let text = ProviderResponse::Text {
            content: "hello".to_string(),
            usage: None,
        };
        assert_eq!(text.text(), "hello");
        assert!(text.tool_calls().is_none());

        let calls = ProviderResponse::ToolCalls {
            calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "delete_task".to_string(),
                arguments: "{}".to_string(),
            }],
            content: String::new(),
            usage: None,
        };
        assert_eq!(calls.tool_calls().map(<[_]>::len), Some(1));
    }
}
