//! LLM provider seam
//!
//! Everything above this module talks to the model through
//! [`LLMProviderTrait`]; tests substitute a scripted implementation.

mod openai;
mod provider_trait;

pub use openai::OpenAIProvider;
pub use provider_trait::{
    ChatConfig, ChatMessage, ChatRequest, LLMProviderTrait, MessageRole, ProviderError,
    ProviderResponse, ProviderType, TokenUsage, ToolCallRequest, ToolDefinition,
};
