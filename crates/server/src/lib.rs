pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use navi::{LLMProviderTrait, SpeechToText, TaskAssistant, WhisperSTT};

use crate::config::ServerConfig;

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub assistant: TaskAssistant,
    pub stt: Arc<dyn SpeechToText>,
    pub cors_origins: Arc<[String]>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn LLMProviderTrait>,
        chat: navi::brain::ChatConfig,
        stt: Arc<dyn SpeechToText>,
    ) -> Self {
        Self {
            assistant: TaskAssistant::new(provider, chat),
            stt,
            cors_origins: Arc::from(Vec::new()),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let provider = config.llm.build_provider();
        if !provider.is_configured() {
            tracing::warn!(
                "{} provider is not configured; AI commands will fail until OPENAI_API_KEY is set",
                provider.name()
            );
        }
        let stt: Arc<dyn SpeechToText> = Arc::new(WhisperSTT::new(config.stt.clone()));

        Self {
            cors_origins: Arc::from(config.cors_origins.clone()),
            ..Self::new(provider, config.llm.chat_config(), stt)
        }
    }
}
