//! Speech-to-text boundary used by the transcription endpoint

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub mod stt;

pub use stt::{SpeechToText, Transcription, WhisperSTT};

pub const OPENAI_API_BASE: &str = "https://api.openai.com";

#[derive(Debug, thiserror::Error)]
pub enum SttError {
    #[error("STT error: {0}")]
    Provider(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Speech-to-text is not configured")]
    NotConfigured,
}

pub type SttResult<T> = Result<T, SttError>;

/// Whisper transcription settings
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SttConfig {
    pub model: String,
    pub endpoint: String,
    #[serde(skip)]
    #[ts(skip)]
    pub api_key: Option<String>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            endpoint: OPENAI_API_BASE.to_string(),
            api_key: None,
        }
    }
}

impl SttConfig {
    /// Reads `NAVI_STT_MODEL`, `NAVI_STT_ENDPOINT` and `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            model: var("NAVI_STT_MODEL").unwrap_or(defaults.model),
            endpoint: var("NAVI_STT_ENDPOINT").unwrap_or(defaults.endpoint),
            api_key: var("OPENAI_API_KEY"),
        }
    }
}
