use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use super::{SttConfig, SttError, SttResult};

/// Body of a successful transcription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Transcription {
    pub text: String,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> SttResult<Transcription>;

    fn is_ready(&self) -> bool;
}

/// OpenAI Whisper over `/v1/audio/transcriptions`
#[derive(Debug)]
pub struct WhisperSTT {
    config: SttConfig,
    client: reqwest::Client,
}

impl WhisperSTT {
    pub fn new(config: SttConfig) -> Self {
        info!("Initializing Whisper STT with model: {}", config.model);
        if config.api_key.is_none() {
            warn!("Whisper STT created without OPENAI_API_KEY; transcription requests will fail");
        }
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn transcriptions_url(&self) -> String {
        format!(
            "{}/v1/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SpeechToText for WhisperSTT {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> SttResult<Transcription> {
        let api_key = self.config.api_key.as_ref().ok_or(SttError::NotConfigured)?;
        let started = Instant::now();
        let size = audio.len();

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|_| SttError::UnsupportedFormat(mime_type.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());

        let response = self
            .client
            .post(self.transcriptions_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SttError::Provider(format!(
                "Whisper API error ({status}): {error_text}"
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let text = body["text"]
            .as_str()
            .ok_or_else(|| SttError::Provider("response has no text".to_string()))?
            .to_string();

        info!(
            bytes = size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "audio transcribed"
        );
        Ok(Transcription { text })
    }

    fn is_ready(&self) -> bool {
        self.config.api_key.is_some()
    }
}
