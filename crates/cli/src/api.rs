//! HTTP client for the Navi server

use std::path::Path;

use anyhow::{Context, Result};
use navi::{AiCommandRequest, AiCommandResponse, Transcription};
use reqwest::Client;
use serde::Deserialize;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// `GET /api/health` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub llm_provider: String,
    pub llm_configured: bool,
    pub stt_ready: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Failure bodies share the success shape, so any parseable body is
    /// returned as-is and only transport or decoding problems are errors.
    pub async fn send_command(&self, request: &AiCommandRequest) -> Result<AiCommandResponse> {
        let resp = self
            .client
            .post(format!("{}/api/ai-command", self.base_url))
            .json(request)
            .send()
            .await
            .with_context(|| format!("Could not reach the Navi server at {}", self.base_url))?;

        let status = resp.status();
        let text = resp.text().await?;
        tracing::debug!(%status, body = %text, "ai-command response");

        match serde_json::from_str::<AiCommandResponse>(&text) {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => {
                anyhow::bail!("Server responded with {}: {}", status, text)
            }
            Err(e) => Err(e).context("Failed to parse ai-command response"),
        }
    }

    pub async fn transcribe(&self, path: &Path) -> Result<String> {
        let audio = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.webm".to_string());

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name)
            .mime_str(audio_mime(path))?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let resp = self
            .client
            .post(format!("{}/api/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Could not reach the Navi server at {}", self.base_url))?;

        let status = resp.status();
        if status.is_success() {
            let transcription: Transcription = resp
                .json()
                .await
                .context("Failed to parse transcription response")?;
            Ok(transcription.text)
        } else {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            anyhow::bail!("Transcription failed ({}): {}", status, message)
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
            .with_context(|| format!("Could not reach the Navi server at {}", self.base_url))?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            anyhow::bail!("Health check failed: {}", resp.status())
        }
    }
}

/// Content type for an audio file, by extension
pub fn audio_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "audio/webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        assert_eq!(
            ApiClient::new("http://localhost:3001/").base_url(),
            "http://localhost:3001"
        );
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(audio_mime(Path::new("memo.WAV")), "audio/wav");
        assert_eq!(audio_mime(Path::new("memo.m4a")), "audio/mp4");
        assert_eq!(audio_mime(Path::new("recording")), "audio/webm");
    }
}
