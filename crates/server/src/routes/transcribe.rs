use axum::{
    Json,
    extract::{Multipart, State},
};
use navi::Transcription;

use crate::{AppState, error::ApiError};

const AUDIO_FIELD: &str = "audio";
const DEFAULT_FILE_NAME: &str = "audio.webm";
const DEFAULT_MIME: &str = "audio/webm";

/// `POST /api/transcribe` with the recording in the `audio` multipart field
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Transcription>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
        let mime_type = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
        let audio = field.bytes().await?;
        if audio.is_empty() {
            return Err(ApiError::MissingAudio);
        }

        tracing::info!(%file_name, %mime_type, bytes = audio.len(), "transcribing upload");
        let transcription = state
            .stt
            .transcribe(audio.to_vec(), &file_name, &mime_type)
            .await?;
        return Ok(Json(transcription));
    }

    Err(ApiError::MissingAudio)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use navi::brain::{ChatConfig, ChatRequest, ProviderResponse};
    use navi::voice::SttResult;
    use navi::{
        LLMProviderTrait, ProviderError, ProviderType, SpeechToText, SttError, Transcription,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{AppState, routes::router};

    struct IdleProvider;

    #[async_trait]
    impl LLMProviderTrait for IdleProvider {
        fn provider_type(&self) -> ProviderType {
            ProviderType::OpenAI
        }

        fn name(&self) -> &'static str {
            "idle"
        }

        fn is_configured(&self) -> bool {
            false
        }

        fn default_model(&self) -> &str {
            "idle"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::AuthError("no key".to_string()))
        }
    }

    /// Records uploads and answers with a fixed transcript
    #[derive(Default)]
    struct RecordingStt {
        uploads: Mutex<Vec<(usize, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechToText for RecordingStt {
        async fn transcribe(
            &self,
            audio: Vec<u8>,
            file_name: &str,
            mime_type: &str,
        ) -> SttResult<Transcription> {
            self.uploads.lock().unwrap().push((
                audio.len(),
                file_name.to_string(),
                mime_type.to_string(),
            ));
            if self.fail {
                return Err(SttError::Provider("upstream 502".to_string()));
            }
            Ok(Transcription {
                text: "add groceries tomorrow".to_string(),
            })
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    const BOUNDARY: &str = "navi-test-boundary";

    fn multipart_body(field: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"note.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(stt: Arc<RecordingStt>, body: Vec<u8>) -> (StatusCode, Value) {
        let app = router(AppState::new(
            Arc::new(IdleProvider),
            ChatConfig::default(),
            stt,
        ));
        let request = Request::builder()
            .method("POST")
            .uri("/api/transcribe")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn audio_field_is_transcribed() {
        let stt = Arc::new(RecordingStt::default());

        let (status, json) = upload(stt.clone(), multipart_body("audio", b"RIFFdata")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["text"], "add groceries tomorrow");
        let uploads = stt.uploads.lock().unwrap();
        assert_eq!(
            uploads.as_slice(),
            [(8, "note.webm".to_string(), "audio/webm".to_string())]
        );
    }

    #[tokio::test]
    async fn missing_audio_field_is_rejected() {
        let stt = Arc::new(RecordingStt::default());

        let (status, json) = upload(stt.clone(), multipart_body("file", b"RIFFdata")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No audio file provided");
        assert!(stt.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_a_generic_500() {
        let stt = Arc::new(RecordingStt {
            fail: true,
            ..RecordingStt::default()
        });

        let (status, json) = upload(stt, multipart_body("audio", b"RIFFdata")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Error transcribing audio");
    }
}
