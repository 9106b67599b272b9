use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use navi::{AiCommandResponse, AssistantError, SttError};
use serde::Serialize;
use thiserror::Error;

pub const MSG_INVALID_INPUT: &str = "Invalid input provided";
pub const MSG_NO_AUDIO: &str = "No audio file provided";
pub const MSG_TRANSCRIBE_FAILED: &str = "Error transcribing audio";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("No audio file provided")]
    MissingAudio,
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Transcription(#[from] SttError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `{ "error": ... }` body of the transcription endpoint
#[derive(Debug, Serialize, ts_rs::TS)]
pub struct TranscribeErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Assistant(err) => {
                let status = StatusCode::from_u16(err.status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    tracing::error!(%status, "assistant failure: {err}");
                } else {
                    tracing::warn!(%status, "assistant rejected command: {err}");
                }
                (status, Json(err.to_response())).into_response()
            }
            ApiError::BadRequest(detail) => {
                tracing::warn!("malformed command body: {detail}");
                let body = AiCommandResponse::failure(MSG_INVALID_INPUT, Some(detail));
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::MissingAudio => {
                transcribe_error(StatusCode::BAD_REQUEST, MSG_NO_AUDIO)
            }
            ApiError::Multipart(err) => {
                tracing::error!("failed to read audio upload: {err}");
                transcribe_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_TRANSCRIBE_FAILED)
            }
            ApiError::Transcription(err) => {
                tracing::error!("transcription failed: {err}");
                transcribe_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_TRANSCRIBE_FAILED)
            }
        }
    }
}

fn transcribe_error(status: StatusCode, message: &str) -> Response {
    let body = TranscribeErrorBody {
        error: message.to_string(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use navi::ProviderError;

    use super::*;

    #[test]
    fn assistant_errors_keep_their_status() {
        let response = ApiError::from(AssistantError::TaskNotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(AssistantError::Provider(ProviderError::ApiError {
            status: 401,
            message: "bad key".to_string(),
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn transcription_failures_are_500() {
        let response = ApiError::from(SttError::NotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::MissingAudio.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
