use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use navi::{AiCommandRequest, AiCommandResponse};

use crate::{AppState, error::ApiError};

/// `POST /api/ai-command`
pub async fn ai_command(
    State(state): State<AppState>,
    payload: Result<Json<AiCommandRequest>, JsonRejection>,
) -> Result<Json<AiCommandResponse>, ApiError> {
    let Json(request) = payload?;
    let response = state.assistant.handle(request).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use navi::brain::{
        ChatConfig, ChatRequest, ProviderResponse, ToolCallRequest,
    };
    use navi::{LLMProviderTrait, ProviderError, ProviderType, SpeechToText, Transcription};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{AppState, routes::router};

    struct ScriptedProvider {
        reply: Mutex<Option<Result<ProviderResponse, ProviderError>>>,
    }

    #[async_trait]
    impl LLMProviderTrait for ScriptedProvider {
        fn provider_type(&self) -> ProviderType {
            ProviderType::OpenAI
        }

        fn name(&self) -> &'static str {
            "scripted"
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn default_model(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ProviderResponse, ProviderError> {
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("provider called more than once")
        }
    }

    struct SilentStt;

    #[async_trait]
    impl SpeechToText for SilentStt {
        async fn transcribe(
            &self,
            _audio: Vec<u8>,
            _file_name: &str,
            _mime_type: &str,
        ) -> navi::voice::SttResult<Transcription> {
            Ok(Transcription {
                text: String::new(),
            })
        }

        fn is_ready(&self) -> bool {
            false
        }
    }

    fn app(reply: Result<ProviderResponse, ProviderError>) -> axum::Router {
        let provider = Arc::new(ScriptedProvider {
            reply: Mutex::new(Some(reply)),
        });
        router(AppState::new(provider, ChatConfig::default(), Arc::new(SilentStt)))
    }

    fn create_call(arguments: Value) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse::ToolCalls {
            calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "create_task".to_string(),
                arguments: arguments.to_string(),
            }],
            content: String::new(),
            usage: None,
        })
    }

    async fn post(app: axum::Router, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn create_command_returns_the_new_task() {
        let app = app(create_call(json!({
            "title": "Dentist",
            "dueDate": "2024-05-06T15:00:00",
            "priority": "high",
            "steps": ["Call ahead"]
        })));
        let body = json!({
            "input": "dentist on monday at 3pm",
            "taskList": [],
            "userTimeZone": "America/New_York"
        });

        let (status, json) = post(app, "/api/ai-command", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Task created successfully");
        assert_eq!(json["data"]["action"], "create_task");
        assert_eq!(json["data"]["task"]["title"], "Dentist");
        assert_eq!(json["data"]["task"]["dueDate"], "2024-05-06T19:00:00Z");
        assert_eq!(json["data"]["task"]["priority"], "high");
        assert_eq!(json["data"]["context"]["lastMentionedTask"], "Dentist");
    }

    #[tokio::test]
    async fn legacy_path_is_served_too() {
        let app = app(Ok(ProviderResponse::Text {
            content: "You have nothing due today.".to_string(),
            usage: None,
        }));
        let body = json!({ "input": "what is due today?", "userTimeZone": "UTC" });

        let (status, json) = post(app, "/api/ai-assistant", &body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["action"], "query");
        assert_eq!(json["data"]["response"], "You have nothing due today.");
    }

    #[tokio::test]
    async fn blank_input_is_a_bad_request() {
        let app = app(create_call(json!({})));
        let body = json!({ "input": "   ", "userTimeZone": "UTC" });

        let (status, json) = post(app, "/api/ai-command", &body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid input provided");
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app(create_call(json!({})));

        let (status, json) = post(app, "/api/ai-command", "{\"input\": ").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid input provided");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn modify_of_unknown_task_is_not_found() {
        let app = app(Ok(ProviderResponse::ToolCalls {
            calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "modify_task".to_string(),
                arguments: json!({ "id": 99, "title": "Ghost" }).to_string(),
            }],
            content: String::new(),
            usage: None,
        }));
        let body = json!({ "input": "rename task 99", "userTimeZone": "UTC" });

        let (status, json) = post(app, "/api/ai-command", &body.to_string()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Task not found");
        assert_eq!(json["error"], "The task to modify does not exist");
    }

    #[tokio::test]
    async fn provider_failures_surface_their_status() {
        let app = app(Err(ProviderError::RateLimited));
        let body = json!({ "input": "add a task", "userTimeZone": "UTC" });

        let (status, json) = post(app, "/api/ai-command", &body.to_string()).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["success"], false);
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .starts_with("OpenAI API error: ")
        );
    }

    #[tokio::test]
    async fn unknown_time_zone_is_a_bad_request() {
        let app = app(create_call(json!({ "title": "x" })));
        let body = json!({ "input": "add x", "userTimeZone": "Mars/Olympus_Mons" });

        let (status, json) = post(app, "/api/ai-command", &body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }
}
