use axum::{Json, extract::State};
use serde::Serialize;
use ts_rs::TS;

use crate::AppState;

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub llm_provider: String,
    pub llm_configured: bool,
    pub stt_ready: bool,
}

/// Liveness plus whether the upstream providers have credentials
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let provider = state.assistant.provider();
    Json(HealthStatus {
        status: "ok".to_string(),
        llm_provider: provider.name().to_string(),
        llm_configured: provider.is_configured(),
        stt_ready: state.stt.is_ready(),
    })
}
