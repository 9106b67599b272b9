use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::{AppState, middleware as app_middleware};

pub mod assistant;
pub mod health;
pub mod transcribe;

/// Whisper rejects uploads above 25 MB
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ai-command", post(assistant::ai_command))
        // older path still posted to by the web client
        .route("/ai-assistant", post(assistant::ai_command))
        .route(
            "/transcribe",
            post(transcribe::transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(middleware::from_fn(app_middleware::request_id_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(app_middleware::REQUEST_ID_HEADER),
        ]);

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
