use anyhow::Context;
use server::{AppState, config::ServerConfig, routes};
use tracing_subscriber::{EnvFilter, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from `.env` if present so local development picks up API keys
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!("warn,server={level},navi={level}", level = log_level);
    let env_filter =
        EnvFilter::try_new(filter_string).context("Failed to create tracing filter")?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        stt_model = %config.stt.model,
        "starting navi server"
    );

    let app_router = routes::router(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    let actual_port = listener.local_addr()?.port();

    tracing::info!("Server running on http://{}:{actual_port}", config.host);

    axum::serve(listener, app_router).await?;
    Ok(())
}
