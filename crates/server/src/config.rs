use navi::{LLMConfig, SttConfig};

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// 0 lets the OS pick a free port
    pub port: u16,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
    pub llm: LLMConfig,
    pub stt: SttConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        config.llm = LLMConfig::from_env();
        config.stt = SttConfig::from_env();
        config
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("BACKEND_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|raw| raw.trim().parse::<u16>().ok())
            .unwrap_or_else(|| {
                tracing::info!("No PORT environment variable set, using port 0 for auto-assignment");
                0
            });

        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let cors_origins = lookup("NAVI_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            cors_origins,
            llm: LLMConfig::default(),
            stt: SttConfig::default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
