//! Configuration management for Navi CLI
//!
//! Handles loading and saving configuration from ~/.navi/config.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Configuration for Navi CLI
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionConfig {
    /// IANA zone name; the system zone when unset
    #[serde(default)]
    pub time_zone: Option<String>,

    /// Passed to the assistant to tailor task steps
    #[serde(default)]
    pub user_role: Option<String>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".navi")
            .join("config.toml")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a configuration value by key path (e.g., "server.url")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "url"] => Some(self.server.url.clone()),
            ["session", "time_zone"] => self.session.time_zone.clone(),
            ["session", "user_role"] => self.session.user_role.clone(),
            _ => None,
        }
    }

    /// Set a configuration value by key path. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        let optional = || Some(value.trim().to_string()).filter(|v| !v.is_empty());

        match parts.as_slice() {
            ["server", "url"] => {
                let url = value.trim();
                if url.is_empty() {
                    anyhow::bail!("server.url cannot be empty");
                }
                self.server.url = url.trim_end_matches('/').to_string();
            }
            ["session", "time_zone"] => {
                if let Some(zone) = optional() {
                    navi::datetime::resolve_time_zone(&zone)?;
                }
                self.session.time_zone = optional();
            }
            ["session", "user_role"] => self.session.user_role = optional(),
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }

        Ok(())
    }
}
