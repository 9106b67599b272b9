//! Navi CLI - terminal front end for the Navi task assistant
//!
//! Keeps the task list and conversation locally and sends each command to
//! the Navi server, which decides what to create, modify or delete.

mod api;
mod config;
mod output;
mod repl;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use navi::AssistantSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{api::ApiClient, config::Config, output::OutputHandler};

const FALLBACK_TIME_ZONE: &str = "UTC";

/// Navi CLI - AI task assistant
#[derive(Parser)]
#[command(name = "navi-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage tasks by talking to an AI assistant")]
#[command(long_about = r#"
Navi turns plain sentences into tasks with due dates, priorities and steps.

Examples:
  navi-cli                                   # Start an interactive session
  navi-cli ask "gym tomorrow at 7am"         # Send a single command
  navi-cli transcribe memo.webm              # Transcribe a recording
  navi-cli config --set session.time_zone=Europe/Berlin
"#)]
struct Cli {
    /// Server URL (overrides server.url from the config file)
    #[arg(long, env = "NAVI_SERVER_URL")]
    server: Option<String>,

    /// IANA time zone for due dates (defaults to the system zone)
    #[arg(long, env = "NAVI_TIME_ZONE")]
    time_zone: Option<String>,

    /// Your role, used to tailor suggested steps
    #[arg(long)]
    role: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one command and print the reply
    Ask {
        /// What you want done
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },

    /// Transcribe an audio file
    Transcribe {
        /// Path to the recording
        file: PathBuf,
    },

    /// Check that the server is up and configured
    Health,

    /// Configuration management
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set a configuration value (key=value)
        #[arg(long)]
        set: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("navi_cli={level},navi={level},warn", level = log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = Config::load()?;
    let output = OutputHandler::new();

    if let Some(Commands::Config { show, set }) = &cli.command {
        if let Some(kv) = set {
            let (key, value) = kv
                .split_once('=')
                .context("Expected key=value, e.g. server.url=http://localhost:3001")?;
            config.set(key.trim(), value)?;
            config.save()?;
            output.print_success(&format!("Saved {}", Config::config_path().display()));
        }
        if *show || set.is_none() {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        return Ok(());
    }

    let server_url = cli.server.clone().unwrap_or_else(|| config.server.url.clone());
    let api = ApiClient::new(&server_url);

    match cli.command {
        Some(Commands::Ask { input }) => {
            let session = build_session(cli.time_zone.as_deref(), cli.role.as_deref(), &config)?;
            let mut repl = repl::NaviRepl::new(api, session)?;
            repl.process_input(&input.join(" ")).await;
        }
        Some(Commands::Transcribe { file }) => {
            let text = api.transcribe(&file).await?;
            println!("{}", text);
        }
        Some(Commands::Health) => {
            let health = api.health().await?;
            output.print_success(&format!("Server {} at {}", health.status, api.base_url()));
            output.print_info(&format!(
                "LLM: {} ({})",
                health.llm_provider,
                if health.llm_configured { "configured" } else { "missing API key" }
            ));
            output.print_info(&format!(
                "Speech-to-text: {}",
                if health.stt_ready { "ready" } else { "missing API key" }
            ));
        }
        Some(Commands::Config { .. }) => {}
        None => {
            let session = build_session(cli.time_zone.as_deref(), cli.role.as_deref(), &config)?;
            let mut repl = repl::NaviRepl::new(api, session)?;
            repl.run().await?;
        }
    }

    Ok(())
}

/// Flag, then config file, then the system zone, then UTC
fn build_session(
    time_zone: Option<&str>,
    role: Option<&str>,
    config: &Config,
) -> Result<AssistantSession> {
    let system_zone = jiff::tz::TimeZone::system()
        .iana_name()
        .map(str::to_string);
    let zone = time_zone
        .map(str::to_string)
        .or_else(|| config.session.time_zone.clone())
        .or(system_zone)
        .unwrap_or_else(|| FALLBACK_TIME_ZONE.to_string());

    let session = AssistantSession::new(&zone)
        .with_context(|| format!("Cannot use time zone {}", zone))?
        .with_user_role(role.map(str::to_string).or_else(|| config.session.user_role.clone()));
    Ok(session)
}
