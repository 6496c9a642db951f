//! # tuigpt CLI
//!
//! Interactive terminal assistant. The model answers in plain text or in
//! directives that run on this machine.
//!
//! Usage:
//!   tuigpt
//!   tuigpt --provider anthropic --model claude-sonnet-4-20250514
//!   tuigpt --provider local --base-url http://localhost:11434/v1 --model llama3.1
//!
//! Type `exit` (or send end of input) to leave; Ctrl-C aborts.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Color;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuigpt_agent::{ExitReason, Session, SessionConfig, Step};
use tuigpt_core::{Console, ConfiguredProvider, LlmProvider, ProviderConfig, ProviderType, SessionContext};

const TRUST_BOUNDARY: &str = "\
SECURITY: lines of the form `cmd <command>` in a model reply are executed by \
the system shell (sh -c / cmd.exe /C) with your privileges, without \
confirmation or filtering. `file` blocks append to files under the working \
directory. Only use models and endpoints you trust.";

#[derive(Parser, Debug)]
#[command(name = "tuigpt")]
#[command(version, about = "tuigpt - terminal assistant that can run commands and edit files")]
#[command(after_help = TRUST_BOUNDARY)]
struct Cli {
    /// Completion backend: openai, anthropic or local
    #[arg(long, env = "TUIGPT_PROVIDER", default_value = "openai")]
    provider: String,

    /// Base URL of the API (any OpenAI-compatible server for openai/local)
    #[arg(long, env = "TUIGPT_BASE_URL")]
    base_url: Option<String>,

    /// Model to use
    #[arg(short, long, env = "TUIGPT_MODEL")]
    model: Option<String>,

    /// API key (falls back to OPENAI_API_KEY / ANTHROPIC_API_KEY)
    #[arg(long, env = "TUIGPT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, env = "TUIGPT_TIMEOUT", value_name = "SECS")]
    timeout: Option<u64>,

    /// Write debug logs to <tmp>/tuigpt.log
    #[arg(long, env = "TUIGPT_DEBUG")]
    debug: bool,
}

impl Cli {
    fn provider_config(&self) -> Result<ProviderConfig> {
        let provider_type: ProviderType = self.provider.parse()?;
        let mut config = ProviderConfig::for_type(provider_type);

        if let Some(key) = self.api_key.clone().or_else(|| fallback_api_key(provider_type)) {
            config = config.with_api_key(key);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

fn fallback_api_key(provider_type: ProviderType) -> Option<String> {
    let var = match provider_type {
        ProviderType::OpenAI => "OPENAI_API_KEY",
        ProviderType::Anthropic => "ANTHROPIC_API_KEY",
        ProviderType::Local => return None,
    };
    std::env::var(var).ok().filter(|key| !key.is_empty())
}

/// Warnings to stderr by default; with `--debug`, everything from debug up
/// goes to a log file so the REPL stays readable.
fn init_logging(debug: bool) -> Result<Option<PathBuf>> {
    let filter = if debug { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if debug {
        let log_path = std::env::temp_dir().join("tuigpt.log");
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file {}", log_path.display()))?;

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .init();
        Ok(Some(log_path))
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
        Ok(None)
    }
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn interrupted<P: LlmProvider>(session: &mut Session<P>) -> ExitReason {
    let console = session.console_mut();
    let message = console.paint("\nВыход...", Color::Yellow);
    console.line(message);
    ExitReason::Interrupted
}

async fn run(cli: Cli) -> Result<ExitReason> {
    let provider = ConfiguredProvider::from_config(cli.provider_config()?)?;
    tracing::info!(provider = provider.name(), model = provider.default_model(), "provider ready");

    let ctx = SessionContext::from_current_dir()?;
    let mut session = Session::new(provider, Console::stdout(), ctx, SessionConfig::default());

    let tools = session.probe_tools().await;
    session.prime(&tools);
    if let Err(reason) = session.handshake(interrupt()).await {
        return Ok(reason);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        session.show_prompt();

        let input = tokio::select! {
            biased;
            _ = interrupt() => return Ok(interrupted(&mut session)),
            line = lines.next_line() => line.context("failed to read from stdin")?,
        };
        let Some(input) = input else {
            return Ok(ExitReason::Normal);
        };

        let step = tokio::select! {
            biased;
            _ = interrupt() => return Ok(interrupted(&mut session)),
            step = session.handle_input(&input) => step,
        };
        if step == Step::Exit {
            return Ok(ExitReason::Normal);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match init_logging(cli.debug) {
        Ok(Some(path)) => eprintln!("Debug logs written to: {}", path.display()),
        Ok(None) => {}
        Err(e) => eprintln!("Ошибка: {:#}", e),
    }

    let reason = match run(cli).await {
        Ok(reason) => reason,
        Err(e) => {
            tracing::error!(error = %e, "startup failed");
            eprintln!("Ошибка: {:#}", e);
            ExitReason::ConfigError
        }
    };

    std::process::exit(reason.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["tuigpt", "--api-key", "sk-test"]).unwrap();
        let config = cli.provider_config().unwrap();

        assert_eq!(config.provider_type, ProviderType::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.default_model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_cli_local_overrides() {
        let cli = Cli::try_parse_from([
            "tuigpt",
            "--provider",
            "local",
            "--base-url",
            "http://127.0.0.1:1337/v1",
            "--model",
            "qwen2.5",
            "--timeout",
            "30",
        ])
        .unwrap();
        let config = cli.provider_config().unwrap();

        assert_eq!(config.provider_type, ProviderType::Local);
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:1337/v1"));
        assert_eq!(config.default_model.as_deref(), Some("qwen2.5"));
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let cli = Cli::try_parse_from(["tuigpt", "--provider", "g4f"]).unwrap();
        let err = cli.provider_config().unwrap_err();
        assert!(err.to_string().contains("unknown provider"));
    }

    #[test]
    fn test_help_mentions_trust_boundary() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("executed by the system shell"));
    }
}
