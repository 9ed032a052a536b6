mod client;
mod config;
mod input;
mod panel;
mod protocol;
mod server;
mod shell;
mod ui;
mod widget;

use clap::Parser;
use client::{AssistantClient, ClientConfig};
use config::{ChatConfig, Cli, Command};
use server::ServerConfig;
use shell::{Shell, ShellSettings};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

type AppResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const DEFAULT_LOG_FILTER: &str = "tutor=info";

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();

    match Cli::parse().into_command() {
        Command::Chat(args) => run_chat(ChatConfig::from(args)),
        Command::Serve(args) => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(env_filter())
                .init();
            server::run(ServerConfig {
                listen: args.listen,
            })
            .await
        }
    }
}

fn run_chat(config: ChatConfig) -> AppResult<()> {
    // Held until the UI exits so buffered log lines are flushed.
    let _log_guard = match &config.log_file {
        Some(path) => Some(init_file_logging(path)?),
        None => None,
    };

    let client = AssistantClient::new(ClientConfig {
        endpoint: config.endpoint,
        timeout: config.timeout,
    })?;
    tracing::info!(endpoint = client.endpoint(), "starting chat ui");

    let (sender, receiver) = mpsc::channel(32);
    let mut shell = Shell::new(
        ShellSettings {
            reply_delay: config.reply_delay,
            keep_on_close: config.keep_on_close,
        },
        Arc::new(client),
        sender,
    );
    if config.open {
        shell.open();
    }

    ui::run_tui(shell, receiver)
}

fn init_file_logging(path: &Path) -> AppResult<WorkerGuard> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let (writer, guard) = tracing_appender::non_blocking(rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(env_filter())
        .init();
    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
