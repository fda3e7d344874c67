//! Chocoblast bot entry point.
//!
//! Reads command invocations from stdin (see [`console`]) and answers on
//! stdout until stdin closes or Ctrl-C is received.
mod config;
mod console;
mod dirs;
mod dispatch;

use std::path::Path;

use anyhow::{Context, Result};
use ledger::{Clock, Ledger, SystemClock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::BotConfig;
use dispatch::Dispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = BotConfig::from_env()?;

    let log_dir = config.log_dir.clone().unwrap_or_else(dirs::log_dir);
    setup_logging(&log_dir)?;
    tracing::debug!("Gateway credential loaded ({} bytes)", config.token.len());

    let ledger = Ledger::start(config.ledger.clone())
        .await
        .context("failed to start ledger")?;
    let dispatcher = Dispatcher::new(ledger.handle(), config.admin_role_id.clone());

    run_console(&dispatcher).await?;

    ledger.shutdown().await?;
    Ok(())
}

async fn run_console(dispatcher: &Dispatcher) -> Result<()> {
    let clock = SystemClock;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!("Console ready");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    tracing::info!("stdin closed");
                    break;
                };

                match console::parse_line(&line) {
                    Ok(Some(invocation)) => {
                        let reply = dispatcher.dispatch(&invocation, clock.now()).await;
                        println!("{reply}");
                    }
                    Ok(None) => {}
                    Err(e) => println!("Erreur : {e}"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::info!("Ctrl-C received");
                break;
            }
        }
    }

    Ok(())
}

/// Setup logging to both stderr and file
fn setup_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "chocoblast.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    // Leak the guard to keep file writer alive
    std::mem::forget(guard);

    tracing::info!("Log file: {}/chocoblast.log", log_dir.display());
    Ok(())
}
