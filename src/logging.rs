//! Logging configuration for the portfolio chat backend

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

const LOG_FILE_NAME: &str = "portfolio-chat.log";

/// Filter for `level`; `RUST_LOG` takes precedence when set
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},portfolio_chat={level}")))
}

/// Initialize logging with console and daily-rolling file output.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    init_logging_with_level(config, &config.level)
}

/// Initialize logging, overriding the configured level
pub fn init_logging_with_level(config: &LoggingConfig, level: &str) -> Result<WorkerGuard> {
    // Create logs directory if it doesn't exist
    let logs_dir = Path::new(&config.directory);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    // Set up file appender for all logs
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter(level))
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized with level: {} - console and file output enabled", level);
    tracing::info!(
        "Log files will be saved to: {}/{}.YYYY-MM-DD",
        config.directory,
        LOG_FILE_NAME
    );

    Ok(guard)
}

/// Initialize simple console-only logging for tests and one-shot commands
pub fn init_simple_logging(level: &str) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .try_init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization() {
        // Repeated initialization must not panic
        assert!(init_simple_logging("info").is_ok());
        assert!(init_simple_logging("debug").is_ok());
    }
}
