use crate::error::ConfigError;
use crate::settings::{ExecutionMode, Settings};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// Output goes through a non-blocking stdout writer; the returned guard
/// flushes it on drop and must be held until the process exits. `RUST_LOG`
/// overrides the default `info` filter. Colour codes are dropped whenever the
/// output is likely to land in a log collector rather than a terminal.
pub fn init_tracing(settings: &Settings, mode: ExecutionMode) -> Result<WorkerGuard, ConfigError> {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = !settings.is_production() && mode == ExecutionMode::Server;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    Ok(guard)
}
