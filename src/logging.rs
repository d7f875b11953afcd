//! Tracing setup for the server binary.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::StreamConfig;
use crate::error::ConfigError;

const LOG_FILE_PREFIX: &str = "sign-stream.log";
const DEFAULT_FILTER: &str = "info";

/// Keeps the file writer flushing. Hold it for the life of the process.
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Install the global subscriber: human-readable stderr, plus daily-rolling
/// JSON files when a log directory is configured. `RUST_LOG` filters both.
pub fn init_tracing(config: &StreamConfig) -> Result<LoggingGuard, ConfigError> {
    let rust_log = std::env::var("RUST_LOG").ok();

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(build_env_filter(rust_log.as_deref()));

    let (file_layer, worker_guard) = match &config.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(build_env_filter(rust_log.as_deref()));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::ParseError(format!("failed to initialize tracing: {}", e)))?;

    tracing::debug!(
        log_dir = ?config.log_dir,
        filter = rust_log.as_deref().unwrap_or(DEFAULT_FILTER),
        "logging initialized"
    );

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        log_dir: config.log_dir.clone(),
    })
}

/// Filter from a `RUST_LOG`-style directive, falling back to `info` when
/// absent or unparsable.
fn build_env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
