//! Tracing initialization.
//!
//! Console layer with an `EnvFilter` (overridable through `RUST_LOG`), plus
//! an optional JSON file layer backed by a non-blocking daily-rolling
//! appender. Events throughout the crate carry `marker` and
//! `operation_type` fields so the JSON stream groups cleanly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Directory for the JSON log files; `None` disables the file layer.
    pub log_dir: Option<PathBuf>,

    pub log_file_prefix: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_dir: None,
            log_file_prefix: "manta".into(),
        }
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard; dropping it flushes and stops the background
/// writer, so callers hold it for the process lifetime. Errors if a global
/// subscriber is already set.
pub fn init(config: &LoggerConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter directive")?;

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;

            let appender = RollingFileAppender::new(
                Rotation::DAILY,
                dir,
                format!("{}.json", config.log_file_prefix),
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .with(json_layer)
                .try_init()
                .context("global subscriber already initialized")?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console_layer)
                .try_init()
                .context("global subscriber already initialized")?;

            Ok(None)
        }
    }
}
