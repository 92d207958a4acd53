//! Tracing subscriber setup

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Initialize logging
///
/// `verbosity` counts `-v` flags: 0=warn, 1=info, 2=debug, 3+=trace.
/// `RUST_LOG` overrides the level when set. Logs go to stderr unless a file
/// is given, so they never interleave with the console output.
pub fn init_logging(verbosity: u8, log_file: Option<&Path>, format: LogFormat) -> Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "promptdj={},promptdj_core={},promptdj_audio={},promptdj_engine={}",
            level, level, level, level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = match (log_file, format) {
        (None, LogFormat::Text) => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(verbosity >= 2))
            .try_init(),
        (None, LogFormat::Json) => registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init(),
        (Some(path), format) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            match format {
                LogFormat::Text => registry.with(fmt::layer().with_writer(file).with_ansi(false)).try_init(),
                LogFormat::Json => registry.with(fmt::layer().json().with_writer(file)).try_init(),
            }
        }
    };

    result.context("Failed to install tracing subscriber")
}
