// src/logging.rs

//! Logging for `shellpool`: a `tracing-subscriber` fmt layer on STDERR, so
//! stdout carries only command output.
//!
//! The filter comes from, in order:
//! 1. `--log-level`, applied to every target;
//! 2. `SHELLPOOL_LOG`, read as `EnvFilter` directives, e.g.
//!    `warn,shellpool::pool=debug`;
//! 3. `info`.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "SHELLPOOL_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env_value.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))?;

    if let Some(err) = rejected {
        tracing::warn!(error = %err, "ignoring invalid {LOG_ENV_VAR}; using info");
    }
    Ok(())
}

/// Resolve the filter. The second value carries the parse error when
/// `env_value` was present but unusable.
fn build_filter(
    cli_level: Option<LogLevel>,
    env_value: Option<&str>,
) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(level_filter(level).to_string()), None);
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => match EnvFilter::builder().parse(directives) {
            Ok(filter) => (filter, None),
            Err(err) => (info_filter(), Some(err.to_string())),
        },
        None => (info_filter(), None),
    }
}

fn info_filter() -> EnvFilter {
    EnvFilter::new(LevelFilter::INFO.to_string())
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
