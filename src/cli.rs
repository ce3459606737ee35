// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;
use crate::types::UnknownFieldPolicy;

/// Command-line arguments for `shellpool`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shellpool",
    version,
    about = "Run a list of shell commands on a fixed number of parallel workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// When omitted and no commands are given on the command line,
    /// `Shellpool.toml` in the current working directory is used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Number of workers; overrides `[pool].workers`.
    #[arg(long, short = 'w', value_name = "N")]
    pub workers: Option<usize>,

    /// Per-command timeout such as `30s` or `500ms`; overrides `[pool].timeout`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// How to treat unrecognised keys in command tables (`reject` or
    /// `ignore`); overrides `[pool].unknown_fields`.
    #[arg(long, value_name = "POLICY")]
    pub unknown_fields: Option<UnknownFieldPolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHELLPOOL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print how commands are split across workers, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Extra commands, appended after those from the config file.
    #[arg(value_name = "COMMAND", trailing_var_arg = true)]
    pub commands: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
